//! JSON endpoint for listing accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, account::core::get_account_balances, currency::get_rate_table,
};

/// The state needed to list accounts as JSON.
#[derive(Debug, Clone)]
pub struct AccountsApiState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Responds with every account and its balance, ordered by name.
pub async fn list_accounts_endpoint(State(state): State<AccountsApiState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    get_rate_table(&connection)
        .and_then(|rates| get_account_balances(&rates, &connection))
        .map(|accounts| Json(accounts).into_response())
        .unwrap_or_else(|error| error.into_json_response())
}
