//! Defines the endpoint for deleting an account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, account::core::delete_account, alert::Alert, database_id::AccountId,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing accounts.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account, responds with an alert.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(account_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::Success {
            message: "Account deleted".to_owned(),
            details: String::new(),
        }
        .into_html()
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}
