//! Defines the endpoint for deleting a stored exchange rate.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, alert::Alert, currency::rates::delete_exchange_rate,
    database_id::ExchangeRateId,
};

/// The state needed to delete an exchange rate.
#[derive(Debug, Clone)]
pub struct DeleteExchangeRateState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExchangeRateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an exchange rate, responds with an alert.
pub async fn delete_exchange_rate_endpoint(
    State(state): State<DeleteExchangeRateState>,
    Path(rate_id): Path<ExchangeRateId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_exchange_rate(rate_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::Success {
            message: "Exchange rate deleted".to_owned(),
            details: String::new(),
        }
        .into_html()
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete exchange rate {rate_id}: {error}");
            error.into_alert_response()
        }
    }
}
