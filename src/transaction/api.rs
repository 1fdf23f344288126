//! JSON endpoint for listing transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    transaction::{core::query_transactions, query::TransactionFilters},
};

/// The state needed for the transactions API.
#[derive(Debug, Clone)]
pub struct TransactionsApiState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Responds with the transactions matching the query string as a JSON array, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionsApiState>,
    Query(filters): Query<TransactionFilters>,
) -> Response {
    let query = match filters.to_query() {
        Ok(query) => query,
        Err(error) => return error.into_json_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    query_transactions(&query, &connection)
        .map(|transactions| Json(transactions).into_response())
        .unwrap_or_else(|error| error.into_json_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Query;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        currency::Currency,
        test_utils::{assert_content_type, assert_status_ok, get_test_connection, parse_json},
        transaction::{
            core::{Direction, TransactionBuilder, create_transaction},
            query::TransactionFilters,
        },
    };

    use super::{TransactionsApiState, list_transactions_endpoint};

    #[tokio::test]
    async fn lists_transactions_as_json() {
        let conn = get_test_connection();
        create_transaction(
            TransactionBuilder::new(
                8.5,
                Currency::EUR,
                "Transport",
                Direction::Expense,
                date!(2025 - 09 - 09),
            )
            .unwrap()
            .note("Train"),
            &conn,
        )
        .unwrap();
        let state = TransactionsApiState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = list_transactions_endpoint(State(state), Query(Default::default())).await;

        assert_status_ok(&response);
        assert_content_type(&response, "application/json");
        let body = parse_json(response).await;
        assert_eq!(
            body,
            json!([{
                "id": 1,
                "amount": 8.5,
                "currency": "EUR",
                "category": "Transport",
                "type": "expense",
                "date": "2025-09-09",
                "account_id": 1,
                "note": "Train",
            }])
        );
    }

    #[tokio::test]
    async fn invalid_month_is_bad_request() {
        let state = TransactionsApiState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };
        let filters = TransactionFilters {
            year: Some(2025),
            month: Some(0),
            ..Default::default()
        };

        let response = list_transactions_endpoint(State(state), Query(filters)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
