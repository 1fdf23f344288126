//! Defines the route handler for the page for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, loading_spinner},
    navigation::NavBar,
    transaction::{
        Transaction,
        core::get_transaction,
        form::{TransactionFormDefaults, transaction_form_fields},
    },
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The database connection for accessing transactions and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit_transaction_view(transaction: &Transaction, accounts: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();
    let fields = transaction_form_fields(
        &TransactionFormDefaults {
            direction: transaction.direction,
            amount: Some(transaction.amount),
            currency: transaction.currency,
            category: Some(&transaction.category),
            date: transaction.date,
            account_id: Some(transaction.account_id),
            note: Some(&transaction.note),
        },
        accounts,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                hx-target-error="#alert-container"
                class="w-full max-w-md space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                    " Save Transaction"
                }
            }
        }
    };

    base("Edit Transaction", &[], &content)
}

/// Renders the page for editing a transaction.
///
/// Responds with the 404 page if the transaction does not exist.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, &connection)?;
    let accounts = get_all_accounts(&connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    Ok(edit_transaction_view(&transaction, &accounts).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use time::macros::date;

    use crate::{
        currency::Currency,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input, assert_form_select, assert_hx_endpoint, assert_status_ok,
            assert_valid_html, get_test_connection, must_get_form, parse_html_document,
        },
        transaction::core::{Direction, TransactionBuilder, create_transaction},
    };

    use super::{EditTransactionPageState, get_edit_transaction_page};

    #[tokio::test]
    async fn prefills_form() {
        let conn = get_test_connection();
        let transaction = create_transaction(
            TransactionBuilder::new(
                9.99,
                Currency::AUD,
                "Entertainment",
                Direction::Expense,
                date!(2025 - 04 - 01),
            )
            .unwrap()
            .note("Cinema"),
            &conn,
        )
        .unwrap();
        let state = EditTransactionPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_edit_transaction_page(State(state), Path(transaction.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_form_input(&form, "amount", "number", Some("9.99"));
        assert_form_input(&form, "category", "text", Some("Entertainment"));
        assert_form_input(&form, "date", "date", Some("2025-04-01"));
        assert_form_input(&form, "note", "text", Some("Cinema"));
        assert_form_select(&form, "currency", "AUD");
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let state = EditTransactionPageState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = get_edit_transaction_page(State(state), Path(1))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
