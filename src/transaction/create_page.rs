//! Defines the route handler for the page for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    currency::Currency,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, link, loading_spinner},
    navigation::NavBar,
    timezone::current_local_date,
    transaction::{
        core::Direction,
        form::{TransactionFormDefaults, transaction_form_fields},
    },
};

fn create_transaction_view(today: Date, base_currency: Currency, accounts: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let fields = transaction_form_fields(
        &TransactionFormDefaults {
            direction: Direction::Expense,
            amount: None,
            currency: base_currency,
            category: None,
            date: today,
            account_id: None,
            note: None,
        },
        accounts,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target-error="#alert-container"
                class="w-full max-w-md space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Transaction" }

                @if accounts.is_empty() {
                    p class="text-sm text-red-600"
                    {
                        "There are no accounts yet. "
                        (link(endpoints::ACCOUNTS_VIEW, "Create an account"))
                        " first."
                    }
                }

                (fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                    " Create Transaction"
                }
            }
        }
    };

    base("Create Transaction", &[], &content)
}

/// The state needed for create new transaction page.
#[derive(Debug, Clone)]
pub struct CreateTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The currency selected by default.
    pub base_currency: Currency,
    /// The database connection for accessing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            base_currency: state.base_currency,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_create_transaction_page(
    State(state): State<CreateTransactionPageState>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;

    let accounts = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_accounts(&connection)
            .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?
    };

    Ok(create_transaction_view(today, state.base_currency, &accounts).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use time::OffsetDateTime;

    use crate::{
        currency::Currency,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_select, assert_form_submit_button, assert_hx_endpoint,
            assert_status_ok, assert_valid_html, get_test_connection, must_get_form,
            parse_html_document,
        },
    };

    use super::{CreateTransactionPageState, get_create_transaction_page};

    #[tokio::test]
    async fn render_page() {
        let state = CreateTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            base_currency: Currency::GBP,
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = get_create_transaction_page(State(state)).await.unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "number", None);
        assert_form_input(&form, "category", "text", None);
        assert_form_input(&form, "type", "radio", Some("expense"));
        assert_form_input(&form, "type", "radio", Some("income"));
        assert_form_input(
            &form,
            "date",
            "date",
            Some(&OffsetDateTime::now_utc().date().to_string()),
        );
        assert_form_input(&form, "note", "text", None);
        assert_form_select(&form, "currency", "GBP");
        assert_form_select(&form, "account_id", "1");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let state = CreateTransactionPageState {
            local_timezone: "Not/A_Timezone".to_owned(),
            base_currency: Currency::GBP,
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let result = get_create_transaction_page(State(state)).await;

        assert!(result.is_err());
    }
}
