//! Displays accounts with their balances and a form for adding an account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::core::{AccountBalance, DEFAULT_ACCOUNT_CURRENCY, get_account_balances},
    currency::get_rate_table,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        currency_select, edit_delete_action_links, format_money, loading_spinner,
    },
    navigation::NavBar,
};

/// The state needed for the [get_accounts_page](crate::account::get_accounts_page) route handler.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn accounts_view(accounts: &[AccountBalance]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |row: &AccountBalance| {
        let account = &row.account;
        let action_links = edit_delete_action_links(
            None,
            &format_endpoint(endpoints::ACCOUNT, account.id),
            &format!(
                "Are you sure you want to delete the account '{}'? This cannot be undone.",
                account.name
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.name)
                }

                td class=(TABLE_CELL_STYLE) { (account.currency) }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_money(row.balance, account.currency))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4" { (action_links) }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl grid grid-cols-1 lg:grid-cols-3 gap-6"
            {
                section class="lg:col-span-2 space-y-4 overflow-x-auto"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Currency" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Add one with the form."
                                    }
                                }
                            }
                        }
                    }
                }

                section class=(CARD_STYLE)
                {
                    (create_account_form())
                }
            }
        }
    );

    base("Accounts", &[], &content)
}

fn create_account_form() -> Markup {
    html!(
        form
            hx-post=(endpoints::ACCOUNTS_API)
            hx-target-error="#alert-container"
            class="space-y-4"
        {
            h2 class="text-lg font-semibold" { "Add Account" }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    name="name"
                    id="name"
                    type="text"
                    placeholder="e.g. Savings"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                (currency_select("currency", DEFAULT_ACCOUNT_CURRENCY))
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Add Account"
            }
        }
    )
}

/// Renders the accounts page showing all accounts and their balances.
pub async fn get_accounts_page(State(state): State<AccountsPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rates = get_rate_table(&connection)?;
    let accounts = get_account_balances(&rates, &connection)
        .inspect_err(|error| tracing::error!("could not get account balances: {error}"))?;

    Ok(accounts_view(&accounts).into_response())
}
