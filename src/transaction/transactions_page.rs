//! Defines the route handler for the page that displays transactions as a table.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, base, link,
    },
    navigation::NavBar,
    transaction::{
        Transaction,
        core::{DEFAULT_LIST_LIMIT, query_transactions},
        query::TransactionFilters,
        view::transactions_table,
    },
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the transactions matching the filters in the query string.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Query(filters): Query<TransactionFilters>,
) -> Result<Response, Error> {
    let query = filters.to_query()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = query_transactions(&query, &connection)
        .inspect_err(|error| tracing::error!("could not query transactions: {error}"))?;
    let accounts = get_all_accounts(&connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    Ok(transactions_view(&transactions, &accounts, filters).into_response())
}

fn transactions_view(
    transactions: &[Transaction],
    accounts: &[Account],
    filters: TransactionFilters,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let limit = filters.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let show_more_url = (transactions.len() as u32 >= limit).then(|| {
        TransactionFilters {
            limit: Some(limit.saturating_mul(2)),
            ..filters
        }
        .to_url(endpoints::TRANSACTIONS_VIEW)
    });
    let accounts_by_id: HashMap<_, _> = accounts
        .iter()
        .map(|account| (account.id, account.clone()))
        .collect();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-5xl space-y-4 overflow-x-auto"
            {
                div class="flex justify-between flex-wrap items-end gap-2"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    (link(endpoints::NEW_TRANSACTION_VIEW, "Create Transaction"))
                }

                (filter_form(accounts, filters))

                (transactions_table(transactions, &accounts_by_id))

                @if let Some(url) = show_more_url {
                    div class="text-center"
                    {
                        a href=(url) class=(LINK_STYLE) { "Show more" }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

fn filter_form(accounts: &[Account], filters: TransactionFilters) -> Markup {
    html! {
        form
            id="filters"
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid grid-cols-2 md:grid-cols-5 gap-2 items-end"
        {
            div
            {
                label for="filter-account" class=(FORM_LABEL_STYLE) { "Account" }

                select name="account_id" id="filter-account" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[filters.account_id.is_none()] { "All accounts" }

                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[filters.account_id == Some(account.id)]
                        {
                            (account.name)
                        }
                    }
                }
            }

            div
            {
                label for="filter-year" class=(FORM_LABEL_STYLE) { "Year" }

                input
                    name="year"
                    id="filter-year"
                    type="number"
                    placeholder="Any"
                    value=[filters.year]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="filter-month" class=(FORM_LABEL_STYLE) { "Month" }

                input
                    name="month"
                    id="filter-month"
                    type="number"
                    min="1"
                    max="12"
                    placeholder="Any"
                    value=[filters.month]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="filter-limit" class=(FORM_LABEL_STYLE) { "Limit" }

                input
                    name="limit"
                    id="filter-limit"
                    type="number"
                    min="1"
                    value=(filters.limit.unwrap_or(DEFAULT_LIST_LIMIT))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
        }
    }
}
