//! Dashboard HTTP handlers and view rendering.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::AccountBalance,
    charts::{
        PageChart, category_pie_chart, charts_head_elements, charts_view, format_month_labels,
        net_income_chart,
    },
    currency::Currency,
    dashboard::{
        aggregation::CurrencyTotals,
        summary::{DashboardSummary, build_dashboard_summary},
    },
    endpoints::{self, format_month_endpoint},
    html::{CARD_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_money, link},
    navigation::NavBar,
    timezone::current_local_date,
    transaction::transactions_table,
};

/// The state needed for displaying the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The currency that totals are converted into.
    pub base_currency: Currency,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            base_currency: state.base_currency,
        }
    }
}

fn load_summary(state: &DashboardState) -> Result<DashboardSummary, Error> {
    let today = current_local_date(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    build_dashboard_summary(today, state.base_currency, &connection)
}

/// Display a page with an overview of the current month and the accounts.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let summary = load_summary(&state)?;

    if summary.transaction_count == 0 {
        return Ok(dashboard_no_data_view().into_response());
    }

    Ok(dashboard_view(&summary).into_response())
}

/// Responds with the dashboard summary as JSON.
pub async fn get_dashboard_summary_endpoint(State(state): State<DashboardState>) -> Response {
    load_summary(&state)
        .map(|summary| Json(summary).into_response())
        .unwrap_or_else(|error| error.into_json_response())
}

fn dashboard_charts(summary: &DashboardSummary) -> Vec<PageChart> {
    let months: Vec<_> = summary.monthly_net.iter().map(|month| month.month).collect();
    let values = summary.monthly_net.iter().map(|month| month.net).collect();
    let mut charts = vec![PageChart::new(
        "net-income-chart",
        net_income_chart(format_month_labels(&months), values, summary.base_currency),
    )];

    if !summary.expenses_by_category.is_empty() {
        let totals: Vec<_> = summary
            .expenses_by_category
            .iter()
            .map(|total| (total.category.clone(), total.total))
            .collect();

        charts.push(PageChart::new(
            "expenses-chart",
            category_pie_chart(
                "Expenses",
                &format!("This month by category, in {}", summary.base_currency),
                &totals,
                summary.base_currency,
            ),
        ));
    }

    charts
}

/// Renders the dashboard page when no transaction data exists.
fn dashboard_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "adding a transaction");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your monthly summary and charts will show up here. Get started by "
                (new_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn total_card(title: &str, amount: f64, currency: Currency, id: &str) -> Markup {
    html!(
        div class=(CARD_STYLE) id=(id)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (title) }
            p class="text-2xl font-semibold tabular-nums" { (format_money(amount, currency)) }
        }
    )
}

fn currency_totals_table(totals: &[CurrencyTotals]) -> Markup {
    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Currency" }
                    th scope="col" class="px-6 py-3 text-right" { "Income" }
                    th scope="col" class="px-6 py-3 text-right" { "Expenses" }
                }
            }

            tbody
            {
                @for total in totals {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { (total.currency) }
                        td class="px-6 py-4 text-right tabular-nums"
                        {
                            (format_money(total.income, total.currency))
                        }
                        td class="px-6 py-4 text-right tabular-nums"
                        {
                            (format_money(total.expense, total.currency))
                        }
                    }
                }

                @if totals.is_empty() {
                    tr
                    {
                        td colspan="3" class="px-6 py-4 text-center" { "No transactions this month." }
                    }
                }
            }
        }
    )
}

fn account_balances_list(accounts: &[AccountBalance]) -> Markup {
    html!(
        ul class="divide-y divide-gray-200 dark:divide-gray-700"
        {
            @for row in accounts {
                li class="flex justify-between py-2"
                {
                    span { (row.account.name) }
                    span class="tabular-nums" { (format_money(row.balance, row.account.currency)) }
                }
            }
        }
    )
}

/// Renders the main dashboard page with the month's totals, charts and tables.
fn dashboard_view(summary: &DashboardSummary) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let charts = dashboard_charts(summary);
    let accounts_by_id: HashMap<_, _> = summary
        .accounts
        .iter()
        .map(|row| (row.account.id, row.account.clone()))
        .collect();
    let report_url = format_month_endpoint(endpoints::MONTHLY_REPORT_VIEW, summary.year, summary.month);
    let base_currency = summary.base_currency;

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center gap-6 px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            div class="w-full flex justify-between flex-wrap items-end gap-2"
            {
                h1 class="text-xl font-bold"
                {
                    "This month (" (summary.year) "-" (format!("{:02}", summary.month)) ")"
                }

                (link(&report_url, "Monthly report"))
            }

            section class="w-full grid grid-cols-1 md:grid-cols-3 gap-4"
            {
                (total_card("Income", summary.totals.income, base_currency, "income-total"))
                (total_card("Expenses", summary.totals.expense, base_currency, "expense-total"))
                (total_card("Net", summary.totals.net, base_currency, "net-total"))
            }

            (charts_view(&charts))

            section class="w-full grid grid-cols-1 lg:grid-cols-3 gap-4"
            {
                div class={ (CARD_STYLE) " overflow-x-auto" }
                {
                    h2 class="text-lg font-semibold mb-2" { "By currency" }
                    (currency_totals_table(&summary.totals_by_currency))
                }

                div class=(CARD_STYLE)
                {
                    h2 class="text-lg font-semibold mb-2" { "Accounts" }
                    (account_balances_list(&summary.accounts))
                }
            }

            section class="w-full overflow-x-auto space-y-2"
            {
                h2 class="text-lg font-semibold" { "Recent transactions" }
                (transactions_table(&summary.recent_transactions, &accounts_by_id))
            }
        }
    );

    base("Dashboard", &charts_head_elements(&charts), &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        currency::Currency,
        endpoints,
        test_utils::{
            assert_status_ok, assert_valid_html, get_test_connection, parse_html_document,
            parse_json,
        },
        transaction::{Direction, TransactionBuilder, create_transaction},
    };

    use super::{DashboardState, get_dashboard_page, get_dashboard_summary_endpoint};

    fn get_state(conn: Connection) -> DashboardState {
        DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
            base_currency: Currency::CNY,
        }
    }

    fn add_today(conn: &Connection, amount: f64, direction: Direction) {
        create_transaction(
            TransactionBuilder::new(
                amount,
                Currency::CNY,
                "Food",
                direction,
                OffsetDateTime::now_utc().date(),
            )
            .unwrap(),
            conn,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn shows_empty_state_without_transactions() {
        let response = get_dashboard_page(State(get_state(get_test_connection())))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let link = html
            .select(
                &Selector::parse(&format!("a[href='{}']", endpoints::NEW_TRANSACTION_VIEW))
                    .unwrap(),
            )
            .next();
        assert!(link.is_some(), "want a link to the new transaction page");
    }

    #[tokio::test]
    async fn shows_totals_and_charts() {
        let conn = get_test_connection();
        add_today(&conn, 1000.0, Direction::Income);
        add_today(&conn, 250.5, Direction::Expense);

        let response = get_dashboard_page(State(get_state(conn))).await.unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text_of = |selector: &str| {
            html.select(&Selector::parse(selector).unwrap())
                .next()
                .map(|element| element.text().collect::<String>())
                .unwrap_or_default()
        };
        assert!(text_of("#income-total").contains("¥1,000.00"));
        assert!(text_of("#expense-total").contains("¥250.50"));
        assert!(text_of("#net-total").contains("¥749.50"));

        for chart_id in ["#net-income-chart", "#expenses-chart"] {
            assert!(
                html.select(&Selector::parse(chart_id).unwrap()).next().is_some(),
                "want chart container {chart_id}"
            );
        }

        let rows = html
            .select(&Selector::parse("tr[data-transaction-row]").unwrap())
            .count();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn summary_json() {
        let conn = get_test_connection();
        add_today(&conn, 30.0, Direction::Expense);

        let response = get_dashboard_summary_endpoint(State(get_state(conn))).await;

        assert_status_ok(&response);
        let body = parse_json(response).await;
        assert_eq!(body["base_currency"], "CNY");
        assert_eq!(body["totals"]["expense"], 30.0);
        assert_eq!(body["totals"]["net"], -30.0);
        assert_eq!(body["expenses_by_category"][0]["category"], "Food");
        assert_eq!(body["accounts"][0]["balance"], -30.0);
        assert_eq!(body["transaction_count"], 1);
    }
}
