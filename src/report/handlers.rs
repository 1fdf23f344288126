//! Route handlers for the monthly report page and its JSON, CSV and PDF exports.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    charts::{PageChart, category_pie_chart, charts_head_elements, charts_view},
    currency::Currency,
    dashboard::aggregation::CategoryTotal,
    endpoints::{self, format_month_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_money,
    },
    navigation::NavBar,
    report::{
        core::{MonthlyReport, ReportLine, build_monthly_report, csv_file_name, write_report_csv},
        pdf::{pdf_file_name, write_report_pdf},
    },
    timezone::current_local_date,
    transaction::month_date_range,
};

/// The state needed for the report routes.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The currency that report totals are converted into.
    pub base_currency: Currency,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            base_currency: state.base_currency,
        }
    }
}

fn load_report(state: &ReportState, year: i32, month: u8) -> Result<MonthlyReport, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    build_monthly_report(year, month, state.base_currency, &connection)
        .inspect_err(|error| tracing::error!("could not build report for {year}-{month:02}: {error}"))
}

/// Redirects to the report for the current month.
pub async fn get_reports_page(State(state): State<ReportState>) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;
    let url = format_month_endpoint(
        endpoints::MONTHLY_REPORT_VIEW,
        today.year(),
        u8::from(today.month()),
    );

    Ok(Redirect::to(&url).into_response())
}

/// Renders the printable report for a month.
pub async fn get_monthly_report_page(
    State(state): State<ReportState>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Response, Error> {
    let report = load_report(&state, year, month)?;
    let (start, end) = month_date_range(year, month)?;

    Ok(report_view(&report, start, end).into_response())
}

/// Responds with the report for a month as JSON.
pub async fn get_monthly_report_endpoint(
    State(state): State<ReportState>,
    Path((year, month)): Path<(i32, u8)>,
) -> Response {
    load_report(&state, year, month)
        .map(|report| Json(report).into_response())
        .unwrap_or_else(|error| error.into_json_response())
}

/// Responds with the transactions in a month as a CSV file download.
pub async fn get_monthly_report_csv(
    State(state): State<ReportState>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Response, Error> {
    let report = load_report(&state, year, month)?;
    let csv = write_report_csv(&report)
        .inspect_err(|error| tracing::error!("could not write report CSV: {error}"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", csv_file_name(year, month)),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Responds with the report for a month as a PDF file download.
pub async fn get_monthly_report_pdf(
    State(state): State<ReportState>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Response, Error> {
    let report = load_report(&state, year, month)?;
    let pdf = write_report_pdf(&report)
        .inspect_err(|error| tracing::error!("could not write report PDF: {error}"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", pdf_file_name(year, month)),
            ),
        ],
        pdf,
    )
        .into_response())
}

fn month_title(start: Date) -> String {
    format!("{} {}", start.month(), start.year())
}

fn month_link(date: Date, text: &str) -> Markup {
    let url = format_month_endpoint(endpoints::MONTHLY_REPORT_VIEW, date.year(), u8::from(date.month()));

    html!( a href=(url) class=(LINK_STYLE) { (text) } )
}

fn category_table(title: &str, totals: &[CategoryTotal], currency: Currency) -> Markup {
    html!(
        div class={ (CARD_STYLE) " overflow-x-auto break-inside-avoid" }
        {
            h2 class="text-lg font-semibold mb-2" { (title) }

            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                tbody
                {
                    @for total in totals {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class="px-4 py-2" { (total.category) }
                            td class="px-4 py-2 text-right tabular-nums"
                            {
                                (format_money(total.total, currency))
                            }
                        }
                    }

                    @if totals.is_empty() {
                        tr { td class="px-4 py-2" { "None" } }
                    }
                }
            }
        }
    )
}

fn report_lines_table(lines: &[ReportLine], base_currency: Currency) -> Markup {
    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class="px-6 py-3 text-right" { "Amount" }
                    th scope="col" class="px-6 py-3 text-right" { "In " (base_currency) }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                }
            }

            tbody
            {
                @for line in lines {
                    @let transaction = &line.transaction;
                    tr class=(TABLE_ROW_STYLE) data-report-row="true"
                    {
                        td class=(TABLE_CELL_STYLE) { (transaction.date) }
                        td class=(TABLE_CELL_STYLE) { (transaction.direction) }
                        td class=(TABLE_CELL_STYLE) { (transaction.category) }
                        td class="px-6 py-4 text-right tabular-nums"
                        {
                            (format_money(transaction.amount, transaction.currency))
                        }
                        td class="px-6 py-4 text-right tabular-nums"
                        {
                            (format_money(line.amount_in_base, base_currency))
                        }
                        td class=(TABLE_CELL_STYLE) { (line.account) }
                        td class=(TABLE_CELL_STYLE) { (transaction.note) }
                    }
                }

                @if lines.is_empty() {
                    tr
                    {
                        td colspan="7" class="px-6 py-4 text-center" { "No transactions this month." }
                    }
                }
            }
        }
    )
}

fn report_view(report: &MonthlyReport, start: Date, end: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let currency = report.base_currency;
    let title = month_title(start);
    let csv_url = format_month_endpoint(endpoints::MONTHLY_REPORT_CSV, report.year, report.month);
    let json_url = format_month_endpoint(endpoints::MONTHLY_REPORT_API, report.year, report.month);
    let pdf_url = format_month_endpoint(endpoints::MONTHLY_REPORT_PDF, report.year, report.month);

    let mut charts = Vec::new();
    if !report.expense_by_category.is_empty() {
        let totals: Vec<_> = report
            .expense_by_category
            .iter()
            .map(|total| (total.category.clone(), total.total))
            .collect();
        charts.push(PageChart::new(
            "report-expenses-chart",
            category_pie_chart(
                "Expenses",
                &format!("By category, in {currency}"),
                &totals,
                currency,
            ),
        ));
    }

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-6"
            {
                div class="flex justify-between flex-wrap items-end gap-2"
                {
                    h1 class="text-2xl font-bold" { "Monthly Report: " (title) }

                    div class="no-print flex gap-4 items-center"
                    {
                        @if let Some(previous) = start.previous_day() {
                            (month_link(previous, "Previous month"))
                        }
                        @if let Some(next) = end.next_day() {
                            (month_link(next, "Next month"))
                        }
                        a href=(csv_url) class=(LINK_STYLE) download { "CSV" }
                        a href=(json_url) class=(LINK_STYLE) { "JSON" }
                        a href=(pdf_url) class=(LINK_STYLE) download { "PDF" }
                        button
                            type="button"
                            class={ (BUTTON_PRIMARY_STYLE) " no-print" }
                            onclick="window.print()"
                        {
                            "Print"
                        }
                    }
                }

                section class="grid grid-cols-1 md:grid-cols-4 gap-4"
                {
                    div class=(CARD_STYLE) id="report-income"
                    {
                        p class="text-sm text-gray-500" { "Income" }
                        p class="text-xl font-semibold" { (format_money(report.income_total, currency)) }
                    }
                    div class=(CARD_STYLE) id="report-expense"
                    {
                        p class="text-sm text-gray-500" { "Expenses" }
                        p class="text-xl font-semibold" { (format_money(report.expense_total, currency)) }
                    }
                    div class=(CARD_STYLE) id="report-net"
                    {
                        p class="text-sm text-gray-500" { "Net" }
                        p class="text-xl font-semibold" { (format_money(report.net, currency)) }
                    }
                    div class=(CARD_STYLE) id="report-count"
                    {
                        p class="text-sm text-gray-500" { "Transactions" }
                        p class="text-xl font-semibold" { (report.transaction_count) }
                    }
                }

                (charts_view(&charts))

                section class="grid grid-cols-1 md:grid-cols-2 gap-4"
                {
                    (category_table("Income by category", &report.income_by_category, currency))
                    (category_table("Expenses by category", &report.expense_by_category, currency))
                }

                section class="overflow-x-auto space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Transactions" }
                    (report_lines_table(&report.transactions, currency))
                }
            }
        }
    );

    base(
        &format!("Report {title}"),
        &charts_head_elements(&charts),
        &content,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        currency::Currency,
        endpoints::{self, format_month_endpoint},
        test_utils::{
            assert_content_type, assert_status_ok, assert_valid_html, get_header,
            get_test_connection, parse_html_document, parse_json,
        },
        transaction::{Direction, TransactionBuilder, create_transaction},
    };

    use super::{
        ReportState, get_monthly_report_csv, get_monthly_report_endpoint, get_monthly_report_page,
        get_monthly_report_pdf, get_reports_page,
    };

    fn get_state(conn: Connection) -> ReportState {
        ReportState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
            base_currency: Currency::USD,
        }
    }

    fn sample_connection() -> Connection {
        let conn = get_test_connection();
        create_transaction(
            TransactionBuilder::new(
                20.0,
                Currency::USD,
                "Groceries",
                Direction::Expense,
                date!(2025 - 03 - 05),
            )
            .unwrap(),
            &conn,
        )
        .unwrap();
        conn
    }

    #[tokio::test]
    async fn redirects_to_current_month() {
        let today = OffsetDateTime::now_utc().date();

        let response = get_reports_page(State(get_state(get_test_connection())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            get_header(&response, "location"),
            format_month_endpoint(
                endpoints::MONTHLY_REPORT_VIEW,
                today.year(),
                u8::from(today.month())
            )
        );
    }

    #[tokio::test]
    async fn renders_printable_report() {
        let response =
            get_monthly_report_page(State(get_state(sample_connection())), Path((2025, 3)))
                .await
                .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let expense = html
            .select(&Selector::parse("#report-expense").unwrap())
            .next()
            .map(|card| card.text().collect::<String>())
            .unwrap_or_default();
        assert!(expense.contains("$20.00"), "got {expense:?}");
        assert!(
            html.select(&Selector::parse("button[onclick='window.print()']").unwrap())
                .next()
                .is_some()
        );
        assert!(
            html.select(&Selector::parse("#report-expenses-chart").unwrap())
                .next()
                .is_some()
        );
        assert_eq!(
            html.select(&Selector::parse("tr[data-report-row]").unwrap())
                .count(),
            1
        );
        let next_month = html
            .select(&Selector::parse("a[href='/reports/2025/4']").unwrap())
            .next();
        assert!(next_month.is_some(), "want a link to the next month");
    }

    #[tokio::test]
    async fn invalid_month_page_is_an_error() {
        let response =
            get_monthly_report_page(State(get_state(get_test_connection())), Path((2025, 13)))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn report_json() {
        let response =
            get_monthly_report_endpoint(State(get_state(sample_connection())), Path((2025, 3)))
                .await;

        assert_status_ok(&response);
        let body = parse_json(response).await;
        assert_eq!(body["expense_total"], 20.0);
        assert_eq!(body["transaction_count"], 1);
        assert_eq!(body["expense_by_category"][0]["category"], "Groceries");
        assert_eq!(body["transactions"][0]["account"], "Main Account");
        assert_eq!(body["transactions"][0]["type"], "expense");
    }

    #[tokio::test]
    async fn invalid_month_json_is_bad_request() {
        let response =
            get_monthly_report_endpoint(State(get_state(get_test_connection())), Path((2025, 0)))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn csv_download() {
        let response =
            get_monthly_report_csv(State(get_state(sample_connection())), Path((2025, 3)))
                .await
                .unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "text/csv; charset=utf-8");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"monthly_report_2025_03.csv\""
        );
    }

    #[tokio::test]
    async fn pdf_download() {
        let response =
            get_monthly_report_pdf(State(get_state(sample_connection())), Path((2025, 3)))
                .await
                .unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "application/pdf");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"monthly_report_2025_03.pdf\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let document = lopdf::Document::load_mem(&body).unwrap();
        // Summary, expenses pie and one page of transactions.
        assert_eq!(document.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn invalid_month_pdf_is_an_error() {
        let response =
            get_monthly_report_pdf(State(get_state(get_test_connection())), Path((2025, 13)))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn links_to_pdf_download() {
        let response =
            get_monthly_report_page(State(get_state(sample_connection())), Path((2025, 3)))
                .await
                .unwrap();

        let html = parse_html_document(response).await;
        let pdf_link = html
            .select(&Selector::parse("a[href='/api/reports/2025/3/pdf']").unwrap())
            .next();
        assert!(pdf_link.is_some(), "want a link to the PDF download");
    }

    #[tokio::test]
    async fn category_text_stays_inside_chart_script() {
        let conn = get_test_connection();
        create_transaction(
            TransactionBuilder::new(
                5.0,
                Currency::USD,
                "</script><script>alert('pwned')</script>",
                Direction::Expense,
                date!(2025 - 03 - 05),
            )
            .unwrap(),
            &conn,
        )
        .unwrap();

        let response = get_monthly_report_page(State(get_state(conn)), Path((2025, 3)))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let injected = html
            .select(&Selector::parse("script").unwrap())
            .any(|script| script.text().collect::<String>().trim() == "alert('pwned')");
        assert!(!injected, "category text closed the chart script");
        let category_cell = html
            .select(&Selector::parse("tr[data-report-row] td").unwrap())
            .any(|cell| cell.text().collect::<String>().contains("<script>alert('pwned')"));
        assert!(category_cell, "want the category shown as text in the table");
    }
}
