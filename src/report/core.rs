//! Builds monthly reports and exports them as CSV.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::get_all_accounts,
    currency::{Currency, get_rate_table, round_to_cents},
    dashboard::aggregation::{CategoryTotal, converted_totals, totals_by_category},
    transaction::{Direction, Transaction, get_transactions_in_range, month_date_range},
};

/// A transaction in a report, with the values needed to print it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The name of the account the transaction belongs to.
    pub account: String,
    /// The amount converted into the report's base currency.
    pub amount_in_base: f64,
}

/// Income and expenses for one calendar month, converted into the base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u8,
    pub base_currency: Currency,
    pub income_total: f64,
    pub expense_total: f64,
    pub net: f64,
    pub transaction_count: usize,
    /// Income per category, sorted by category name.
    pub income_by_category: Vec<CategoryTotal>,
    /// Expenses per category, sorted by category name.
    pub expense_by_category: Vec<CategoryTotal>,
    /// Every transaction in the month, oldest first.
    pub transactions: Vec<ReportLine>,
}

/// Build the report for `month` of `year` with totals in `base_currency`.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `month` is not between 1 and 12, or an
/// SQL error.
pub fn build_monthly_report(
    year: i32,
    month: u8,
    base_currency: Currency,
    connection: &Connection,
) -> Result<MonthlyReport, Error> {
    let (start, end) = month_date_range(year, month)?;
    let rates = get_rate_table(connection)?;
    let transactions = get_transactions_in_range(start, end, connection)?;
    let account_names: HashMap<_, _> = get_all_accounts(connection)?
        .into_iter()
        .map(|account| (account.id, account.name))
        .collect();

    let totals = converted_totals(&transactions, &rates, base_currency);
    let income_by_category =
        totals_by_category(&transactions, Direction::Income, &rates, base_currency);
    let expense_by_category =
        totals_by_category(&transactions, Direction::Expense, &rates, base_currency);

    let lines = transactions
        .into_iter()
        .map(|transaction| ReportLine {
            account: account_names
                .get(&transaction.account_id)
                .cloned()
                .unwrap_or_default(),
            amount_in_base: round_to_cents(rates.convert(
                transaction.amount,
                transaction.currency,
                base_currency,
            )),
            transaction,
        })
        .collect::<Vec<_>>();

    Ok(MonthlyReport {
        year,
        month,
        base_currency,
        income_total: totals.income,
        expense_total: totals.expense,
        net: totals.net,
        transaction_count: lines.len(),
        income_by_category,
        expense_by_category,
        transactions: lines,
    })
}

/// The file name used when downloading a report as CSV.
pub fn csv_file_name(year: i32, month: u8) -> String {
    format!("monthly_report_{year}_{month:02}.csv")
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    date: Date,
    #[serde(rename = "type")]
    direction: Direction,
    category: &'a str,
    amount: f64,
    currency: Currency,
    account: &'a str,
    note: &'a str,
    amount_in_base: f64,
}

/// Write the report's transactions as CSV with a header row.
///
/// # Errors
/// Returns [Error::CsvError] if a row cannot be written.
pub fn write_report_csv(report: &MonthlyReport) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    for line in &report.transactions {
        let transaction = &line.transaction;
        writer.serialize(CsvRow {
            id: transaction.id,
            date: transaction.date,
            direction: transaction.direction,
            category: &transaction.category,
            amount: transaction.amount,
            currency: transaction.currency,
            account: &line.account,
            note: &transaction.note,
            amount_in_base: line.amount_in_base,
        })?;
    }

    if report.transactions.is_empty() {
        writer.write_record([
            "id",
            "date",
            "type",
            "category",
            "amount",
            "currency",
            "account",
            "note",
            "amount_in_base",
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}
