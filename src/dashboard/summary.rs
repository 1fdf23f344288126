//! Gathers everything shown on the dashboard from the database.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::{AccountBalance, get_account_balances},
    currency::{Currency, get_rate_table},
    dashboard::aggregation::{
        CategoryTotal, ConvertedTotals, CurrencyTotals, MonthlyNet, converted_totals, last_months,
        monthly_net, totals_by_category, totals_by_currency,
    },
    transaction::{
        Direction, Transaction, TransactionQuery, count_transactions, get_transactions_in_range,
        month_date_range, query_transactions,
    },
};

/// How many of the latest transactions the dashboard lists.
pub const RECENT_TRANSACTION_COUNT: u32 = 10;

/// How many months the net income chart covers.
const NET_INCOME_MONTHS: usize = 12;

/// An overview of the current month and the accounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub month: u8,
    /// The currency `totals`, `expenses_by_category` and `monthly_net` are in.
    pub base_currency: Currency,
    /// This month's income and expenses per currency, without conversion.
    pub totals_by_currency: Vec<CurrencyTotals>,
    /// This month's income and expenses converted into the base currency.
    pub totals: ConvertedTotals,
    /// This month's expenses per category in the base currency.
    pub expenses_by_category: Vec<CategoryTotal>,
    /// Net income for each of the last twelve months, oldest first.
    pub monthly_net: Vec<MonthlyNet>,
    /// The latest transactions, newest first.
    pub recent_transactions: Vec<Transaction>,
    /// Every account with its balance in the account currency.
    pub accounts: Vec<AccountBalance>,
    /// The number of transactions stored, across all dates.
    pub transaction_count: u32,
}

/// Build the dashboard for the month containing `today`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn build_dashboard_summary(
    today: Date,
    base_currency: Currency,
    connection: &Connection,
) -> Result<DashboardSummary, Error> {
    let rates = get_rate_table(connection)
        .inspect_err(|error| tracing::error!("could not get exchange rates: {error}"))?;

    let month = u8::from(today.month());
    let (month_start, month_end) = month_date_range(today.year(), month)?;
    let this_month = get_transactions_in_range(month_start, month_end, connection)
        .inspect_err(|error| tracing::error!("could not get this month's transactions: {error}"))?;

    let months = last_months(today, NET_INCOME_MONTHS);
    let chart_start = months.first().copied().unwrap_or(month_start);
    let last_year = get_transactions_in_range(chart_start, month_end, connection)
        .inspect_err(|error| tracing::error!("could not get last year's transactions: {error}"))?;

    let recent_transactions = query_transactions(
        &TransactionQuery {
            limit: Some(RECENT_TRANSACTION_COUNT),
            ..Default::default()
        },
        connection,
    )
    .inspect_err(|error| tracing::error!("could not get recent transactions: {error}"))?;

    let accounts = get_account_balances(&rates, connection)
        .inspect_err(|error| tracing::error!("could not get account balances: {error}"))?;

    Ok(DashboardSummary {
        year: today.year(),
        month,
        base_currency,
        totals_by_currency: totals_by_currency(&this_month),
        totals: converted_totals(&this_month, &rates, base_currency),
        expenses_by_category: totals_by_category(
            &this_month,
            Direction::Expense,
            &rates,
            base_currency,
        ),
        monthly_net: monthly_net(&months, &last_year, &rates, base_currency),
        recent_transactions,
        accounts,
        transaction_count: count_transactions(connection)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        currency::Currency,
        dashboard::aggregation::{ConvertedTotals, CurrencyTotals},
        test_utils::get_test_connection,
        transaction::{Direction, TransactionBuilder, create_transaction},
    };

    use super::{RECENT_TRANSACTION_COUNT, build_dashboard_summary};

    fn add(
        conn: &Connection,
        amount: f64,
        currency: Currency,
        direction: Direction,
        date: Date,
    ) {
        create_transaction(
            TransactionBuilder::new(amount, currency, "Food", direction, date).unwrap(),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn empty_database() {
        let conn = get_test_connection();

        let summary = build_dashboard_summary(date!(2025 - 06 - 15), Currency::CNY, &conn).unwrap();

        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.totals, ConvertedTotals::default());
        assert_eq!(summary.monthly_net.len(), 12);
        assert_eq!(summary.accounts.len(), 1);
        assert!(summary.recent_transactions.is_empty());
    }

    #[test]
    fn only_counts_current_month() {
        let conn = get_test_connection();
        add(&conn, 10.0, Currency::USD, Direction::Income, date!(2025 - 06 - 01));
        add(&conn, 72.0, Currency::CNY, Direction::Expense, date!(2025 - 06 - 30));
        add(&conn, 500.0, Currency::USD, Direction::Income, date!(2025 - 05 - 31));

        let summary = build_dashboard_summary(date!(2025 - 06 - 15), Currency::CNY, &conn).unwrap();

        assert_eq!((summary.year, summary.month), (2025, 6));
        assert_eq!(
            summary.totals_by_currency,
            vec![
                CurrencyTotals {
                    currency: Currency::CNY,
                    income: 0.0,
                    expense: 72.0,
                },
                CurrencyTotals {
                    currency: Currency::USD,
                    income: 10.0,
                    expense: 0.0,
                },
            ]
        );
        assert_eq!(
            summary.totals,
            ConvertedTotals {
                income: 72.0,
                expense: 72.0,
                net: 0.0,
            }
        );
        assert_eq!(summary.transaction_count, 3);
        let may = &summary.monthly_net[10];
        assert_eq!(may.month, date!(2025 - 05 - 01));
        assert_eq!(may.net, 3600.0);
    }

    #[test]
    fn lists_ten_most_recent() {
        let conn = get_test_connection();
        for day in 1..=15 {
            add(
                &conn,
                1.0,
                Currency::CNY,
                Direction::Expense,
                Date::from_ordinal_date(2025, day).unwrap(),
            );
        }

        let summary = build_dashboard_summary(date!(2025 - 01 - 20), Currency::CNY, &conn).unwrap();

        assert_eq!(
            summary.recent_transactions.len(),
            RECENT_TRANSACTION_COUNT as usize
        );
        assert_eq!(
            summary.recent_transactions[0].date,
            date!(2025 - 01 - 15)
        );
    }
}
