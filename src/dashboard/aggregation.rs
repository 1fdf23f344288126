//! Transaction data aggregation for the dashboard and monthly reports.
//!
//! Totals that mix currencies are converted into a single currency with a
//! [RateTable] before they are summed.

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::{
    currency::{Currency, RateTable, round_to_cents},
    transaction::{Direction, Transaction},
};

/// The raw income and expense totals for one currency, without conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyTotals {
    pub currency: Currency,
    pub income: f64,
    pub expense: f64,
}

/// The total for one category, converted into a single currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Income, expenses and their difference in a single currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConvertedTotals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// Net income for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyNet {
    /// The first day of the month.
    pub month: Date,
    pub net: f64,
}

/// Sums income and expenses per currency, ordered by currency.
pub fn totals_by_currency(transactions: &[Transaction]) -> Vec<CurrencyTotals> {
    let mut totals: BTreeMap<Currency, (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let entry = totals.entry(transaction.currency).or_default();
        match transaction.direction {
            Direction::Income => entry.0 += transaction.amount,
            Direction::Expense => entry.1 += transaction.amount,
        }
    }

    totals
        .into_iter()
        .map(|(currency, (income, expense))| CurrencyTotals {
            currency,
            income: round_to_cents(income),
            expense: round_to_cents(expense),
        })
        .collect()
}

/// Sums income and expenses after converting every amount into `currency`.
pub fn converted_totals(
    transactions: &[Transaction],
    rates: &RateTable,
    currency: Currency,
) -> ConvertedTotals {
    let mut income = 0.0;
    let mut expense = 0.0;

    for transaction in transactions {
        let amount = rates.convert(transaction.amount, transaction.currency, currency);
        match transaction.direction {
            Direction::Income => income += amount,
            Direction::Expense => expense += amount,
        }
    }

    ConvertedTotals {
        income: round_to_cents(income),
        expense: round_to_cents(expense),
        net: round_to_cents(income - expense),
    }
}

/// Sums the transactions going in `direction` per category, converted into
/// `currency` and sorted by category name.
pub fn totals_by_category(
    transactions: &[Transaction],
    direction: Direction,
    rates: &RateTable,
    currency: Currency,
) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.direction == direction)
    {
        *totals.entry(transaction.category.as_str()).or_default() +=
            rates.convert(transaction.amount, transaction.currency, currency);
    }

    totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_owned(),
            total: round_to_cents(total),
        })
        .collect()
}

/// The first day of each of the `count` months ending with the month of `today`, oldest first.
pub fn last_months(today: Date, count: usize) -> Vec<Date> {
    let mut months = Vec::with_capacity(count);
    let mut month = today.replace_day(1).ok();

    while let Some(current) = month {
        if months.len() == count {
            break;
        }
        months.push(current);
        month = current
            .previous_day()
            .and_then(|last_day| last_day.replace_day(1).ok());
    }

    months.reverse();
    months
}

/// Net income in `currency` for each of `months`.
///
/// Months without transactions have a net of zero. Transactions outside of
/// `months` are ignored.
pub fn monthly_net(
    months: &[Date],
    transactions: &[Transaction],
    rates: &RateTable,
    currency: Currency,
) -> Vec<MonthlyNet> {
    let mut totals: BTreeMap<Date, f64> = months.iter().map(|month| (*month, 0.0)).collect();

    for transaction in transactions {
        let Ok(month) = transaction.date.replace_day(1) else {
            continue;
        };

        if let Some(total) = totals.get_mut(&month) {
            *total += transaction
                .direction
                .signed(rates.convert(transaction.amount, transaction.currency, currency));
        }
    }

    totals
        .into_iter()
        .map(|(month, net)| MonthlyNet {
            month,
            net: round_to_cents(net),
        })
        .collect()
}
