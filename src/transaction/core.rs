//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql, named_params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    account::{get_account, get_default_account_id},
    currency::Currency,
    database_id::{AccountId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Suggested categories for expenses.
pub const EXPENSE_CATEGORIES: [&str; 10] = [
    "Food",
    "Transport",
    "Rent",
    "Utilities",
    "Entertainment",
    "Groceries",
    "Health",
    "Clothing",
    "Education",
    "Other",
];

/// Suggested categories for income.
pub const INCOME_CATEGORIES: [&str; 8] = [
    "Salary",
    "Bonus",
    "Part-time",
    "Interest",
    "Gift",
    "Investment",
    "Freelance",
    "Other",
];

/// The number of transactions returned by a listing when no limit is given.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl Direction {
    /// The lowercase name stored in the database and used in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }

    /// `amount` with a sign: positive for income and negative for expenses.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            Direction::Income => amount,
            Direction::Expense => -amount,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Direction::Income),
            "expense" => Ok(Direction::Expense),
            _ => Err(Error::InvalidDirection(s.trim().to_owned())),
        }
    }
}

impl ToSql for Direction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Direction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [TransactionBuilder].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// How much money moved, always zero or more.
    pub amount: f64,
    /// The currency `amount` is in.
    pub currency: Currency,
    /// What the money was for or where it came from, e.g. "Groceries".
    pub category: String,
    /// Whether the money came in or went out.
    #[serde(rename = "type")]
    pub direction: Direction,
    /// When the transaction happened.
    pub date: Date,
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// Free text notes.
    pub note: String,
}

impl Transaction {
    /// The amount with a sign: positive for income and negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        self.direction.signed(self.amount)
    }
}

/// A validated transaction that has not been stored yet.
///
/// When no account is set, the transaction is added to the oldest account.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    amount: f64,
    currency: Currency,
    category: String,
    direction: Direction,
    date: Date,
    account_id: Option<AccountId>,
    note: String,
}

impl TransactionBuilder {
    /// Validate the required fields of a transaction.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` is not finite,
    /// [Error::NegativeAmount] if `amount` is less than zero, or
    /// [Error::EmptyCategory] if `category` is empty or only whitespace.
    pub fn new(
        amount: f64,
        currency: Currency,
        category: &str,
        direction: Direction,
        date: Date,
    ) -> Result<Self, Error> {
        let amount = validate_amount(amount)?;
        let category = category.trim();

        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(Self {
            amount,
            currency,
            category: category.to_owned(),
            direction,
            date,
            account_id: None,
            note: String::new(),
        })
    }

    /// Set the account the transaction belongs to.
    pub fn account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Set the note for the transaction.
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.trim().to_owned();
        self
    }
}

fn validate_amount(amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() {
        Err(Error::InvalidAmount(amount.to_string()))
    } else if amount < 0.0 {
        Err(Error::NegativeAmount(amount))
    } else {
        Ok(amount)
    }
}

/// Parse an amount typed into a form.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `text` is not a finite number, or
/// [Error::NegativeAmount] if it is less than zero.
pub fn parse_amount(text: &str) -> Result<f64, Error> {
    let amount = text
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount(text.trim().to_owned()))?;

    validate_amount(amount)
}

const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month repr:numerical padding:zero]-[day padding:zero]");

/// Parse a date in `YYYY-MM-DD` format.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid date in that format.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(text.trim().to_owned()))
}

/// The first and last day of a month.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `month` is not between 1 and 12, or
/// [Error::InvalidDate] if `year` is out of range.
pub fn month_date_range(year: i32, month: u8) -> Result<(Date, Date), Error> {
    let month_of_year = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;
    let invalid_date = || Error::InvalidDate(format!("{year}-{month:02}"));

    let start = Date::from_calendar_date(year, month_of_year, 1).map_err(|_| invalid_date())?;
    let next_month_start = match month_of_year {
        Month::December => Date::from_calendar_date(year + 1, Month::January, 1),
        _ => Date::from_calendar_date(year, month_of_year.next(), 1),
    }
    .map_err(|_| invalid_date())?;
    let end = next_month_start.previous_day().ok_or_else(invalid_date)?;

    Ok((start, end))
}

/// Filters for listing transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Only include transactions in this account.
    pub account_id: Option<AccountId>,
    /// Only include transactions on or after this date.
    pub start_date: Option<Date>,
    /// Only include transactions on or before this date.
    pub end_date: Option<Date>,
    /// The maximum number of transactions to return, [DEFAULT_LIST_LIMIT] if not set.
    pub limit: Option<u32>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL CHECK (amount >= 0),
                currency TEXT NOT NULL,
                category TEXT NOT NULL,
                direction TEXT NOT NULL CHECK (direction IN ('income', 'expense')),
                date TEXT NOT NULL,
                account_id INTEGER NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    // Add composite index used by the listing, dashboard and report queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date_account ON \"transaction\"(date, account_id);",
        (),
    )?;

    Ok(())
}

/// Use the builder's account, or the oldest account if it does not have one.
fn resolve_account_id(
    account_id: Option<AccountId>,
    connection: &Connection,
) -> Result<AccountId, Error> {
    match account_id {
        Some(id) => match get_account(id, connection) {
            Ok(account) => Ok(account.id),
            Err(Error::NotFound) => Err(Error::InvalidAccount(id)),
            Err(error) => Err(error),
        },
        None => get_default_account_id(connection),
    }
}

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] if the builder's account does not exist,
/// - [Error::NoAccounts] if the builder has no account and there are no accounts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let account_id = resolve_account_id(builder.account_id, connection)?;

    connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, currency, category, direction, date, account_id, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, amount, currency, category, direction, date, account_id, note",
        )?
        .query_row(
            (
                builder.amount,
                builder.currency,
                builder.category,
                builder.direction,
                builder.date,
                account_id,
                builder.note,
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, currency, category, direction, date, account_id, note
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Replace every field of the transaction `id` with the fields of `builder`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] if the builder's account does not exist,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let account_id = resolve_account_id(builder.account_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET amount = ?1, currency = ?2, category = ?3, direction = ?4, date = ?5,
             account_id = ?6, note = ?7
         WHERE id = ?8",
        (
            builder.amount,
            builder.currency,
            &builder.category,
            builder.direction,
            builder.date,
            account_id,
            &builder.note,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    get_transaction(id, connection)
}

/// Delete the transaction `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = :id", &[(":id", &id)])?;

    match rows_affected {
        0 => Err(Error::DeleteMissingTransaction),
        _ => Ok(()),
    }
}

/// List transactions matching `query`, newest first.
///
/// Transactions on the same date are ordered by ID, newest first, so the
/// order is stable after updates.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn query_transactions(
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, currency, category, direction, date, account_id, note
             FROM \"transaction\"
             WHERE (:account_id IS NULL OR account_id = :account_id)
               AND (:start_date IS NULL OR date >= :start_date)
               AND (:end_date IS NULL OR date <= :end_date)
             ORDER BY date DESC, id DESC
             LIMIT :limit",
        )?
        .query_map(
            named_params! {
                ":account_id": query.account_id,
                ":start_date": query.start_date,
                ":end_date": query.end_date,
                ":limit": query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            },
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get every transaction between `start` and `end` (inclusive), oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_in_range(
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, currency, category, direction, date, account_id, note
             FROM \"transaction\"
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date ASC, id ASC",
        )?
        .query_map((start, end), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        currency: row.get(2)?,
        category: row.get(3)?,
        direction: row.get(4)?,
        date: row.get(5)?,
        account_id: row.get(6)?,
        note: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod validation_tests {
    use time::macros::date;

    use crate::{Error, currency::Currency};

    use super::{Direction, TransactionBuilder, month_date_range, parse_amount, parse_date};

    #[test]
    fn parses_amounts() {
        assert_eq!(parse_amount(" 12.50 "), Ok(12.5));
        assert_eq!(parse_amount("0"), Ok(0.0));
        assert_eq!(parse_amount("abc"), Err(Error::InvalidAmount("abc".to_owned())));
        assert_eq!(parse_amount(""), Err(Error::InvalidAmount(String::new())));
        assert_eq!(parse_amount("-3"), Err(Error::NegativeAmount(-3.0)));
        assert_eq!(parse_amount("inf"), Err(Error::InvalidAmount("inf".to_owned())));
        assert_eq!(parse_amount("NaN"), Err(Error::InvalidAmount("NaN".to_owned())));
    }

    #[test]
    fn parses_dates() {
        assert_eq!(parse_date("2025-02-28"), Ok(date!(2025 - 02 - 28)));
        assert_eq!(
            parse_date("2025-02-30"),
            Err(Error::InvalidDate("2025-02-30".to_owned()))
        );
        assert_eq!(
            parse_date("28/02/2025"),
            Err(Error::InvalidDate("28/02/2025".to_owned()))
        );
    }

    #[test]
    fn parses_directions() {
        assert_eq!("Income".parse::<Direction>(), Ok(Direction::Income));
        assert_eq!(" expense".parse::<Direction>(), Ok(Direction::Expense));
        assert_eq!(
            "transfer".parse::<Direction>(),
            Err(Error::InvalidDirection("transfer".to_owned()))
        );
    }

    #[test]
    fn builder_rejects_empty_category() {
        let result = TransactionBuilder::new(
            1.0,
            Currency::USD,
            "  ",
            Direction::Expense,
            date!(2025 - 01 - 01),
        );

        assert_eq!(result, Err(Error::EmptyCategory));
    }

    #[test]
    fn builder_rejects_negative_amount() {
        let result = TransactionBuilder::new(
            -0.01,
            Currency::USD,
            "Food",
            Direction::Expense,
            date!(2025 - 01 - 01),
        );

        assert_eq!(result, Err(Error::NegativeAmount(-0.01)));
    }

    #[test]
    fn month_range_covers_whole_month() {
        assert_eq!(
            month_date_range(2024, 2),
            Ok((date!(2024 - 02 - 01), date!(2024 - 02 - 29)))
        );
        assert_eq!(
            month_date_range(2025, 12),
            Ok((date!(2025 - 12 - 01), date!(2025 - 12 - 31)))
        );
        assert_eq!(month_date_range(2025, 13), Err(Error::InvalidMonth(13)));
        assert_eq!(month_date_range(2025, 0), Err(Error::InvalidMonth(0)));
    }
}
