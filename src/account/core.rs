//! Accounts and their balances, stored in the `account` table.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{
    Error,
    currency::{Currency, RateTable, round_to_cents},
    database_id::AccountId,
    transaction::Direction,
};

/// The name of the account created when the database is first set up.
pub const DEFAULT_ACCOUNT_NAME: &str = "Main Account";
/// The currency of the account created when the database is first set up.
pub const DEFAULT_ACCOUNT_CURRENCY: Currency = Currency::CNY;

/// A place money is kept, e.g. a bank account or a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The unique, human readable name of the account.
    pub name: String,
    /// The currency the account balance is shown in.
    pub currency: Currency,
}

/// An account together with the sum of its transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalance {
    /// The account.
    #[serde(flatten)]
    pub account: Account,
    /// Income minus expenses in the account currency, rounded to cents.
    pub balance: f64,
}

/// A validated account name.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountName(String);

impl AccountName {
    /// Create an account name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    /// Returns [Error::EmptyAccountName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyAccountName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// The trimmed name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Create the account table with a unique name column.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            currency TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Create the default account if there are no accounts.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn seed_default_account(connection: &Connection) -> Result<(), Error> {
    if count_accounts(connection)? > 0 {
        return Ok(());
    }

    let account = create_account(
        &AccountName::new(DEFAULT_ACCOUNT_NAME)?,
        DEFAULT_ACCOUNT_CURRENCY,
        connection,
    )?;
    tracing::info!("Created default account {account:?}");

    Ok(())
}

/// Map a row selected as `id, name, currency` to an [Account].
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        currency: row.get(2)?,
    })
}

/// Create a new account.
///
/// # Errors
/// Returns [Error::DuplicateAccountName] if an account called `name` already
/// exists, or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    name: &AccountName,
    currency: Currency,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .execute(
            "INSERT INTO account (name, currency) VALUES (?1, ?2)",
            (name.as_str(), currency),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(name.as_str().to_owned())
            }
            error => error.into(),
        })?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        name: name.as_str().to_owned(),
        currency,
    })
}

/// Get an account by its ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no account with `id`.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            "SELECT id, name, currency FROM account WHERE id = ?1",
            [id],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get every account ordered by name.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name, currency FROM account ORDER BY name ASC, id ASC")?
        .query_map([], map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

/// The ID of the oldest account, used when a transaction does not name one.
///
/// # Errors
/// Returns [Error::NoAccounts] if there are no accounts.
pub fn get_default_account_id(connection: &Connection) -> Result<AccountId, Error> {
    connection
        .query_row("SELECT MIN(id) FROM account", [], |row| {
            row.get::<_, Option<AccountId>>(0)
        })?
        .ok_or(Error::NoAccounts)
}

/// The number of accounts in the database.
pub fn count_accounts(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM account", [], |row| row.get(0))
        .map_err(Error::from)
}

/// Delete an account that has no transactions.
///
/// # Errors
/// Returns [Error::DeleteMissingAccount] if there is no account with `id`,
/// [Error::AccountInUse] if transactions still refer to the account, or
/// [Error::SqlError] if there is some other SQL error.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    let account = match get_account(id, connection) {
        Ok(account) => account,
        Err(Error::NotFound) => return Err(Error::DeleteMissingAccount),
        Err(error) => return Err(error),
    };

    let transaction_count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM \"transaction\" WHERE account_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::AccountInUse(account.name));
    }

    connection.execute("DELETE FROM account WHERE id = :id", &[(":id", &id)])?;

    Ok(())
}

/// Get every account with its balance, ordered by name.
///
/// Each transaction is converted from its own currency into the currency of
/// its account using `rates`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_account_balances(
    rates: &RateTable,
    connection: &Connection,
) -> Result<Vec<AccountBalance>, Error> {
    let totals = connection
        .prepare(
            "SELECT account_id, currency, direction, SUM(amount) FROM \"transaction\"
             GROUP BY account_id, currency, direction",
        )?
        .query_map([], |row| {
            Ok((
                row.get::<_, AccountId>(0)?,
                row.get::<_, Currency>(1)?,
                row.get::<_, Direction>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let balances = get_all_accounts(connection)?
        .into_iter()
        .map(|account| {
            let balance: f64 = totals
                .iter()
                .filter(|(account_id, ..)| *account_id == account.id)
                .map(|(_, currency, direction, total)| {
                    direction.signed(rates.convert(*total, *currency, account.currency))
                })
                .sum();

            AccountBalance {
                account,
                balance: round_to_cents(balance),
            }
        })
        .collect();

    Ok(balances)
}
