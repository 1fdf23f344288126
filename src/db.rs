//! Sets up the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    Error,
    account::{create_account_table, seed_default_account},
    currency::{create_exchange_rate_table, seed_default_exchange_rates},
    transaction::create_transaction_table,
};

/// Create the tables for every domain model and seed the default account and
/// exchange rates.
///
/// Calling this on a database that has already been initialized is safe, existing rows are
/// left untouched.
///
/// # Errors
/// Returns an error if a table cannot be created or there is some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys cannot be toggled inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_exchange_rate_table(&transaction)?;

    seed_default_account(&transaction)?;
    seed_default_exchange_rates(&transaction, OffsetDateTime::now_utc().date())?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_twice_succeeds() {
        let conn = Connection::open_in_memory().unwrap();

        assert_eq!(initialize(&conn), Ok(()));
        assert_eq!(initialize(&conn), Ok(()));
    }

    #[test]
    fn enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let enabled: bool = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert!(enabled);
    }
}
