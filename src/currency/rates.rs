//! Exchange rates and currency conversion.
//!
//! Conversion always succeeds for supported currencies: rates the user has
//! stored take priority, and a built-in table of rates against the US dollar
//! fills in any pair that has not been stored.

use std::{collections::HashMap, fmt::Display};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::Serialize;
use time::Date;

use crate::{Error, currency::Currency, database_id::ExchangeRateId};

/// The number of units of each currency that equal one US dollar.
///
/// These are approximate and only used when no stored rate covers a pair.
pub fn units_per_usd(currency: Currency) -> f64 {
    match currency {
        Currency::USD => 1.0,
        Currency::CNY => 7.2,
        Currency::EUR => 0.92,
        Currency::GBP => 0.8,
        Currency::JPY => 150.0,
        Currency::CAD => 1.36,
        Currency::AUD => 1.52,
    }
}

/// The rates stored when the database is first created.
const DEFAULT_RATES: [(Currency, Currency, f64); 6] = [
    (Currency::USD, Currency::CNY, 7.2),
    (Currency::EUR, Currency::CNY, 7.8),
    (Currency::GBP, Currency::CNY, 9.0),
    (Currency::CNY, Currency::USD, 1.0 / 7.2),
    (Currency::USD, Currency::EUR, 0.92),
    (Currency::EUR, Currency::USD, 1.0 / 0.92),
];

/// Where a stored exchange rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Seeded when the database was created.
    Default,
    /// Entered by the user.
    Manual,
}

impl RateSource {
    fn as_str(self) -> &'static str {
        match self {
            RateSource::Default => "default",
            RateSource::Manual => "manual",
        }
    }
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for RateSource {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RateSource {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "default" => Ok(RateSource::Default),
            "manual" => Ok(RateSource::Manual),
            other => Err(FromSqlError::Other(
                format!("unknown rate source {other:?}").into(),
            )),
        }
    }
}

/// The price of one unit of `from` in units of `to`, as of `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    /// The ID of the stored rate.
    pub id: ExchangeRateId,
    /// The currency being converted from.
    pub from_currency: Currency,
    /// The currency being converted to.
    pub to_currency: Currency,
    /// Units of `to_currency` per unit of `from_currency`.
    pub rate: f64,
    /// When the rate was recorded.
    pub date: Date,
    /// Where the rate came from.
    pub source: RateSource,
}

/// A validated exchange rate that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExchangeRate {
    from_currency: Currency,
    to_currency: Currency,
    rate: f64,
    date: Date,
}

impl NewExchangeRate {
    /// Validate a new exchange rate.
    ///
    /// # Errors
    /// Returns [Error::SameCurrencyRate] if both currencies are the same, or
    /// [Error::InvalidRate] if `rate` is not a finite number greater than zero.
    pub fn new(
        from_currency: Currency,
        to_currency: Currency,
        rate: f64,
        date: Date,
    ) -> Result<Self, Error> {
        if from_currency == to_currency {
            return Err(Error::SameCurrencyRate(from_currency));
        }

        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::InvalidRate(rate.to_string()));
        }

        Ok(Self {
            from_currency,
            to_currency,
            rate,
            date,
        })
    }
}

/// Parse a rate typed into a form.
///
/// # Errors
/// Returns [Error::InvalidRate] if `text` is not a number.
pub fn parse_rate(text: &str) -> Result<f64, Error> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidRate(text.trim().to_owned()))
}

/// A snapshot of the latest stored rate for each currency pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    latest: HashMap<(Currency, Currency), f64>,
}

impl RateTable {
    /// Build a rate table from stored rates.
    ///
    /// When a pair has more than one rate, the one with the latest date wins,
    /// with ties going to the most recently stored rate.
    pub fn from_rates(rates: &[ExchangeRate]) -> Self {
        let mut sorted: Vec<&ExchangeRate> = rates.iter().collect();
        sorted.sort_by_key(|rate| (rate.date, rate.id));

        let latest = sorted
            .into_iter()
            .map(|rate| ((rate.from_currency, rate.to_currency), rate.rate))
            .collect();

        Self { latest }
    }

    /// The number of units of `to` that one unit of `from` is worth.
    ///
    /// Lookup order: identity, stored direct rate, inverse of the stored
    /// reverse rate, stored rates through USD, then the built-in table.
    pub fn rate(&self, from: Currency, to: Currency) -> f64 {
        if from == to {
            return 1.0;
        }

        if let Some(rate) = self.stored_rate(from, to) {
            return rate;
        }

        if from != Currency::USD && to != Currency::USD {
            if let (Some(to_usd), Some(from_usd)) = (
                self.stored_rate(from, Currency::USD),
                self.stored_rate(Currency::USD, to),
            ) {
                return to_usd * from_usd;
            }
        }

        units_per_usd(to) / units_per_usd(from)
    }

    /// Convert `amount` in `from` into `to`.
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> f64 {
        amount * self.rate(from, to)
    }

    fn stored_rate(&self, from: Currency, to: Currency) -> Option<f64> {
        if let Some(rate) = self.latest.get(&(from, to)) {
            return Some(*rate);
        }

        self.latest
            .get(&(to, from))
            .filter(|rate| **rate != 0.0)
            .map(|rate| 1.0 / rate)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the exchange rate table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_exchange_rate_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS exchange_rate (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_currency TEXT NOT NULL,
                to_currency TEXT NOT NULL,
                rate REAL NOT NULL CHECK (rate > 0),
                date TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT 'manual'
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_exchange_rate_pair ON exchange_rate(from_currency, to_currency, date);",
        (),
    )?;

    Ok(())
}

/// Store the default exchange rates if no rates have been stored yet.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_default_exchange_rates(connection: &Connection, today: Date) -> Result<(), Error> {
    let count: i64 =
        connection.query_row("SELECT COUNT(id) FROM exchange_rate", [], |row| row.get(0))?;

    if count > 0 {
        return Ok(());
    }

    for (from_currency, to_currency, rate) in DEFAULT_RATES {
        let new_rate = NewExchangeRate::new(from_currency, to_currency, rate, today)?;
        create_exchange_rate(new_rate, RateSource::Default, connection)?;
    }

    tracing::info!("Seeded {} default exchange rates", DEFAULT_RATES.len());

    Ok(())
}

/// Store a new exchange rate.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_exchange_rate(
    new_rate: NewExchangeRate,
    source: RateSource,
    connection: &Connection,
) -> Result<ExchangeRate, Error> {
    connection
        .prepare(
            "INSERT INTO exchange_rate (from_currency, to_currency, rate, date, source)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, from_currency, to_currency, rate, date, source",
        )?
        .query_row(
            (
                new_rate.from_currency,
                new_rate.to_currency,
                new_rate.rate,
                new_rate.date,
                source,
            ),
            map_exchange_rate_row,
        )
        .map_err(Error::from)
}

/// Get up to `limit` stored exchange rates, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_exchange_rates(limit: u32, connection: &Connection) -> Result<Vec<ExchangeRate>, Error> {
    connection
        .prepare(
            "SELECT id, from_currency, to_currency, rate, date, source FROM exchange_rate
             ORDER BY date DESC, id DESC LIMIT ?1",
        )?
        .query_map([limit], map_exchange_rate_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Load every stored exchange rate into a [RateTable].
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_rate_table(connection: &Connection) -> Result<RateTable, Error> {
    let rates = connection
        .prepare("SELECT id, from_currency, to_currency, rate, date, source FROM exchange_rate")?
        .query_map([], map_exchange_rate_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RateTable::from_rates(&rates))
}

/// Delete a stored exchange rate.
///
/// # Errors
/// Returns [Error::DeleteMissingExchangeRate] if there is no rate with `id`,
/// or [Error::SqlError] if there is some other SQL error.
pub fn delete_exchange_rate(id: ExchangeRateId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM exchange_rate WHERE id = :id", &[(":id", &id)])?;

    match rows_affected {
        0 => Err(Error::DeleteMissingExchangeRate),
        _ => Ok(()),
    }
}

fn map_exchange_rate_row(row: &Row) -> Result<ExchangeRate, rusqlite::Error> {
    Ok(ExchangeRate {
        id: row.get(0)?,
        from_currency: row.get(1)?,
        to_currency: row.get(2)?,
        rate: row.get(3)?,
        date: row.get(4)?,
        source: row.get(5)?,
    })
}

#[cfg(test)]
mod rate_table_tests {
    use time::macros::date;

    use crate::currency::Currency;

    use super::{ExchangeRate, RateSource, RateTable, units_per_usd};

    fn stored(id: i64, from: Currency, to: Currency, rate: f64) -> ExchangeRate {
        ExchangeRate {
            id,
            from_currency: from,
            to_currency: to,
            rate,
            date: date!(2025 - 06 - 01),
            source: RateSource::Manual,
        }
    }

    #[test]
    fn same_currency_is_one() {
        let table = RateTable::default();

        for currency in Currency::ALL {
            assert_eq!(table.rate(currency, currency), 1.0);
        }
    }

    #[test]
    fn static_rates_round_trip() {
        let table = RateTable::default();
        let amount = 1234.56;

        for from in Currency::ALL {
            for to in Currency::ALL {
                let there = table.convert(amount, from, to);
                let back = table.convert(there, to, from);

                assert!(
                    ((back - amount) / amount).abs() < 1e-9,
                    "{amount} {from} -> {there} {to} -> {back} {from}"
                );
            }
        }
    }

    #[test]
    fn static_rates_go_through_usd() {
        let table = RateTable::default();

        let want = units_per_usd(Currency::CNY) / units_per_usd(Currency::EUR);
        assert_eq!(table.rate(Currency::EUR, Currency::CNY), want);
    }

    #[test]
    fn stored_direct_rate_takes_priority() {
        let table = RateTable::from_rates(&[stored(1, Currency::USD, Currency::CNY, 7.0)]);

        assert_eq!(table.convert(10.0, Currency::USD, Currency::CNY), 70.0);
    }

    #[test]
    fn stored_reverse_rate_is_inverted() {
        let table = RateTable::from_rates(&[stored(1, Currency::USD, Currency::GBP, 0.5)]);

        assert_eq!(table.rate(Currency::GBP, Currency::USD), 2.0);
    }

    #[test]
    fn stored_rates_chain_through_usd() {
        let table = RateTable::from_rates(&[
            stored(1, Currency::AUD, Currency::USD, 0.5),
            stored(2, Currency::USD, Currency::JPY, 100.0),
        ]);

        assert_eq!(table.rate(Currency::AUD, Currency::JPY), 50.0);
    }

    #[test]
    fn latest_rate_wins() {
        let mut older = stored(2, Currency::USD, Currency::EUR, 0.8);
        older.date = date!(2025 - 01 - 01);
        let newer = stored(1, Currency::USD, Currency::EUR, 0.9);
        let same_day_later = stored(3, Currency::USD, Currency::EUR, 0.95);

        let table = RateTable::from_rates(&[newer.clone(), older.clone()]);
        assert_eq!(table.rate(Currency::USD, Currency::EUR), 0.9);

        let table = RateTable::from_rates(&[same_day_later, older, newer]);
        assert_eq!(table.rate(Currency::USD, Currency::EUR), 0.95);
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, currency::Currency, db::initialize};

    use super::{
        NewExchangeRate, RateSource, create_exchange_rate, delete_exchange_rate,
        get_exchange_rates, get_rate_table, parse_rate, seed_default_exchange_rates,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn initialize_seeds_default_rates_once() {
        let conn = get_test_connection();
        let count = get_exchange_rates(100, &conn).unwrap().len();

        seed_default_exchange_rates(&conn, date!(2025 - 01 - 01)).unwrap();

        assert_eq!(count, 6);
        assert_eq!(get_exchange_rates(100, &conn).unwrap().len(), 6);
    }

    #[test]
    fn create_and_list_newest_first() {
        let conn = get_test_connection();
        let rate = NewExchangeRate::new(
            Currency::GBP,
            Currency::JPY,
            190.0,
            date!(2099 - 01 - 01),
        )
        .unwrap();

        let created = create_exchange_rate(rate, RateSource::Manual, &conn).unwrap();
        let rates = get_exchange_rates(1, &conn).unwrap();

        assert_eq!(rates, vec![created]);
        assert_eq!(rates[0].source, RateSource::Manual);
    }

    #[test]
    fn stored_rate_is_used_for_conversion() {
        let conn = get_test_connection();
        let rate =
            NewExchangeRate::new(Currency::CAD, Currency::AUD, 1.25, date!(2025 - 01 - 01))
                .unwrap();
        create_exchange_rate(rate, RateSource::Manual, &conn).unwrap();

        let table = get_rate_table(&conn).unwrap();

        assert_eq!(table.convert(100.0, Currency::CAD, Currency::AUD), 125.0);
    }

    #[test]
    fn rejects_invalid_rates() {
        let today = date!(2025 - 01 - 01);

        assert_eq!(
            NewExchangeRate::new(Currency::USD, Currency::USD, 1.0, today),
            Err(Error::SameCurrencyRate(Currency::USD))
        );
        assert_eq!(
            NewExchangeRate::new(Currency::USD, Currency::EUR, 0.0, today),
            Err(Error::InvalidRate("0".to_owned()))
        );
        assert_eq!(
            NewExchangeRate::new(Currency::USD, Currency::EUR, -2.0, today),
            Err(Error::InvalidRate("-2".to_owned()))
        );
        assert_eq!(parse_rate("abc"), Err(Error::InvalidRate("abc".to_owned())));
        assert_eq!(parse_rate(" 1.5 "), Ok(1.5));
    }

    #[test]
    fn delete_removes_rate() {
        let conn = get_test_connection();
        let rate = get_exchange_rates(1, &conn).unwrap().remove(0);

        delete_exchange_rate(rate.id, &conn).unwrap();

        assert!(!get_exchange_rates(100, &conn).unwrap().contains(&rate));
        assert_eq!(
            delete_exchange_rate(rate.id, &conn),
            Err(Error::DeleteMissingExchangeRate)
        );
    }
}
