//! The set of currencies the app can record amounts in.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A supported currency, identified by its ISO 4217 code.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    /// Chinese yuan.
    CNY,
    /// United States dollar.
    USD,
    /// Euro.
    EUR,
    /// Pound sterling.
    GBP,
    /// Japanese yen.
    JPY,
    /// Canadian dollar.
    CAD,
    /// Australian dollar.
    AUD,
}

impl Currency {
    /// Every supported currency, in the order they are offered in forms.
    pub const ALL: [Currency; 7] = [
        Currency::CNY,
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CAD,
        Currency::AUD,
    ];

    /// The three letter ISO 4217 code, e.g. "USD".
    pub fn code(self) -> &'static str {
        match self {
            Currency::CNY => "CNY",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
        }
    }

    /// The prefix used when displaying amounts, e.g. "$" for USD.
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::CNY => "¥",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "JP¥",
            Currency::CAD => "CA$",
            Currency::AUD => "A$",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    /// Parse a currency code, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    /// Returns [Error::UnsupportedCurrency] if `s` is not one of [Currency::ALL].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();

        Currency::ALL
            .into_iter()
            .find(|currency| currency.code() == code)
            .ok_or(Error::UnsupportedCurrency(s.trim().to_owned()))
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// Round `amount` to two decimal places.
pub fn round_to_cents(amount: f64) -> f64 {
    let rounded = (amount * 100.0).round() / 100.0;
    // Avoid showing "-0.00"
    if rounded == 0.0 { 0.0 } else { rounded }
}
