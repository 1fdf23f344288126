//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;

/// Database identifier for an account.
pub type AccountId = DatabaseId;

/// Database identifier for a stored exchange rate.
pub type ExchangeRateId = DatabaseId;
