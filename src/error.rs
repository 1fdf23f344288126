//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    alert::Alert, currency::Currency, database_id::AccountId,
    internal_server_error::InternalServerError, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The amount in a form could not be parsed as a finite number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A negative amount was used to create a transaction.
    ///
    /// Whether money came in or went out is recorded by the transaction
    /// direction, so amounts are always zero or more.
    #[error("{0} is negative, amounts must be zero or more")]
    NegativeAmount(f64),

    /// The currency code is not one of the supported currencies.
    #[error("unsupported currency \"{0}\"")]
    UnsupportedCurrency(String),

    /// The transaction direction was neither income nor expense.
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidDirection(String),

    /// An empty string was used as a transaction category.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// An empty string was used as an account name.
    #[error("account name cannot be empty")]
    EmptyAccountName,

    /// A date string was not formatted as `YYYY-MM-DD`.
    #[error("\"{0}\" is not a valid date, dates must be in YYYY-MM-DD format")]
    InvalidDate(String),

    /// An exchange rate was zero, negative or not a number.
    #[error("\"{0}\" is not a valid exchange rate, rates must be positive numbers")]
    InvalidRate(String),

    /// An exchange rate from a currency to itself.
    #[error("cannot set an exchange rate from {0} to itself")]
    SameCurrencyRate(Currency),

    /// A month number outside of 1-12.
    #[error("{0} is not a valid month")]
    InvalidMonth(u8),

    /// The account ID used to create a transaction did not match a valid account.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(AccountId),

    /// A transaction was submitted without an account and there are no accounts to fall back on.
    #[error("there are no accounts to add the transaction to")]
    NoAccounts,

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// Tried to delete an account that still has transactions.
    #[error("the account \"{0}\" still has transactions")]
    AccountInUse(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while writing a CSV file.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// An error occurred while rendering a PDF document.
    #[error("could not write PDF: {0}")]
    PdfError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to delete an exchange rate that does not exist
    #[error("tried to delete an exchange rate that is not in the database")]
    DeleteMissingExchangeRate,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::CsvError(value.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(value: lopdf::Error) -> Self {
        Error::PdfError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidMonth(month) => InternalServerError {
                description: "Invalid Month",
                fix: &format!("{month} is not a month. Pick a month between 1 and 12."),
            }
            .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    ///
    /// Validation errors are reported with a 400 status so that the form
    /// that caused them stays on screen next to the alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            error if error.is_invalid_input() => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid input".to_owned(),
                    details: capitalise(&error.to_string()),
                },
            ),
            Error::NoAccounts => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "No accounts".to_owned(),
                    details: "Create an account before adding transactions.".to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingAccount => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete account".to_owned(),
                    details: "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingExchangeRate => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete exchange rate".to_owned(),
                    details: "The exchange rate could not be found. \
                    Try refreshing the page to see if the rate has already been deleted."
                        .to_owned(),
                },
            ),
            Error::AccountInUse(name) => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Account In Use".to_owned(),
                    details: format!(
                        "The account {name} still has transactions. \
                        Delete or move its transactions before deleting the account."
                    ),
                },
            ),
            Error::DuplicateAccountName(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Account Name".to_owned(),
                    details: format!(
                        "The account {name} already exists in the database. \
                        Choose a different account name, or delete the existing account.",
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Convert the error into a JSON response of the form `{"error": "..."}`.
    ///
    /// Details of unexpected errors are logged instead of being sent to the client.
    pub fn into_json_response(self) -> Response {
        let (status_code, message) = match self {
            error if error.is_invalid_input() => (StatusCode::BAD_REQUEST, error.to_string()),
            Error::NoAccounts => (StatusCode::BAD_REQUEST, Error::NoAccounts.to_string()),
            Error::NotFound => (StatusCode::NOT_FOUND, Error::NotFound.to_string()),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an unexpected error occurred".to_owned(),
                )
            }
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }

    /// Whether the error was caused by invalid user input, as opposed to a
    /// problem on the server.
    fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount(_)
                | Error::NegativeAmount(_)
                | Error::UnsupportedCurrency(_)
                | Error::InvalidDirection(_)
                | Error::EmptyCategory
                | Error::EmptyAccountName
                | Error::InvalidDate(_)
                | Error::InvalidRate(_)
                | Error::SameCurrencyRate(_)
                | Error::InvalidMonth(_)
                | Error::InvalidAccount(_)
        )
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
