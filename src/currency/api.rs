//! JSON endpoints for exchange rates and the currency converter.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::Alert,
    currency::{
        Currency,
        rates::{get_exchange_rates, get_rate_table},
    },
    html::format_money_with_code,
    transaction::parse_amount,
};

/// The default number of rates returned by [list_exchange_rates_endpoint].
const DEFAULT_RATES_LIMIT: u32 = 100;

/// The state needed for the exchange rate and conversion endpoints.
#[derive(Debug, Clone)]
pub struct ExchangeRateApiState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExchangeRateApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters for listing exchange rates.
#[derive(Debug, Deserialize)]
pub struct ListRatesQuery {
    pub limit: Option<u32>,
}

/// Responds with the most recent stored exchange rates, newest first.
pub async fn list_exchange_rates_endpoint(
    State(state): State<ExchangeRateApiState>,
    Query(query): Query<ListRatesQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    get_exchange_rates(query.limit.unwrap_or(DEFAULT_RATES_LIMIT), &connection)
        .map(|rates| Json(rates).into_response())
        .unwrap_or_else(|error| error.into_json_response())
}

/// Query parameters for converting an amount between currencies.
///
/// Missing fields are reported by [convert] as invalid input rather than
/// rejected by the extractor, so every caller gets the same error format.
#[derive(Debug, Default, Deserialize)]
pub struct ConvertQuery {
    pub amount: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// The result of converting an amount.
#[derive(Debug, Serialize, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: Currency,
    pub to: Currency,
    pub rate: f64,
    pub converted: f64,
}

fn convert(query: &ConvertQuery, connection: &Connection) -> Result<Conversion, Error> {
    let amount = parse_amount(query.amount.as_deref().unwrap_or_default())?;
    let from: Currency = query.from.as_deref().unwrap_or_default().parse()?;
    let to: Currency = query.to.as_deref().unwrap_or_default().parse()?;

    let rate = get_rate_table(connection)?.rate(from, to);

    Ok(Conversion {
        amount,
        from,
        to,
        rate,
        converted: amount * rate,
    })
}

/// Responds with `amount` converted from one currency to another as JSON.
pub async fn convert_endpoint(
    State(state): State<ExchangeRateApiState>,
    Query(query): Query<ConvertQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    convert(&query, &connection)
        .map(|conversion| Json(conversion).into_response())
        .unwrap_or_else(|error| error.into_json_response())
}

/// Responds with the result of a conversion as an alert for the converter form.
pub async fn convert_view_endpoint(
    State(state): State<ExchangeRateApiState>,
    Query(query): Query<ConvertQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match convert(&query, &connection) {
        Ok(conversion) => Alert::Success {
            message: format!(
                "{} = {}",
                format_money_with_code(conversion.amount, conversion.from),
                format_money_with_code(conversion.converted, conversion.to)
            ),
            details: format!(
                "1 {} = {:.6} {}",
                conversion.from, conversion.rate, conversion.to
            ),
        }
        .into_html()
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
