//! Defines the endpoint for storing a new exchange rate.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    currency::{
        Currency,
        rates::{NewExchangeRate, RateSource, create_exchange_rate, parse_rate},
    },
    endpoints,
    transaction::parse_date,
};

/// The state needed to create an exchange rate.
#[derive(Debug, Clone)]
pub struct CreateExchangeRateState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExchangeRateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating an exchange rate.
///
/// Fields are kept as text so that bad input is reported as an alert instead
/// of a generic rejection.
#[derive(Debug, Deserialize)]
pub struct ExchangeRateForm {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: String,
    pub date: String,
}

impl ExchangeRateForm {
    fn validate(&self) -> Result<NewExchangeRate, Error> {
        NewExchangeRate::new(
            self.from_currency.parse::<Currency>()?,
            self.to_currency.parse::<Currency>()?,
            parse_rate(&self.rate)?,
            parse_date(&self.date)?,
        )
    }
}

/// A route handler for creating an exchange rate, redirects to the exchange rates view on success.
pub async fn create_exchange_rate_endpoint(
    State(state): State<CreateExchangeRateState>,
    Form(form): Form<ExchangeRateForm>,
) -> Response {
    let new_rate = match form.validate() {
        Ok(new_rate) => new_rate,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_exchange_rate(new_rate, RateSource::Manual, &connection) {
        Ok(rate) => {
            tracing::info!(
                "Stored exchange rate {} -> {} = {}",
                rate.from_currency,
                rate.to_currency,
                rate.rate
            );

            (
                HxRedirect(endpoints::EXCHANGE_RATES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not create exchange rate from {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};

    use crate::{
        currency::{
            Currency,
            create_rate_endpoint::{
                CreateExchangeRateState, ExchangeRateForm, create_exchange_rate_endpoint,
            },
            rates::{RateSource, get_exchange_rates, get_rate_table},
        },
        endpoints,
        test_utils::{assert_hx_redirect, get_test_connection},
    };

    fn get_state() -> CreateExchangeRateState {
        CreateExchangeRateState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn form(from: &str, to: &str, rate: &str) -> ExchangeRateForm {
        ExchangeRateForm {
            from_currency: from.to_owned(),
            to_currency: to.to_owned(),
            rate: rate.to_owned(),
            date: "2099-01-01".to_owned(),
        }
    }

    #[tokio::test]
    async fn stores_manual_rate() {
        let state = get_state();

        let response =
            create_exchange_rate_endpoint(State(state.clone()), Form(form("JPY", "AUD", "0.01")))
                .await;

        assert_hx_redirect(&response, endpoints::EXCHANGE_RATES_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let newest = get_exchange_rates(1, &connection).unwrap().remove(0);
        assert_eq!(newest.from_currency, Currency::JPY);
        assert_eq!(newest.source, RateSource::Manual);
        let table = get_rate_table(&connection).unwrap();
        assert_eq!(table.rate(Currency::JPY, Currency::AUD), 0.01);
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        let cases = [
            form("USD", "EUR", "abc"),
            form("USD", "EUR", "-1"),
            form("USD", "XYZ", "1"),
            form("EUR", "eur", "1"),
            ExchangeRateForm {
                date: "yesterday".to_owned(),
                ..form("USD", "EUR", "1")
            },
        ];

        for case in cases {
            let state = get_state();
            let response = create_exchange_rate_endpoint(State(state.clone()), Form(case)).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let connection = state.db_connection.lock().unwrap();
            assert_eq!(get_exchange_rates(100, &connection).unwrap().len(), 6);
        }
    }
}
