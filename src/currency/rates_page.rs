//! The page for managing exchange rates and converting between currencies.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    currency::{
        Currency,
        rates::{ExchangeRate, get_exchange_rates},
    },
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        currency_select, edit_delete_action_links, loading_spinner,
    },
    navigation::NavBar,
    timezone::current_local_date,
};

/// How many of the most recent rates to show on the page.
const RATES_PAGE_LIMIT: u32 = 50;

/// The state needed for the exchange rates page.
#[derive(Debug, Clone)]
pub struct ExchangeRatesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The currency selected by default in the converter.
    pub base_currency: Currency,
}

impl FromRef<AppState> for ExchangeRatesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            base_currency: state.base_currency,
        }
    }
}

/// Renders the exchange rates page.
pub async fn get_exchange_rates_page(
    State(state): State<ExchangeRatesPageState>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;

    let rates = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_exchange_rates(RATES_PAGE_LIMIT, &connection)
            .inspect_err(|error| tracing::error!("could not get exchange rates: {error}"))?
    };

    Ok(exchange_rates_view(&rates, today, state.base_currency).into_response())
}

fn exchange_rates_view(rates: &[ExchangeRate], today: Date, base_currency: Currency) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXCHANGE_RATES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl grid grid-cols-1 lg:grid-cols-3 gap-6"
            {
                section class="lg:col-span-2 space-y-4 overflow-x-auto"
                {
                    h1 class="text-xl font-bold" { "Exchange Rates" }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "The latest rate for a pair is used for conversions. Pairs without \
                        a stored rate fall back to built-in approximate rates."
                    }

                    (rates_table(rates))
                }

                div class="space-y-6"
                {
                    section class=(CARD_STYLE) { (converter_form(base_currency)) }
                    section class=(CARD_STYLE) { (create_rate_form(today, base_currency)) }
                }
            }
        }
    );

    base("Exchange Rates", &[], &content)
}

fn rates_table(rates: &[ExchangeRate]) -> Markup {
    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Pair" }
                    th scope="col" class="px-6 py-3 text-right" { "Rate" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Source" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for rate in rates {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                        {
                            (rate.from_currency) " → " (rate.to_currency)
                        }
                        td class="px-6 py-4 text-right tabular-nums" { (format!("{:.4}", rate.rate)) }
                        td class=(TABLE_CELL_STYLE) { time datetime=(rate.date) { (rate.date) } }
                        td class=(TABLE_CELL_STYLE) { (rate.source) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            (edit_delete_action_links(
                                None,
                                &format_endpoint(endpoints::EXCHANGE_RATE, rate.id),
                                &format!(
                                    "Are you sure you want to delete the {} to {} rate from {}?",
                                    rate.from_currency, rate.to_currency, rate.date
                                ),
                                "closest tr",
                                "delete",
                            ))
                        }
                    }
                }

                @if rates.is_empty() {
                    tr
                    {
                        td colspan="5" class="px-6 py-4 text-center"
                        {
                            "No stored rates, conversions use the built-in rates."
                        }
                    }
                }
            }
        }
    )
}

fn converter_form(base_currency: Currency) -> Markup {
    html!(
        form
            id="converter"
            hx-get=(endpoints::CONVERT_VIEW)
            hx-target="#conversion-result"
            hx-target-error="#conversion-result"
            class="space-y-4"
        {
            h2 class="text-lg font-semibold" { "Convert" }

            div
            {
                label for="convert-amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    name="amount"
                    id="convert-amount"
                    type="number"
                    step="0.01"
                    min="0"
                    value="100"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="grid grid-cols-2 gap-2"
            {
                div
                {
                    label for="from" class=(FORM_LABEL_STYLE) { "From" }
                    (currency_select("from", Currency::USD))
                }
                div
                {
                    label for="to" class=(FORM_LABEL_STYLE) { "To" }
                    (currency_select("to", base_currency))
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Convert" }

            div id="conversion-result" {}
        }
    )
}

fn create_rate_form(today: Date, base_currency: Currency) -> Markup {
    html!(
        form
            id="create-rate"
            hx-post=(endpoints::EXCHANGE_RATES_API)
            hx-target-error="#alert-container"
            class="space-y-4"
        {
            h2 class="text-lg font-semibold" { "Add Rate" }

            div class="grid grid-cols-2 gap-2"
            {
                div
                {
                    label for="from_currency" class=(FORM_LABEL_STYLE) { "From" }
                    (currency_select("from_currency", Currency::USD))
                }
                div
                {
                    label for="to_currency" class=(FORM_LABEL_STYLE) { "To" }
                    (currency_select("to_currency", base_currency))
                }
            }

            div
            {
                label for="rate" class=(FORM_LABEL_STYLE) { "Rate" }

                input
                    name="rate"
                    id="rate"
                    type="number"
                    step="any"
                    min="0"
                    placeholder="Units of 'To' per one unit of 'From'"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="rate-date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="rate-date"
                    type="date"
                    value=(today)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Add Rate"
            }
        }
    )
}
