//! Currencies, exchange rates and conversion between them.

mod api;
mod core;
mod create_rate_endpoint;
mod delete_rate_endpoint;
mod rates;
mod rates_page;

pub use api::{convert_endpoint, convert_view_endpoint, list_exchange_rates_endpoint};
pub use core::{Currency, round_to_cents};
pub use create_rate_endpoint::create_exchange_rate_endpoint;
pub use delete_rate_endpoint::delete_exchange_rate_endpoint;
pub use rates::{
    RateTable, create_exchange_rate_table, get_rate_table, seed_default_exchange_rates,
};
pub use rates_page::get_exchange_rates_page;
