//! The dashboard: this month's totals, charts, account balances and the latest transactions.

pub(crate) mod aggregation;
mod handlers;
mod summary;

pub use handlers::{get_dashboard_page, get_dashboard_summary_endpoint};
