//! Monthly reports in the base currency, rendered as HTML or exported as JSON, CSV and PDF.

mod core;
mod handlers;
mod pdf;

pub use handlers::{
    get_monthly_report_csv, get_monthly_report_endpoint, get_monthly_report_page,
    get_monthly_report_pdf, get_reports_page,
};
