//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for listing and creating accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for listing and creating exchange rates.
pub const EXCHANGE_RATES_VIEW: &str = "/exchange-rates";
/// The route for the currency converter on the exchange rates page, responds with an alert.
pub const CONVERT_VIEW: &str = "/exchange-rates/convert";
/// The route that redirects to the report for the current month.
pub const REPORTS_VIEW: &str = "/reports";
/// The printable report for a single month.
pub const MONTHLY_REPORT_VIEW: &str = "/reports/{year}/{month}";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list and create accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to delete an account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to list and create exchange rates.
pub const EXCHANGE_RATES_API: &str = "/api/exchange-rates";
/// The route to delete an exchange rate.
pub const EXCHANGE_RATE: &str = "/api/exchange-rates/{rate_id}";
/// The route to convert an amount between two currencies.
pub const CONVERT_API: &str = "/api/convert";
/// The route for the dashboard summary as JSON.
pub const DASHBOARD_API: &str = "/api/dashboard";
/// The route for a monthly report as JSON.
pub const MONTHLY_REPORT_API: &str = "/api/reports/{year}/{month}";
/// The route to download a monthly report as CSV.
pub const MONTHLY_REPORT_CSV: &str = "/api/reports/{year}/{month}/csv";
/// The route to download a monthly report as PDF.
pub const MONTHLY_REPORT_PDF: &str = "/api/reports/{year}/{month}/pdf";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Paths with more than one parameter can be filled in by calling this
/// function once per parameter, see [format_month_endpoint].
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// Fill in the `{year}` and `{month}` parameters of a report endpoint.
pub fn format_month_endpoint(endpoint_path: &str, year: i32, month: u8) -> String {
    let with_year = format_endpoint(endpoint_path, i64::from(year));
    format_endpoint(&with_year, i64::from(month))
}
