//! Application router configuration for the HTML views and the JSON/HTMX endpoints.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, put},
};

use crate::{
    AppState,
    account::{create_account_endpoint, delete_account_endpoint, get_accounts_page, list_accounts_endpoint},
    currency::{
        convert_endpoint, convert_view_endpoint, create_exchange_rate_endpoint,
        delete_exchange_rate_endpoint, get_exchange_rates_page, list_exchange_rates_endpoint,
    },
    dashboard::{get_dashboard_page, get_dashboard_summary_endpoint},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    report::{
        get_monthly_report_csv, get_monthly_report_endpoint, get_monthly_report_page,
        get_monthly_report_pdf, get_reports_page,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_create_transaction_page, get_edit_transaction_page, get_transactions_page,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let view_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::EXCHANGE_RATES_VIEW, get(get_exchange_rates_page))
        .route(endpoints::CONVERT_VIEW, get(convert_view_endpoint))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::MONTHLY_REPORT_VIEW, get(get_monthly_report_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::ACCOUNTS_API,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(endpoints::ACCOUNT, delete(delete_account_endpoint))
        .route(
            endpoints::EXCHANGE_RATES_API,
            get(list_exchange_rates_endpoint).post(create_exchange_rate_endpoint),
        )
        .route(
            endpoints::EXCHANGE_RATE,
            delete(delete_exchange_rate_endpoint),
        )
        .route(endpoints::CONVERT_API, get(convert_endpoint))
        .route(endpoints::DASHBOARD_API, get(get_dashboard_summary_endpoint))
        .route(
            endpoints::MONTHLY_REPORT_API,
            get(get_monthly_report_endpoint),
        )
        .route(endpoints::MONTHLY_REPORT_CSV, get(get_monthly_report_csv))
        .route(endpoints::MONTHLY_REPORT_PDF, get(get_monthly_report_pdf));

    view_routes
        .merge(api_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
