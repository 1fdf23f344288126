//! Income and expense records, plus the pages and endpoints for managing them.

mod api;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod query;
mod transactions_page;
mod view;

pub use api::list_transactions_endpoint;
pub use core::{
    Direction, Transaction, TransactionBuilder, TransactionQuery, count_transactions,
    create_transaction, create_transaction_table, get_transactions_in_range, month_date_range,
    parse_amount, parse_date, query_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use transactions_page::get_transactions_page;
pub(crate) use view::transactions_table;
