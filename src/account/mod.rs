//! Accounts hold transactions and report a balance in their own currency.

mod accounts_page;
mod api;
mod core;
mod create_endpoint;
mod delete_endpoint;

pub use accounts_page::get_accounts_page;
pub use api::list_accounts_endpoint;
pub use core::{
    Account, AccountBalance, create_account_table, get_account, get_account_balances,
    get_all_accounts, get_default_account_id, seed_default_account,
};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
