//! The transactions table, shared by the transactions page and the dashboard.

use std::collections::HashMap;

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    account::Account,
    database_id::AccountId,
    endpoints::{self, format_endpoint},
    html::{
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, edit_delete_action_links,
        format_money,
    },
    transaction::core::{Direction, Transaction},
};

/// The max number of graphemes to display in the note column before
/// truncating and displaying ellipses.
const MAX_NOTE_GRAPHEMES: usize = 32;

fn amount_class(direction: Direction) -> &'static str {
    match direction {
        Direction::Expense => "text-red-700 dark:text-red-300",
        Direction::Income => "text-green-700 dark:text-green-300",
    }
}

/// Shorten `note` for display, also returning the full note for a tooltip if
/// it was shortened.
pub(crate) fn format_note(note: &str) -> (String, Option<&str>) {
    let note_length = note.graphemes(true).count();

    if note_length <= MAX_NOTE_GRAPHEMES {
        (note.to_owned(), None)
    } else {
        let truncated: String = note.graphemes(true).take(MAX_NOTE_GRAPHEMES - 3).collect();
        (truncated + "...", Some(note))
    }
}

fn transaction_row(transaction: &Transaction, account_name: &str) -> Markup {
    let (note, tooltip) = format_note(&transaction.note);
    let confirm_message = format!(
        "Are you sure you want to delete the {} of {} on {}? This cannot be undone.",
        transaction.direction,
        format_money(transaction.amount, transaction.currency),
        transaction.date
    );
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class=(TABLE_CELL_STYLE) { time datetime=(transaction.date) { (transaction.date) } }
            td class=(TABLE_CELL_STYLE) { (transaction.category) }
            td class={ "px-6 py-4 text-right tabular-nums " (amount_class(transaction.direction)) }
            {
                (format_money(transaction.signed_amount(), transaction.currency))
            }
            td class=(TABLE_CELL_STYLE) { (account_name) }
            td class=(TABLE_CELL_STYLE) title=[tooltip] { (note) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        Some(&edit_url),
                        &delete_url,
                        &confirm_message,
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    }
}

/// A table of `transactions` in the order given.
///
/// `accounts` is used to look up account names.
pub(crate) fn transactions_table(
    transactions: &[Transaction],
    accounts: &HashMap<AccountId, Account>,
) -> Markup {
    html! {
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class="px-6 py-3 text-right" { "Amount" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for transaction in transactions {
                    (transaction_row(
                        transaction,
                        accounts
                            .get(&transaction.account_id)
                            .map(|account| account.name.as_str())
                            .unwrap_or("Unknown"),
                    ))
                }

                @if transactions.is_empty() {
                    tr
                    {
                        td colspan="6" class="px-6 py-4 text-center"
                        {
                            "No transactions found."
                        }
                    }
                }
            }
        }
    }
}
