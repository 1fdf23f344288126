//! The form fields shared by the new and edit transaction pages, and the
//! form data they submit.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::Account,
    currency::Currency,
    database_id::AccountId,
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, currency_select,
    },
    transaction::core::{
        Direction, EXPENSE_CATEGORIES, INCOME_CATEGORIES, TransactionBuilder, parse_amount,
        parse_date,
    },
};

/// The raw form data for creating or editing a transaction.
///
/// Fields are kept as strings so that bad input can be reported with an alert
/// instead of being rejected by the extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// The amount of money, zero or more.
    pub amount: String,
    /// The ISO code of the currency.
    pub currency: String,
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub direction: String,
    /// What the money was for.
    pub category: String,
    /// The date in `YYYY-MM-DD` format.
    pub date: String,
    /// The account to add the transaction to, the oldest account if empty.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Free text notes.
    #[serde(default)]
    pub note: Option<String>,
}

impl TransactionForm {
    /// Validate the form and convert it into a [TransactionBuilder].
    ///
    /// # Errors
    /// Returns the first validation error found, e.g. [Error::InvalidAmount]
    /// for a non-numeric amount or [Error::UnsupportedCurrency] for an unknown
    /// currency code.
    pub fn validate(&self) -> Result<TransactionBuilder, Error> {
        let amount = parse_amount(&self.amount)?;
        let currency: Currency = self.currency.parse()?;
        let direction: Direction = self.direction.parse()?;
        let date = parse_date(&self.date)?;

        let mut builder = TransactionBuilder::new(amount, currency, &self.category, direction, date)?
            .note(self.note.as_deref().unwrap_or_default());

        if let Some(account_id) = self.account_id {
            builder = builder.account_id(account_id);
        }

        Ok(builder)
    }
}

/// The values the transaction form fields start with.
pub struct TransactionFormDefaults<'a> {
    pub direction: Direction,
    pub amount: Option<f64>,
    pub currency: Currency,
    pub category: Option<&'a str>,
    pub date: Date,
    pub account_id: Option<AccountId>,
    pub note: Option<&'a str>,
}

/// Suggested categories for the category input, expenses first.
fn category_suggestions() -> Vec<&'static str> {
    let mut suggestions = EXPENSE_CATEGORIES.to_vec();

    for category in INCOME_CATEGORIES {
        if !suggestions.contains(&category) {
            suggestions.push(category);
        }
    }

    suggestions
}

fn direction_radio(direction: Direction, label: &str, checked: bool) -> Markup {
    let id = format!("transaction-type-{direction}");

    html! {
        div class="flex flex-1 items-center"
        {
            input
                name="type"
                id=(id)
                type="radio"
                value=(direction)
                checked[checked]
                required
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (label) }
        }
    }
}

/// Render the inputs of the transaction form, without the enclosing `form` element.
pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    accounts: &[Account],
) -> Markup {
    let is_expense = defaults.direction == Direction::Expense;
    let amount = defaults.amount.map(|amount| format!("{amount:.2}"));
    let selected_account = defaults
        .account_id
        .or_else(|| accounts.first().map(|account| account.id));

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                (direction_radio(Direction::Expense, "Expense", is_expense))
                (direction_radio(Direction::Income, "Income", !is_expense))
            }
        }

        div class="grid grid-cols-3 gap-2"
        {
            div class="col-span-2"
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    required
                    autofocus
                    value=[amount.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                (currency_select("currency", defaults.currency))
            }
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            input
                name="category"
                id="category"
                type="text"
                list="category-suggestions"
                placeholder="e.g. Groceries"
                required
                value=[defaults.category]
                class=(FORM_TEXT_INPUT_STYLE);

            datalist id="category-suggestions"
            {
                @for category in category_suggestions() {
                    option value=(category) {}
                }
            }
        }

        @if !accounts.is_empty() {
            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                select
                    name="account_id"
                    id="account_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[Some(account.id) == selected_account]
                        {
                            (account.name) " (" (account.currency) ")"
                        }
                    }
                }
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="note" class=(FORM_LABEL_STYLE) { "Note" }

            input
                name="note"
                id="note"
                type="text"
                placeholder="Optional"
                value=[defaults.note]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        Error,
        account::Account,
        currency::Currency,
        transaction::core::{Direction, TransactionBuilder},
    };

    use super::{TransactionForm, TransactionFormDefaults, transaction_form_fields};

    fn form(amount: &str, currency: &str) -> TransactionForm {
        TransactionForm {
            amount: amount.to_owned(),
            currency: currency.to_owned(),
            direction: "expense".to_owned(),
            category: "Food".to_owned(),
            date: "2025-06-01".to_owned(),
            account_id: None,
            note: None,
        }
    }

    #[test]
    fn validates_form() {
        let want = TransactionBuilder::new(
            12.5,
            Currency::JPY,
            "Food",
            Direction::Expense,
            date!(2025 - 06 - 01),
        )
        .unwrap();

        assert_eq!(form("12.5", "jpy").validate(), Ok(want));
    }

    #[test]
    fn reports_invalid_fields() {
        assert_eq!(
            form("twelve", "USD").validate(),
            Err(Error::InvalidAmount("twelve".to_owned()))
        );
        assert_eq!(
            form("-5", "USD").validate(),
            Err(Error::NegativeAmount(-5.0))
        );
        assert_eq!(
            form("5", "DOGE").validate(),
            Err(Error::UnsupportedCurrency("DOGE".to_owned()))
        );

        let mut bad_type = form("5", "USD");
        bad_type.direction = "refund".to_owned();
        assert_eq!(
            bad_type.validate(),
            Err(Error::InvalidDirection("refund".to_owned()))
        );

        let mut bad_date = form("5", "USD");
        bad_date.date = "yesterday".to_owned();
        assert_eq!(
            bad_date.validate(),
            Err(Error::InvalidDate("yesterday".to_owned()))
        );
    }

    #[test]
    fn parses_form_body_with_empty_account() {
        let body = "amount=3.20&currency=USD&type=income&category=Gift&date=2025-01-02&account_id=&note=";

        let form: TransactionForm = serde_html_form::from_str(body).unwrap();

        assert_eq!(form.account_id, None);
        assert_eq!(form.direction, "income");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn fields_select_defaults() {
        let accounts = [
            Account {
                id: 1,
                name: "Main".to_owned(),
                currency: Currency::CNY,
            },
            Account {
                id: 2,
                name: "Travel".to_owned(),
                currency: Currency::EUR,
            },
        ];
        let fields = transaction_form_fields(
            &TransactionFormDefaults {
                direction: Direction::Income,
                amount: Some(4.0),
                currency: Currency::EUR,
                category: Some("Salary"),
                date: date!(2025 - 05 - 05),
                account_id: Some(2),
                note: None,
            },
            &accounts,
        );
        let html = Html::parse_fragment(&maud::html! { form { (fields) } }.into_string());

        let checked = html
            .select(&Selector::parse("input[name=type][checked]").unwrap())
            .next()
            .and_then(|input| input.value().attr("value"));
        assert_eq!(checked, Some("income"));

        let account = html
            .select(&Selector::parse("select[name=account_id] option[selected]").unwrap())
            .next()
            .and_then(|option| option.value().attr("value"));
        assert_eq!(account, Some("2"));

        let amount = html
            .select(&Selector::parse("input[name=amount]").unwrap())
            .next()
            .and_then(|input| input.value().attr("value"));
        assert_eq!(amount, Some("4.00"));

        let suggestions = html
            .select(&Selector::parse("datalist option[value=Other]").unwrap())
            .count();
        assert_eq!(suggestions, 1);
    }
}
