//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element of the base page.

use maud::{Markup, html};

/// An alert message with a short summary and longer details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The operation completed.
    #[allow(dead_code)]
    Success {
        /// Short summary shown in bold.
        message: String,
        /// Longer explanation shown below the summary.
        details: String,
    },
    /// The operation failed.
    Error {
        /// Short summary shown in bold.
        message: String,
        /// Longer explanation shown below the summary.
        details: String,
    },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (
                "text-green-800 border-green-300 bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "text-red-800 border-red-300 bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                message,
                details,
            ),
        };

        html! {
            div
                role="alert"
                class={"flex items-start justify-between gap-4 p-4 mb-4 text-sm border rounded-lg shadow " (container_style)}
            {
                div
                {
                    p class="font-semibold" { (message) }

                    @if !details.is_empty() {
                        p { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="font-bold"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let markup = Alert::Error {
            message: "Invalid input".to_owned(),
            details: "Category cannot be empty".to_owned(),
        }
        .into_html();

        let html = Html::parse_fragment(&markup.into_string());
        let paragraphs = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(paragraphs, vec!["Invalid input", "Category cannot be empty"]);
    }

    #[test]
    fn empty_details_are_omitted() {
        let markup = Alert::Success {
            message: "Saved".to_owned(),
            details: String::new(),
        }
        .into_html();

        let html = Html::parse_fragment(&markup.into_string());
        let count = html.select(&Selector::parse("p").unwrap()).count();

        assert_eq!(count, 1);
    }
}
