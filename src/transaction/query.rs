//! Query string filters for listing transactions.

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    Error,
    database_id::AccountId,
    transaction::core::{TransactionQuery, month_date_range},
};

/// The filters accepted by the transactions page and the transactions API.
///
/// A month without a year is ignored. A year without a month selects the
/// whole year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilters {
    /// Only show transactions in this account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    /// Only show transactions in this year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Only show transactions in this month of `year`, 1-12.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    /// The maximum number of transactions to show.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl TransactionFilters {
    /// Convert the filters into a database query.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `month` is not between 1 and 12, or
    /// [Error::InvalidDate] if `year` is out of range.
    pub fn to_query(self) -> Result<TransactionQuery, Error> {
        let (start_date, end_date) = match (self.year, self.month) {
            (Some(year), Some(month)) => {
                let (start, end) = month_date_range(year, month)?;
                (Some(start), Some(end))
            }
            (Some(year), None) => {
                let invalid_year = |_| Error::InvalidDate(year.to_string());
                let start = Date::from_calendar_date(year, Month::January, 1)
                    .map_err(invalid_year)?;
                let end = Date::from_calendar_date(year, Month::December, 31)
                    .map_err(invalid_year)?;
                (Some(start), Some(end))
            }
            (None, _) => (None, None),
        };

        Ok(TransactionQuery {
            account_id: self.account_id,
            start_date,
            end_date,
            limit: self.limit,
        })
    }

    /// The URL for `route` with these filters as the query string.
    pub fn to_url(self, route: &str) -> String {
        match serde_urlencoded::to_string(self) {
            Ok(query) if !query.is_empty() => format!("{route}?{query}"),
            Ok(_) => route.to_owned(),
            Err(error) => {
                tracing::error!("could not encode transaction filters {self:?}: {error}");
                route.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Error, transaction::core::TransactionQuery};

    use super::TransactionFilters;

    #[test]
    fn year_and_month_select_month() {
        let filters = TransactionFilters {
            year: Some(2025),
            month: Some(2),
            ..Default::default()
        };

        assert_eq!(
            filters.to_query(),
            Ok(TransactionQuery {
                start_date: Some(date!(2025 - 02 - 01)),
                end_date: Some(date!(2025 - 02 - 28)),
                ..Default::default()
            })
        );
    }

    #[test]
    fn year_alone_selects_year() {
        let filters = TransactionFilters {
            year: Some(2024),
            limit: Some(5),
            account_id: Some(2),
            ..Default::default()
        };

        assert_eq!(
            filters.to_query(),
            Ok(TransactionQuery {
                account_id: Some(2),
                start_date: Some(date!(2024 - 01 - 01)),
                end_date: Some(date!(2024 - 12 - 31)),
                limit: Some(5),
            })
        );
    }

    #[test]
    fn month_without_year_is_ignored() {
        let filters = TransactionFilters {
            month: Some(4),
            ..Default::default()
        };

        assert_eq!(filters.to_query(), Ok(TransactionQuery::default()));
    }

    #[test]
    fn invalid_month_is_an_error() {
        let filters = TransactionFilters {
            year: Some(2025),
            month: Some(13),
            ..Default::default()
        };

        assert_eq!(filters.to_query(), Err(Error::InvalidMonth(13)));
    }

    #[test]
    fn url_only_has_set_filters() {
        let filters = TransactionFilters {
            year: Some(2025),
            limit: Some(200),
            ..Default::default()
        };

        assert_eq!(
            filters.to_url("/transactions"),
            "/transactions?year=2025&limit=200"
        );
        assert_eq!(
            TransactionFilters::default().to_url("/transactions"),
            "/transactions"
        );
    }
}
