//! The navigation bar shown at the top of every page, and at the bottom on small screens.

use maud::{Markup, html};

use crate::endpoints;

/// A link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_desktop_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }

    fn into_mobile_html(self) -> Markup {
        let style = if self.is_current {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            bg-blue-50 px-2 py-2 text-xs font-semibold leading-tight \
            text-blue-700 shadow-sm dark:bg-blue-900/30 dark:text-blue-200"
        } else {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            px-2 py-2 text-xs font-semibold leading-tight text-gray-600 \
            hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300 \
            dark:hover:bg-blue-900/20 dark:hover:text-blue-200"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                span class="truncate" { (self.title) }
            }
        )
    }
}

/// The section of the app that `endpoint` belongs to.
///
/// Sub-pages such as the edit transaction page highlight their parent link.
fn section_of(endpoint: &str) -> &str {
    match endpoint {
        endpoints::NEW_TRANSACTION_VIEW | endpoints::EDIT_TRANSACTION_VIEW => {
            endpoints::TRANSACTIONS_VIEW
        }
        endpoints::MONTHLY_REPORT_VIEW => endpoints::REPORTS_VIEW,
        endpoints::CONVERT_VIEW => endpoints::EXCHANGE_RATES_VIEW,
        other => other,
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, or `active_endpoint` is one of
    /// that link's sub-pages, then that link will be marked as active and
    /// displayed differently in the HTML.
    pub fn new(active_endpoint: &str) -> NavBar<'static> {
        let section = section_of(active_endpoint);
        let links = [
            (endpoints::DASHBOARD_VIEW, "Dashboard"),
            (endpoints::TRANSACTIONS_VIEW, "Transactions"),
            (endpoints::ACCOUNTS_VIEW, "Accounts"),
            (endpoints::EXCHANGE_RATES_VIEW, "Rates"),
            (endpoints::REPORTS_VIEW, "Reports"),
        ]
        .into_iter()
        .map(|(url, title)| Link {
            url,
            title,
            is_current: section == url,
        })
        .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        let links = self.links;

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900 print:hidden"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Ledgerly"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in links.iter().cloned() {
                                li { (link.into_desktop_html()) }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden print:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    div
                        class="rounded-xl border border-gray-200 bg-white/95
                        shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul
                            class="grid grid-cols-5 gap-1 px-2 py-3"
                            aria-label="Primary"
                        {
                            @for link in links {
                                li class="min-w-0" { (link.into_mobile_html()) }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use std::collections::HashMap;

    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn set_active_endpoint() {
        let mut cases = HashMap::new();
        cases.insert(endpoints::DASHBOARD_VIEW, Some(endpoints::DASHBOARD_VIEW));
        cases.insert(endpoints::TRANSACTIONS_VIEW, Some(endpoints::TRANSACTIONS_VIEW));
        cases.insert(endpoints::NEW_TRANSACTION_VIEW, Some(endpoints::TRANSACTIONS_VIEW));
        cases.insert(endpoints::EDIT_TRANSACTION_VIEW, Some(endpoints::TRANSACTIONS_VIEW));
        cases.insert(endpoints::ACCOUNTS_VIEW, Some(endpoints::ACCOUNTS_VIEW));
        cases.insert(endpoints::EXCHANGE_RATES_VIEW, Some(endpoints::EXCHANGE_RATES_VIEW));
        cases.insert(endpoints::REPORTS_VIEW, Some(endpoints::REPORTS_VIEW));
        cases.insert(endpoints::MONTHLY_REPORT_VIEW, Some(endpoints::REPORTS_VIEW));

        cases.insert(endpoints::ROOT, None);
        cases.insert(endpoints::INTERNAL_ERROR_VIEW, None);
        cases.insert(endpoints::TRANSACTIONS_API, None);
        cases.insert(endpoints::ACCOUNTS_API, None);

        for (endpoint, active_link) in cases {
            let nav_bar = NavBar::new(endpoint);

            assert_active_link(nav_bar, endpoint, active_link);
        }
    }

    #[track_caller]
    fn assert_active_link(nav_bar: NavBar<'_>, endpoint: &str, active_link: Option<&str>) {
        for link in nav_bar.links {
            let want_current = active_link == Some(link.url);
            assert_eq!(
                link.is_current, want_current,
                "on {endpoint}, link {} should have is_current = {want_current}",
                link.url
            );
        }
    }

    #[test]
    fn renders_desktop_and_mobile_links() {
        let html = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html().into_string();
        let document = Html::parse_fragment(&html);

        let links = document
            .select(&Selector::parse("nav a[href]").unwrap())
            .filter(|link| link.value().attr("href") != Some(endpoints::ROOT))
            .count();
        assert_eq!(links, 10, "want five links in each of the two nav bars");

        let current: Vec<_> = document
            .select(&Selector::parse("a[aria-current='page']").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(current, vec![endpoints::ACCOUNTS_VIEW, endpoints::ACCOUNTS_VIEW]);
    }
}
