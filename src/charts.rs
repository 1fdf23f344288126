//! Chart generation and rendering for the dashboard and reports.
//!
//! Charts are built with `charming` and rendered as ECharts options in an
//! inline script, alongside an empty container element for each chart.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title, VisualMap, VisualMapPiece},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Line, Pie},
};
use maud::{Markup, PreEscaped, html};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    currency::Currency,
    html::{ECHARTS_CDN, HeadElement},
};

/// A chart with its HTML container ID and ECharts configuration.
pub struct PageChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl PageChart {
    /// Serialize `chart` for embedding in an inline script.
    ///
    /// `<` only occurs inside string values such as category names, so it is
    /// written as `\u003c` to stop user text from closing the script element.
    pub fn new(id: &'static str, chart: Chart) -> Self {
        Self {
            id,
            options: chart.to_string().replace('<', "\\u003c"),
        }
    }
}

/// Renders a grid of empty containers that the charts are drawn into.
pub fn charts_view(charts: &[PageChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100 break-inside-avoid"
                    {}
                }
            }
        }
    )
}

/// The head elements that load ECharts and draw `charts` once the page has loaded.
///
/// Each chart follows the browser's dark mode setting and resizes with the window.
pub fn charts_head_elements(charts: &[PageChart]) -> Vec<HeadElement> {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);
                    window.addEventListener('beforeprint', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    );

    vec![
        HeadElement::ScriptLink(ECHARTS_CDN.to_owned()),
        HeadElement::ScriptSource(PreEscaped(wrapped_script)),
    ]
}

const MONTH_LABEL_FORMAT: &[BorrowedFormatItem] = format_description!("[month repr:short] [year]");

/// Formats the first day of each month as a short label, e.g. "Mar 2025".
pub fn format_month_labels(months: &[Date]) -> Vec<String> {
    months
        .iter()
        .map(|month| {
            month
                .format(MONTH_LABEL_FORMAT)
                .unwrap_or_else(|_| month.to_string())
        })
        .collect()
}

/// A line chart of net income per month.
pub fn net_income_chart(labels: Vec<String>, values: Vec<f64>, currency: Currency) -> Chart {
    Chart::new()
        .title(
            Title::new()
                .text("Net income")
                .subtext(format!("Last twelve months, in {currency}")),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter(currency))
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency))),
        )
        .visual_map(VisualMap::new().show(false).pieces(vec![
            VisualMapPiece::new().lte(-1).color("red"),
            VisualMapPiece::new().gte(0).color("green"),
        ]))
        .series(Line::new().name("Net Income").data(values))
}

/// A pie chart of totals per category.
///
/// `totals` are `(category, amount)` pairs in `currency`.
pub fn category_pie_chart(
    title: &str,
    subtitle: &str,
    totals: &[(String, f64)],
    currency: Currency,
) -> Chart {
    let data: Vec<(f64, String)> = totals
        .iter()
        .map(|(category, total)| (*total, category.clone()))
        .collect();

    Chart::new()
        .title(Title::new().text(title).subtext(subtitle))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter(currency)),
        )
        .legend(Legend::new().bottom("0"))
        .series(Pie::new().name(title).radius("60%").data(data))
}

fn currency_formatter(currency: Currency) -> JsFunction {
    JsFunction::new_with_args(
        "number",
        &format!(
            "const currencyFormatter = new Intl.NumberFormat('en-US', {{
                  style: 'currency',
                  currency: '{}'
                }});
                return (number) ? currencyFormatter.format(number) : \"-\";",
            currency.code()
        ),
    )
}
