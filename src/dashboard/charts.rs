//! The ECharts bar charts shown on the dashboard.
//!
//! Two charts are built from the filtered transactions: per-month income and
//! expense totals, and expense totals grouped by category. Each chart is a
//! JSON options blob for the ECharts library plus a matching container div
//! and an init script in the page head.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::bar::Bar,
};
use maud::PreEscaped;

use crate::{
    dashboard::aggregation::{CategoryTotal, MonthlySummary, format_month_label},
    html::HeadElement,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Build the script that initializes every chart once the page has loaded.
///
/// Each chart gets an ECharts instance that resizes with the window and
/// follows the OS dark mode preference.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let init_blocks = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const container = document.getElementById("{id}");
                    const chart = echarts.init(container);
                    chart.setOption({options});

                    window.addEventListener('resize', chart.resize);

                    const darkModeQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const applyTheme = () =>
                        chart.setTheme(darkModeQuery.matches ? 'dark' : 'default');
                    darkModeQuery.addEventListener('change', applyTheme);
                    applyTheme();
                }})();"#,
                id = chart.id,
                options = chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    HeadElement::ScriptSource(PreEscaped(format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{init_blocks}\n}});"
    )))
}

/// Creates a bar chart of per-month income and expense totals.
pub(super) fn monthly_summary_chart(summaries: &[MonthlySummary]) -> Chart {
    let labels: Vec<String> = summaries
        .iter()
        .map(|summary| format_month_label(summary.month))
        .collect();
    let income: Vec<f64> = summaries.iter().map(|summary| summary.income).collect();
    let expenses: Vec<f64> = summaries.iter().map(|summary| summary.expense).collect();

    currency_bar_chart("Monthly Summary", labels)
        .legend(Legend::new().left(250).top("1%"))
        .series(Bar::new().name("Income").data(income))
        .series(Bar::new().name("Expenses").data(expenses))
}

/// Creates a bar chart of expense totals by category, largest first.
pub(super) fn expense_breakdown_chart(breakdown: &[CategoryTotal]) -> Chart {
    let labels: Vec<String> = breakdown.iter().map(|entry| entry.label.clone()).collect();
    let values: Vec<f64> = breakdown.iter().map(|entry| entry.total).collect();

    currency_bar_chart("Expenses by Category", labels)
        .series(Bar::new().name("Expenses").data(values))
}

// The scaffolding both charts share: title, tooltip, grid and currency axes.
fn currency_bar_chart(title: &str, labels: Vec<String>) -> Chart {
    Chart::new()
        .title(Title::new().text(title))
        .tooltip(currency_tooltip())
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
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
