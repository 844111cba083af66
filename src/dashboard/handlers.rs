//! Dashboard HTTP handlers and view rendering.
//!
//! The dashboard is the root page for logged in users. It lists the user's
//! transactions, most recent first, along with filter controls, income and
//! expense totals, charts and a CSV export link. The filter form submits as a
//! GET request so the current filter lives in the URL and survives reloads.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    category::{Category, get_all_categories},
    dashboard::{
        aggregation::{
            UNCATEGORIZED_LABEL, expense_breakdown, monthly_summaries, total_expense, total_income,
        },
        charts::{DashboardChart, charts_script, expense_breakdown_chart, monthly_summary_chart},
    },
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, link,
    },
    navigation::NavBar,
    transaction::{FilterParams, TransactionRow, get_transactions},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with an overview of the user's transactions.
///
/// The query string carries the filter. Malformed filter values are ignored
/// rather than rejected, so a hand-edited URL still renders the page.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<FilterParams>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let filter = params.to_filter(user_id);
    let rows = get_transactions(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let available_categories = get_all_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    Ok(dashboard_view(&params, &available_categories, &rows).into_response())
}

/// Builds the export URL, carrying the current filter in the query string.
fn export_url(params: &FilterParams) -> String {
    match serde_urlencoded::to_string(params) {
        Ok(query) if !query.is_empty() => format!("{}?{}", endpoints::EXPORT, query),
        Ok(_) => endpoints::EXPORT.to_owned(),
        Err(error) => {
            tracing::error!("could not serialise filter params: {error}");
            endpoints::EXPORT.to_owned()
        }
    }
}

fn dashboard_view(
    params: &FilterParams,
    available_categories: &[Category],
    rows: &[TransactionRow],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();
    let income = total_income(rows);
    let expense = total_expense(rows);

    let charts = if rows.is_empty() {
        vec![]
    } else {
        vec![
            DashboardChart {
                id: "monthly-summary-chart",
                options: monthly_summary_chart(&monthly_summaries(rows)).to_string(),
            },
            DashboardChart {
                id: "expenses-chart",
                options: expense_breakdown_chart(&expense_breakdown(rows)).to_string(),
            },
        ]
    };

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                (filter_form(params, available_categories))

                section id="totals" class="grid grid-cols-2 gap-4 mb-4"
                {
                    div class="p-4 rounded-lg bg-white dark:bg-gray-800"
                    {
                        p class="text-sm text-gray-600 dark:text-gray-400" { "Total Income" }
                        p id="total-income" class="text-2xl font-bold" { (format_currency(income)) }
                    }

                    div class="p-4 rounded-lg bg-white dark:bg-gray-800"
                    {
                        p class="text-sm text-gray-600 dark:text-gray-400" { "Total Expenses" }
                        p id="total-expense" class="text-2xl font-bold" { (format_currency(expense)) }
                    }
                }

                @if !charts.is_empty() {
                    section id="charts" class="w-full mx-auto mb-4"
                    {
                        div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                        {
                            @for chart in &charts {
                                div
                                    id=(chart.id)
                                    class="min-h-[380px] rounded dark:bg-gray-100"
                                {}
                            }
                        }
                    }
                }

                (transactions_table(rows))

                div class="mt-4"
                {
                    (link(&export_url(params), "Export as CSV"))
                }
            }
        }
    );

    let scripts = if charts.is_empty() {
        vec![]
    } else {
        vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            charts_script(&charts),
        ]
    };

    base("Dashboard", &scripts, &content)
}

/// Renders the filter controls as a GET form so the filter is bookmarkable.
fn filter_form(params: &FilterParams, available_categories: &[Category]) -> Markup {
    html!(
        form
            method="get"
            action=(endpoints::ROOT)
            class="grid grid-cols-2 lg:grid-cols-5 gap-4 items-end mb-4 \
                bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    name="start_date"
                    id="start_date"
                    value=[params.start_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    name="end_date"
                    id="end_date"
                    value=[params.end_date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="q" class=(FORM_LABEL_STYLE) { "Search" }
                input
                    type="text"
                    name="q"
                    id="q"
                    placeholder="Search descriptions"
                    value=[params.q.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }

                    @for category in available_categories {
                        @if params.category.as_deref() == Some(&category.id.to_string()) {
                            option value=(category.id) selected { (category.name) }
                        } @else {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }
            }

            div class="flex gap-4 items-center"
            {
                button
                    type="submit"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600 \
                        hover:dark:bg-blue-700 text-white rounded"
                {
                    "Apply"
                }

                a href=(endpoints::ROOT) class=(LINK_STYLE) { "Clear" }
            }
        }
    )
}

fn transactions_table(rows: &[TransactionRow]) -> Markup {
    html!(
        div class="relative overflow-x-auto shadow-md rounded-lg"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @if rows.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) colspan="6"
                            {
                                "No transactions found. Try clearing the filters or "
                                (link(endpoints::NEW_TRANSACTION_VIEW, "add a transaction"))
                                "."
                            }
                        }
                    }

                    @for row in rows {
                        (transaction_table_row(row))
                    }
                }
            }
        }
    )
}

fn transaction_table_row(row: &TransactionRow) -> Markup {
    let category_label = row.category_name.as_deref().unwrap_or(UNCATEGORIZED_LABEL);
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, row.id);
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, row.id);

    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (row.date) }
            td class=(TABLE_CELL_STYLE) { (row.kind.display_name()) }
            td class=(TABLE_CELL_STYLE) { (format_currency(row.amount)) }
            td class=(TABLE_CELL_STYLE) { (category_label) }
            td class=(TABLE_CELL_STYLE) { (row.description) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (link(&edit_url, "Edit"))

                    button
                        hx-post=(delete_url)
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    )
}
