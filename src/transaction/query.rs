//! Filtered transaction queries for the dashboard page and CSV export.

use rusqlite::{Connection, ToSql, params_from_iter};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, UserID,
    category::CategoryId,
    transaction::{TransactionId, TransactionKind},
};

/// The date format used in filter query parameters, e.g. "2026-01-31".
const FILTER_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The raw filter values taken from the URL query string.
///
/// All fields are optional and arrive as strings. Use
/// [FilterParams::to_filter] to turn them into a validated
/// [TransactionFilter]. The struct also serialises back into a query string
/// so the export link can carry the current filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// The inclusive start of the date range, formatted "YYYY-MM-DD".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// The inclusive end of the date range, formatted "YYYY-MM-DD".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Case-insensitive substring to match against descriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    /// The ID of the category to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl FilterParams {
    /// Convert the raw query parameters into a [TransactionFilter] for `user_id`.
    ///
    /// Values that do not parse are dropped rather than reported: a malformed
    /// date or category ID behaves as if the parameter was absent. The date
    /// range only applies when both bounds are present and valid.
    pub fn to_filter(&self, user_id: UserID) -> TransactionFilter {
        let start_date = parse_filter_date(self.start_date.as_deref());
        let end_date = parse_filter_date(self.end_date.as_deref());
        let date_range = match (start_date, end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };

        let search = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(str::to_owned);

        let category_id = self
            .category
            .as_deref()
            .and_then(|raw_id| raw_id.trim().parse::<CategoryId>().ok());

        TransactionFilter {
            user_id,
            date_range,
            search,
            category_id,
        }
    }
}

fn parse_filter_date(raw_date: Option<&str>) -> Option<Date> {
    let raw_date = raw_date?.trim();

    match Date::parse(raw_date, FILTER_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(error) => {
            tracing::debug!("Ignoring malformed filter date {raw_date:?}: {error}");
            None
        }
    }
}

/// The validated criteria for listing a user's transactions.
///
/// The owner scope is always applied. The other criteria are optional and
/// combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    /// The user whose transactions should be listed.
    pub user_id: UserID,
    /// Inclusive date range, applied only when both bounds are set.
    pub date_range: Option<(Date, Date)>,
    /// Case-insensitive substring to match against descriptions.
    pub search: Option<String>,
    /// Only include transactions with this category.
    pub category_id: Option<CategoryId>,
}

impl TransactionFilter {
    /// A filter that matches all of `user_id`'s transactions.
    pub fn for_user(user_id: UserID) -> Self {
        Self {
            user_id,
            date_range: None,
            search: None,
            category_id: None,
        }
    }
}

/// A transaction row for display, with the category name joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money that moved.
    pub amount: f64,
    /// Whether the money came in or went out.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the category the transaction belongs to, if any.
    pub category_id: Option<CategoryId>,
    /// The name of the category the transaction belongs to, if any.
    pub category_name: Option<String>,
}

/// Get the transactions matching `filter`, most recent first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    let mut conditions = vec!["\"transaction\".user_id = ?".to_string()];
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(filter.user_id.as_i64())];

    if let Some((start, end)) = filter.date_range {
        conditions.push("\"transaction\".date BETWEEN ? AND ?".to_string());
        params.push(Box::new(start));
        params.push(Box::new(end));
    }

    if let Some(search) = &filter.search {
        // instr is used instead of LIKE so that '%' and '_' in the search
        // string match literally.
        conditions.push("instr(lower(\"transaction\".description), ?) > 0".to_string());
        params.push(Box::new(search.to_lowercase()));
    }

    if let Some(category_id) = filter.category_id {
        conditions.push("\"transaction\".category_id = ?".to_string());
        params.push(Box::new(category_id));
    }

    // Sort by date, and then ID to keep transaction order stable after updates
    let query = format!(
        "SELECT \"transaction\".id, amount, kind, date, description, category.id, category.name \
        FROM \"transaction\" \
        LEFT JOIN category ON \"transaction\".category_id = category.id \
        WHERE {} \
        ORDER BY date DESC, \"transaction\".id ASC",
        conditions.join(" AND ")
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params.iter().map(|param| param.as_ref())), |row| {
            Ok(TransactionRow {
                id: row.get(0)?,
                amount: row.get(1)?,
                kind: row.get(2)?,
                date: row.get(3)?,
                description: row.get(4)?,
                category_id: row.get(5)?,
                category_name: row.get(6)?,
            })
        })?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}
