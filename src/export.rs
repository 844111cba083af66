//! CSV export of the filtered transactions.
//!
//! Serves the same rows the dashboard shows, in the same order, as a CSV
//! attachment. The filter arrives in the query string with the same
//! parameters as the dashboard so the export link can simply carry the
//! current URL query.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    transaction::{FilterParams, TransactionRow, get_transactions},
};

/// The header row written at the top of every export.
const CSV_HEADER: [&str; 5] = ["Date", "Type", "Amount", "Category", "Description"];

/// The file name suggested to the browser for the downloaded file.
const EXPORT_FILENAME: &str = "transactions.csv";

/// The state needed for the CSV export.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that serves the user's filtered transactions as a CSV
/// attachment.
///
/// The header row is always present, even when no transactions match.
pub async fn get_transactions_csv(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<FilterParams>,
) -> Result<Response, Error> {
    let rows = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions(&params.to_filter(user_id), &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let csv = write_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Writes `rows` as CSV, quoting per RFC 4180 where needed.
fn write_csv(rows: &[TransactionRow]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for row in rows {
        writer
            .write_record([
                &row.date.to_string(),
                row.kind.display_name(),
                &format!("{:.2}", row.amount),
                row.category_name.as_deref().unwrap_or(""),
                &row.description,
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}
