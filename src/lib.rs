//! FinTrack is a web app for recording your income and expenses and keeping
//! an eye on where the money goes.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod export;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod password;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_id};

use crate::{
    alert::render_alert_error, category::CategoryId,
    internal_server_error::render_internal_server_error, not_found::get_404_not_found_response,
};

/// Wait for ctrl+c or SIGTERM, then ask the server behind `handle` to shut
/// down gracefully.
///
/// Spawn this alongside the server so in-flight requests get a second to
/// finish before the process exits.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("could not install the ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("could not install the SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal_name = tokio::select! {
        _ = ctrl_c => "ctrl+c",
        _ = terminate => "terminate",
    };

    tracing::debug!("Received the {signal_name} signal, shutting down.");
    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password pair did not match a user account.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// The request carried no auth cookie.
    #[error("no auth cookie in the request")]
    CookieMissing,

    /// A cookie expiry date time could not be computed or formatted.
    ///
    /// Carries the underlying error as a string along with the offending
    /// date string.
    #[error("could not create cookie expiry date-time \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The hashing library failed for a reason other than a wrong password.
    ///
    /// Log the error string on the server, never send it to the client.
    /// Clients should only see a generic internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address used to register is already taken by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The category ID used to create or edit a transaction did not match one
    /// of the user's categories.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A string longer than the maximum allowed length was used to create a
    /// category name.
    #[error("Category name must be at most {0} characters long")]
    CategoryNameTooLong(usize),

    /// A zero or negative amount was used to create or edit a transaction.
    ///
    /// Transactions record how much money moved, the direction is recorded
    /// separately as income or expense.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// The requested resource was not found.
    ///
    /// Raised when a query returns no rows, including queries for rows that
    /// exist but belong to another user. Reporting both cases the same way
    /// keeps resource IDs from leaking across accounts.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A SQL error with no more specific variant above.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The configured timezone string is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A struct could not be serialized as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An error occurred while writing rows to a CSV file.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// The mutex around the database connection was poisoned.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that is not in the database.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that is not in the database.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Extended code 2067 is a failed UNIQUE constraint.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

// Full page error responses for page handlers. Form endpoints use
// `into_alert_response` instead so the error lands in the alert container.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => render_internal_server_error(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                ),
            ),
            Error::DatabaseLockError => render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs",
            ),
            // Everything else stays server-side, the client gets a generic page.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs",
                )
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => render_alert_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                ),
            ),
            Error::InvalidAmount(amount) => render_alert_error(
                StatusCode::BAD_REQUEST,
                "Invalid amount",
                &format!("{amount} is not a valid amount. Enter an amount greater than zero."),
            ),
            Error::InvalidCategory(category_id) => render_alert_error(
                StatusCode::BAD_REQUEST,
                "Invalid category ID",
                &format!("Could not find a category with the ID {category_id:?}"),
            ),
            Error::EmptyCategoryName => render_alert_error(
                StatusCode::BAD_REQUEST,
                "Invalid category name",
                "Category names cannot be empty.",
            ),
            Error::CategoryNameTooLong(max_length) => render_alert_error(
                StatusCode::BAD_REQUEST,
                "Invalid category name",
                &format!("Category names must be at most {max_length} characters long."),
            ),
            Error::UpdateMissingTransaction => render_alert_error(
                StatusCode::NOT_FOUND,
                "Could not update transaction",
                "The transaction could not be found.",
            ),
            Error::DeleteMissingTransaction => render_alert_error(
                StatusCode::NOT_FOUND,
                "Could not delete transaction",
                "The transaction could not be found. \
                Try refreshing the page to see if the transaction has already been deleted.",
            ),
            _ => render_alert_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.",
            ),
        }
    }
}
