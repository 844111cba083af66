//! The route paths used across the app.
//!
//! Paths with a `{transaction_id}` placeholder are turned into concrete URLs
//! with [format_endpoint].

/// The dashboard, shown to logged in users.
pub const ROOT: &str = "/";
/// Form for recording a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// Form for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// Applies an edit to an existing transaction.
pub const UPDATE_TRANSACTION: &str = "/transactions/{transaction_id}";
/// Deletes a transaction. Accepts POST only.
pub const DELETE_TRANSACTION: &str = "/transactions/{transaction_id}/delete";
/// Form for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// Downloads the filtered transactions as a CSV file.
pub const EXPORT: &str = "/export";
/// The log in page (GET) and log in submissions (POST).
pub const LOG_IN_VIEW: &str = "/log_in";
/// Ends the current session.
pub const LOG_OUT: &str = "/log_out";
/// The registration page (GET) and registration submissions (POST).
pub const REGISTER_VIEW: &str = "/register";
/// The page shown after an internal server error.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// Static assets.
pub const STATIC: &str = "/static";
/// Serves coffee (experimental).
pub const COFFEE: &str = "/coffee";

/// Substitute `id` for the `{...}` placeholder in `endpoint_path`.
///
/// Paths are assumed to contain at most one placeholder. A path without one
/// is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(open) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let close = endpoint_path[open..]
        .find('}')
        .map(|offset| open + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{id}{}",
        &endpoint_path[..open],
        &endpoint_path[close..]
    )
}
