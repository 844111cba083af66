//! The 404 not found page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Handler for requests that do not match any route.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Render the 404 not found page as a response.
pub fn get_404_not_found_response() -> Response {
    let page = error_view(
        "Not Found",
        "404",
        "Sorry, we can't find that page.",
        "Check the URL, or head back to the dashboard.",
    );

    (StatusCode::NOT_FOUND, page).into_response()
}
