//! Toast style alerts for reporting form errors without a full page load.
//!
//! Alerts are rendered as out-of-band swaps so that htmx places them into the
//! fixed `#alert-container` element of the page layout no matter which element
//! triggered the request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// Render an error alert with a `title` and a longer `description`.
pub fn alert_error(title: &str, description: &str) -> Markup {
    html! {
        div hx-swap-oob="innerHTML:#alert-container" {
            div
                class="flex items-start gap-3 w-full p-4 rounded-lg shadow text-red-800 \
                    bg-red-50 dark:bg-gray-800 dark:text-red-400"
                role="alert"
            {
                div {
                    p class="font-semibold" { (title) }
                    p class="text-sm" { (description) }
                }

                button
                    type="button"
                    class="ms-auto text-red-500 hover:text-red-700 dark:hover:text-red-300"
                    aria-label="Close"
                    onclick="this.closest('[hx-swap-oob]').remove()"
                {
                    "✕"
                }
            }
        }
    }
}

/// Pair an error alert fragment with a `status` code as a response.
pub fn render_alert_error(status: StatusCode, title: &str, description: &str) -> Response {
    (status, alert_error(title, description)).into_response()
}
