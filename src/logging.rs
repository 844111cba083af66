//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{Method, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};

/// The maximum number of body bytes included in info-level log lines.
///
/// Longer bodies are truncated at the info level and logged in full at the
/// debug level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Form fields whose values must never appear in the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level. Password
/// fields in form bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();

    let is_form_post = parts.method == Method::POST
        && parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|content_type| content_type.to_str().ok())
            .is_some_and(|content_type| {
                content_type.starts_with("application/x-www-form-urlencoded")
            });

    if is_form_post {
        let mut display_text = body_text.clone();

        for field_name in REDACTED_FIELDS {
            display_text = redact_field(&display_text, field_name);
        }

        log_body("Received request", &format!("{parts:#?}"), &display_text);
    } else {
        log_body("Received request", &format!("{parts:#?}"), &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();

    log_body("Sending response", &format!("{parts:#?}"), &body_text);

    Response::from_parts(parts, body_text.into())
}

/// Replaces the value of `field_name` in a urlencoded form body with
/// asterisks.
fn redact_field(form_text: &str, field_name: &str) -> String {
    let start = match form_text.find(&format!("{field_name}=")) {
        Some(field_position) => field_position,
        None => return form_text.to_string(),
    };

    let end = match form_text[start..].find('&') {
        Some(end) => start + end,
        None => form_text.len(),
    };
    let field = &form_text[start..end];

    form_text.replace(field, &format!("{field_name}=********"))
}

fn log_body(prefix: &str, headers: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{prefix}: {headers}\nbody: {:}...",
            truncate_to_char_boundary(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{prefix}: {headers}\nbody: {body:?}");
    }
}

/// Truncate `body` to at most `limit` bytes without splitting a multibyte
/// character.
fn truncate_to_char_boundary(body: &str, limit: usize) -> &str {
    let mut end = limit.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}
