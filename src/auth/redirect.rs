//! Builds the post-log-in redirect URLs used by the auth middleware.

use axum::{extract::Request, http::Uri};
use tracing::{error, warn};

use crate::endpoints;

/// Whether `target` is a same-site path worth redirecting back to.
///
/// Rejects protocol-relative URLs and the log-in page itself, which would
/// redirect the user in a loop.
fn is_redirectable_path(target: &str) -> bool {
    let starts_like_local_path = target.starts_with('/') && !target.starts_with("//");

    let path = target.split_once('?').map_or(target, |(path, _)| path);

    starts_like_local_path && path != endpoints::LOG_IN_VIEW
}

fn accept_path_and_query(uri: &Uri) -> Option<String> {
    let target = uri.path_and_query()?.as_str();

    is_redirectable_path(target).then(|| target.to_owned())
}

/// Parse `raw_url` and return its path and query if it is a safe, same-site
/// redirect target.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    accept_path_and_query(&uri)
}

/// Build the URL for the log-in page with a `redirect_url` query parameter
/// pointing back at the page the user was trying to reach.
///
/// For requests made by htmx the page the user is on comes from the
/// HX-Current-URL header, otherwise the request URI is used.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let target = if header_value(request, "hx-request")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    {
        hx_current_url_target(request)?
    } else {
        accept_path_and_query(request.uri())?
    };

    build_log_in_redirect_url_from_target(&target)
}

pub(super) fn build_log_in_redirect_url_from_target(target: &str) -> Option<String> {
    serde_urlencoded::to_string([("redirect_url", target)])
        .inspect_err(|err| error!("Could not encode redirect URL {target}: {err}"))
        .ok()
        .map(|param| format!("{}?{}", endpoints::LOG_IN_VIEW, param))
}

fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name)?.to_str().ok()
}

fn hx_current_url_target(request: &Request) -> Option<String> {
    let Some(current_url) = header_value(request, "hx-current-url") else {
        warn!("Missing HX-Current-URL header for htmx request.");
        return None;
    };

    // HX-Current-URL carries the full URL including scheme and host, so the
    // scheme check from normalize_redirect_url does not apply.
    let target = current_url
        .parse::<Uri>()
        .ok()
        .as_ref()
        .and_then(accept_path_and_query);

    if target.is_none() {
        warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    target
}
