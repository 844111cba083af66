//! Middleware guarding routes that require a logged in user.
//!
//! Both guards validate the private auth cookie, insert the owner's
//! [UserID](crate::UserID) into the request extensions and slide the cookie
//! expiry forward on the way out. They differ only in how they send an
//! unauthenticated client to the log in page: [auth_guard] uses a plain HTTP
//! redirect for full page loads, [auth_guard_hx] answers 200 OK with an
//! `HX-Redirect` header because htmx ignores the Location header on 3xx
//! responses.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// The subset of the app state the auth guards need.
#[derive(Clone)]
pub struct AuthState {
    /// Decrypts and verifies the private auth cookie.
    pub cookie_key: Key,
    /// How far the cookie expiry slides forward on each authenticated request.
    pub cookie_duration: Duration,
    /// Canonical timezone name used when computing the new expiry.
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// Lets `PrivateCookieJar` pull the key out of the guard state.
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Shared guard body. `reject` turns the computed log in URL into whichever
/// redirect flavour the caller wants.
#[inline]
async fn guard_request(
    state: AuthState,
    request: Request,
    next: Next,
    reject: impl Fn(&str) -> Response,
) -> Response {
    // Computed up front so every failure path below can use it.
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Cannot resolve timezone {:?}, treating the request as unauthenticated.",
            state.local_timezone
        );
        return reject(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Could not read the cookie jar: {err:?}");
            return reject(&log_in_url);
        }
    };

    let Ok(token) = get_token_from_cookies(&jar) else {
        return reject(&log_in_url);
    };

    // Handlers read the owner via `Extension(user_id): Extension<UserID>`.
    parts.extensions.insert(token.user_id);

    let response = next.run(Request::from_parts(parts, body)).await;

    append_refreshed_cookie(response, jar, state.cookie_duration, local_offset)
}

fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        tracing::warn!("Request URL is not a usable redirect target, using the dashboard.");

        build_log_in_redirect_url_from_target(endpoints::ROOT)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// Slide the cookie expiry forward so active users stay logged in. A failure
/// here keeps the original cookie rather than logging the user out.
fn append_refreshed_cookie(
    response: Response,
    jar: PrivateCookieJar,
    cookie_duration: Duration,
    local_offset: time::UtcOffset,
) -> Response {
    let jar = extend_auth_cookie_duration_if_needed(jar.clone(), cookie_duration, local_offset)
        .unwrap_or_else(|err| {
            tracing::error!("Could not extend the auth cookie: {err:?}");
            jar
        });

    let (mut parts, body) = response.into_parts();

    let cookie_headers = jar.into_response();
    for (name, value) in cookie_headers.headers() {
        if name == SET_COOKIE {
            parts.headers.append(name, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

/// Auth guard for page routes.
///
/// Unauthenticated clients get a 303 redirect to the log in page with a
/// `redirect_url` parameter pointing back at the requested page.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard_request(state, request, next, |log_in_url| {
        Redirect::to(log_in_url).into_response()
    })
    .await
}

/// Auth guard for htmx form endpoints.
///
/// Unauthenticated clients get a 200 response carrying an `HX-Redirect`
/// header, which htmx turns into a full page navigation to the log in page.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard_request(state, request, next, |log_in_url| {
        (HxRedirect(log_in_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}
