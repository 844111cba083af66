//! Wires up every route and hangs the auth middleware on the protected ones.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page,
        post_log_in, post_register,
    },
    category::{create_category_endpoint, get_new_category_page},
    dashboard::get_dashboard_page,
    endpoints,
    export::get_transactions_csv,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_create_transaction_page,
        get_edit_transaction_page, update_transaction_endpoint,
    },
};

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    public_routes()
        .merge(protected_page_routes(&state))
        .merge(protected_hx_routes(&state))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The routes that work without an auth cookie.
fn public_routes() -> Router<AppState> {
    let log_in = get(get_log_in_page).post(post_log_in);
    let register = get(get_register_page).post(post_register);

    Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, log_in)
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, register)
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
}

/// Pages that require a signed-in user, guarded with a Location redirect.
fn protected_page_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(endpoints::ROOT, get(get_dashboard_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EXPORT, get(get_transactions_csv))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
}

/// The POST endpoints submitted via htmx, guarded with an HX-Redirect header
/// so the redirect happens even though the request is an XHR.
fn protected_hx_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::UPDATE_TRANSACTION,
            post(update_transaction_endpoint),
        )
        .route(
            endpoints::DELETE_TRANSACTION,
            post(delete_transaction_endpoint),
        )
        .route(endpoints::NEW_CATEGORY_VIEW, post(create_category_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx))
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}
