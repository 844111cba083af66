//! Defines the endpoint for applying edits to an existing transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    endpoints,
    transaction::{Transaction, create_endpoint::TransactionForm, update_transaction},
};

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a transaction, redirects to the dashboard on success.
pub async fn update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<i64>,
    Form(form): Form<TransactionForm>,
) -> Response {
    // NaN and infinity pass a plain `<= 0.0` check but would poison every
    // total computed from the stored rows.
    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Error::InvalidAmount(form.amount).into_alert_response();
    }

    let builder = Transaction::build(form.amount, form.kind, form.date, user_id)
        .description(&form.description)
        .category_id(form.category_id);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = update_transaction(transaction_id, builder, &connection) {
        tracing::error!("could not update transaction {transaction_id}: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::ROOT.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
