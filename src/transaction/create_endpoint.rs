//! The endpoint that records a submitted transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// axum_extra's Form parses an empty category select as None, axum::Form
// rejects the request instead.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, UserID,
    category::CategoryId,
    endpoints,
    transaction::{Transaction, TransactionKind, create_transaction},
};

/// What [create_transaction_endpoint] needs from the app state.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// Where new transactions are stored.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data shared by the create and edit transaction endpoints.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The dollar amount, always positive in the form.
    pub amount: f64,
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// When the transaction occurred.
    pub date: Date,
    /// A free-form note about the transaction.
    pub description: String,
    /// The category to file the transaction under, if any.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// Record a new transaction for the signed-in user.
///
/// Redirects to the dashboard on success, otherwise renders the error as an
/// inline alert.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    match record_transaction(&state, user_id, form) {
        Ok(()) => (
            HxRedirect(endpoints::ROOT.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

fn record_transaction(
    state: &CreateTransactionState,
    user_id: UserID,
    form: TransactionForm,
) -> Result<(), Error> {
    // NaN and infinity pass a plain `<= 0.0` check but would poison every
    // total computed from the stored rows.
    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Err(Error::InvalidAmount(form.amount));
    }

    let transaction = Transaction::build(form.amount, form.kind, form.date, user_id)
        .description(&form.description)
        .category_id(form.category_id);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_transaction(transaction, &connection)
        .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::Response};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        PasswordHash, UserID,
        category::{CategoryName, create_category},
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
        transaction::{
            TransactionKind,
            create_endpoint::{CreateTransactionState, TransactionForm},
            create_transaction_endpoint, get_transaction,
        },
        user::create_user,
    };

    fn new_test_state() -> (CreateTransactionState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "ted@fintrack.dev",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, user.id)
    }

    fn expense_form(amount: f64, description: &str) -> TransactionForm {
        TransactionForm {
            amount,
            kind: TransactionKind::Expense,
            date: OffsetDateTime::now_utc().date(),
            description: description.to_owned(),
            category_id: None,
        }
    }

    async fn submit(
        state: &CreateTransactionState,
        user_id: UserID,
        form: TransactionForm,
    ) -> Response {
        create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = new_test_state();

        let response = submit(&state, user_id, expense_form(12.3, "test transaction")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ROOT);

        // The first transaction gets ID 1.
        let connection = state.db_connection.lock().unwrap();
        let stored = get_transaction(1, user_id, &connection).unwrap();
        assert_eq!(stored.amount, 12.3);
        assert_eq!(stored.kind, TransactionKind::Expense);
        assert_eq!(stored.description, "test transaction");
    }

    #[tokio::test]
    async fn can_create_transaction_with_category() {
        let (state, user_id) = new_test_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            create_category(CategoryName::new_unchecked("Groceries"), user_id, &connection)
                .unwrap()
        };

        let mut form = expense_form(25.50, "test transaction with category");
        form.category_id = Some(category.id);

        let response = submit(&state, user_id, form).await;

        assert_hx_redirect(&response, endpoints::ROOT);

        let connection = state.db_connection.lock().unwrap();
        let stored = get_transaction(1, user_id, &connection).unwrap();
        assert_eq!(stored.category_id, Some(category.id));
    }

    #[tokio::test]
    async fn create_transaction_rejects_non_positive_amount() {
        let (state, user_id) = new_test_state();

        let response = submit(&state, user_id, expense_form(0.0, "bad amount")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let result = get_transaction(1, user_id, &connection);
        assert!(result.is_err(), "no transaction should have been created");
    }

    #[tokio::test]
    async fn create_transaction_rejects_non_finite_amount() {
        let (state, user_id) = new_test_state();

        for amount in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let response = submit(&state, user_id, expense_form(amount, "bad amount")).await;

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "want amount {amount} rejected"
            );
        }

        let connection = state.db_connection.lock().unwrap();
        let result = get_transaction(1, user_id, &connection);
        assert!(result.is_err(), "no transaction should have been created");
    }
}
