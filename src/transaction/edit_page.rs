//! Defines the route handler for the page for editing an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID,
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    not_found::get_404_not_found_response,
    timezone::get_local_offset,
    transaction::{
        Transaction, get_transaction,
        form::{TransactionFormDefaults, transaction_form_fields},
    },
};

fn edit_transaction_view(
    transaction: &Transaction,
    max_date: Date,
    available_categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();
    let defaults = TransactionFormDefaults {
        kind: transaction.kind,
        amount: Some(transaction.amount),
        date: transaction.date,
        description: Some(&transaction.description),
        category_id: transaction.category_id,
        max_date,
        autofocus_amount: false,
    };
    let update_endpoint = format_endpoint(endpoints::UPDATE_TRANSACTION, transaction.id);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(update_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (transaction_form_fields(&defaults, available_categories))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Save Changes"
                }
            }
        }
    };

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for accessing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction.
///
/// Responds with a 404 page if the transaction does not exist or belongs to
/// another user.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<i64>,
) -> Result<Response, Error> {
    let (transaction, available_categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transaction = match get_transaction(transaction_id, user_id, &connection) {
            Ok(transaction) => transaction,
            Err(Error::NotFound) => {
                return Ok(get_404_not_found_response());
            }
            Err(error) => {
                tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
                return Err(error);
            }
        };

        let available_categories = get_all_categories(user_id, &connection).inspect_err(
            |error| tracing::error!("Failed to retrieve categories for edit page: {error}"),
        )?;

        (transaction, available_categories)
    };

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    let max_date = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    Ok(edit_transaction_view(&transaction, max_date, &available_categories).into_response())
}
