//! The page for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID,
    category::{Category, get_all_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::{
        TransactionKind,
        form::{TransactionFormDefaults, transaction_form_fields},
    },
};

fn create_transaction_view(max_date: Date, available_categories: &[Category]) -> Markup {
    let defaults = TransactionFormDefaults {
        kind: TransactionKind::Expense,
        amount: None,
        date: max_date,
        description: None,
        category_id: None,
        max_date,
        autofocus_amount: true,
    };

    let content = html! {
        (NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::NEW_TRANSACTION_VIEW)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Transaction" }

                (transaction_form_fields(&defaults, available_categories))

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                    " Create Transaction"
                }
            }
        }
    };

    base("Create Transaction", &[dollar_input_styles()], &content)
}

/// What [get_create_transaction_page] needs from the app state.
#[derive(Debug, Clone)]
pub struct CreateTransactionPageState {
    /// Canonical timezone name used to resolve today's date for the form.
    pub local_timezone: String,
    /// Holds the user's categories for the category dropdown.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the form for recording a new transaction.
///
/// The date input is capped at today in the configured timezone, so the form
/// cannot submit future dates without tampering.
pub async fn get_create_transaction_page(
    State(state): State<CreateTransactionPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let available_categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(user_id, &connection).inspect_err(|error| {
            tracing::error!("Could not load the categories for the new transaction page: {error}")
        })?
    };

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    let today = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    Ok(create_transaction_view(today, &available_categories).into_response())
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;
    use scraper::ElementRef;
    use time::OffsetDateTime;

    use crate::{
        PasswordHash, UserID,
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
        transaction::{create_page::CreateTransactionPageState, get_create_transaction_page},
        user::create_user,
    };

    fn get_test_state() -> (CreateTransactionPageState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "ted@fintrack.dev",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .expect("Could not create test user");

        (
            CreateTransactionPageState {
                local_timezone: "Etc/UTC".to_owned(),
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn new_transaction_returns_form() {
        let (state, user_id) = get_test_state();

        let response = get_create_transaction_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::NEW_TRANSACTION_VIEW, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "date");
        assert_form_input(&form, "description", "text");
        assert_form_submit_button(&form);
        assert_max_date_is_today(&form);
    }

    #[track_caller]
    fn assert_max_date_is_today(form: &ElementRef) {
        let today = OffsetDateTime::now_utc().date();
        let input = form
            .select(&scraper::Selector::parse("input[type=date]").unwrap())
            .next()
            .expect("No date input found");
        let max_date = input.value().attr("max");

        assert_eq!(
            Some(today.to_string().as_str()),
            max_date,
            "new transactions should be capped at today ({today}), got max={max_date:?}"
        );
    }
}
