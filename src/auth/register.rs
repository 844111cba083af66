//! The registration page for creating a new account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    app_state::create_cookie_key,
    auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, email_input,
        loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
    user::create_user,
};

/// Client-side minimum password length. The zxcvbn check on the server is the
/// real gate, this just catches obviously short passwords before a round trip.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                minlength=(min_length)
                required
                autofocus[error_message.is_some()]
                class=(FORM_TEXT_INPUT_STYLE);

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// Which field of the registration form an error message belongs to.
enum RegisterError<'a> {
    Email(&'a str),
    Password(&'a str),
    ConfirmPassword(&'a str),
}

fn registration_form(email: &str, error: Option<RegisterError<'_>>) -> Markup {
    let (email_error, password_error, confirm_error) = match error {
        Some(RegisterError::Email(message)) => (Some(message), None, None),
        Some(RegisterError::Password(message)) => (None, Some(message), None),
        Some(RegisterError::ConfirmPassword(message)) => (None, None, Some(message)),
        None => (None, None, None),
    };

    html! {
        form
            hx-post=(endpoints::REGISTER_VIEW)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, email_error))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, password_error))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, confirm_error))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", None);
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// What [post_register] needs from the app state.
#[derive(Debug, Clone)]
pub struct RegisterState {
    /// Signs and encrypts the private auth cookies.
    pub cookie_key: Key,
    /// How long a freshly issued auth cookie stays valid.
    pub cookie_duration: Duration,
    /// Canonical timezone name used when computing the cookie expiry.
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegisterState {
    /// Build a register state with the default cookie duration and a key
    /// derived from `cookie_secret`.
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// Lets `PrivateCookieJar` pull the key out of the register state.
impl FromRef<RegisterState> for Key {
    fn from_ref(state: &RegisterState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Handle a registration submission.
///
/// On success the new user is logged in straight away and redirected to the
/// dashboard. Validation failures re-render the form with an inline error
/// message next to the offending field.
pub async fn post_register(
    State(state): State<RegisterState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        return registration_form(email, Some(RegisterError::Email("Enter a valid email address")))
            .into_response();
    }

    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_form(
                email,
                Some(RegisterError::Password(error.to_string().as_ref())),
            )
            .into_response();
        }
    };

    if form.password != form.confirm_password {
        return registration_form(
            email,
            Some(RegisterError::ConfirmPassword("Passwords do not match")),
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("Could not hash the password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let create_result = create_user(
        email,
        password_hash,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    );

    match create_result {
        Ok(user) => match set_auth_cookie(jar, user.id, state.cookie_duration, local_timezone) {
            Ok(jar) => (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::ROOT.to_owned()),
                jar,
            )
                .into_response(),
            Err(error) => {
                tracing::error!("Could not set the auth cookie: {error}");

                get_internal_server_error_redirect()
            }
        },
        Err(Error::DuplicateEmail) => registration_form(
            email,
            Some(RegisterError::Email(
                "This email address is already registered, log in instead",
            )),
        )
        .into_response(),
        Err(error) => {
            tracing::error!("Could not insert the new user: {error}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::{StatusCode, header::CONTENT_TYPE};

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::REGISTER_VIEW, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);

        let log_in_link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links = form.select(&log_in_link_selector).collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        assert_eq!(links[0].value().attr("href"), Some(endpoints::LOG_IN_VIEW));
    }
}

#[cfg(test)]
mod post_register_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        PasswordHash, endpoints,
        user::{create_user, create_user_table},
    };

    use super::{RegisterForm, RegisterState, post_register};

    fn test_register_state() -> RegisterState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        RegisterState::new("42", "Etc/UTC", Arc::new(Mutex::new(connection)))
    }

    fn test_server(state: RegisterState) -> TestServer {
        let app = Router::new()
            .route(endpoints::REGISTER_VIEW, post(post_register))
            .with_state(state);

        TestServer::new(app)
    }

    fn register_form(email: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    #[track_caller]
    fn assert_inline_error(body: &str, want_text: &str) {
        let fragment = scraper::Html::parse_fragment(body);

        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph_text = paragraphs[0].text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains(want_text),
            "'{paragraph_text}' does not contain the text '{want_text}'"
        );
    }

    #[tokio::test]
    async fn register_succeeds() {
        let server = test_server(test_register_state());

        server
            .post(endpoints::REGISTER_VIEW)
            .form(&register_form(
                "ted@fintrack.dev",
                "iamtestingwhethericancreateanewuser",
                "iamtestingwhethericancreateanewuser",
            ))
            .await
            .assert_status_see_other();
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_email() {
        let state = test_register_state();
        create_user(
            "ted@fintrack.dev",
            PasswordHash::new_unchecked("foobarbazquxgobbledygook"),
            &state
                .db_connection
                .lock()
                .expect("Could not acquire database connection"),
        )
        .expect("Could not create test user");
        let server = test_server(state);

        let body = server
            .post(endpoints::REGISTER_VIEW)
            .form(&register_form(
                "ted@fintrack.dev",
                "averystrongandsecurepassword",
                "averystrongandsecurepassword",
            ))
            .await
            .text();

        assert_inline_error(&body, "already registered");
    }

    #[tokio::test]
    async fn register_fails_with_invalid_email() {
        let server = test_server(test_register_state());

        let body = server
            .post(endpoints::REGISTER_VIEW)
            .form(&register_form(
                "not-an-email",
                "averystrongandsecurepassword",
                "averystrongandsecurepassword",
            ))
            .await
            .text();

        assert_inline_error(&body, "valid email");
    }

    #[tokio::test]
    async fn register_fails_when_password_is_weak() {
        let server = test_server(test_register_state());

        let body = server
            .post(endpoints::REGISTER_VIEW)
            .form(&register_form("ted@fintrack.dev", "foo", "foo"))
            .await
            .text();

        assert_inline_error(&body, "password is too weak");
    }

    #[tokio::test]
    async fn register_fails_when_passwords_do_not_match() {
        let server = test_server(test_register_state());

        let body = server
            .post(endpoints::REGISTER_VIEW)
            .form(&register_form(
                "ted@fintrack.dev",
                "iamtestingwhethericancreateanewuser",
                "thisisadifferentpassword",
            ))
            .await
            .text();

        assert_inline_error(&body, "passwords do not match");
    }
}
