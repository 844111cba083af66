//! The shared state handed to the router and extracted by the handlers.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize};

/// Everything the request handlers need, cloned per handler via [FromRef].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Signs and encrypts the private auth cookies.
    pub cookie_key: Key,

    /// How long a freshly issued auth cookie stays valid.
    pub cookie_duration: Duration,

    /// Canonical timezone name used to resolve "today" for date inputs,
    /// e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The SQLite connection, shared behind a mutex.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Build the application state and create the database schema.
    ///
    /// The cookie signing key is derived from `cookie_secret`, so the same
    /// secret across restarts keeps existing sessions valid.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created on `db_connection`.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// Lets `PrivateCookieJar` pull the key straight out of the app state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive a cookie signing key from `secret`.
///
/// `Key` wants at least 64 bytes of entropy, which is exactly the size of a
/// Sha512 digest, so the secret is hashed rather than used directly.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use super::{AppState, create_cookie_key};

    #[test]
    fn new_initializes_the_schema() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "notsosecretsecret",
            "Etc/UTC",
        )
        .expect("Could not create app state");

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                 WHERE type = 'table' AND name IN ('user', 'category', 'transaction')",
                (),
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 3);
    }

    #[test]
    fn same_secret_derives_same_key() {
        assert_eq!(create_cookie_key("hunter2"), create_cookie_key("hunter2"));
        assert_ne!(create_cookie_key("hunter2"), create_cookie_key("hunter3"));
    }
}
