//! Database schema creation.

use rusqlite::Connection;

use crate::{
    Error, category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the application tables in the database if they do not exist.
///
/// Foreign key enforcement is switched on for the connection, it is off by
/// default in SQLite.
///
/// # Errors
/// Returns an [Error::SqlError] if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    create_user_table(connection)?;
    create_category_table(connection)?;
    create_transaction_table(connection)?;

    Ok(())
}
