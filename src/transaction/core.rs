//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, UserID, category::CategoryId};

/// Alias for the ID for a transaction.
pub type TransactionId = i64;

/// Whether a transaction brought money in or sent money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in, e.g. salary.
    Income,
    /// Money going out, e.g. rent.
    Expense,
}

impl TransactionKind {
    /// The string stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The capitalised name shown to users, e.g. in tables and CSV exports.
    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid transaction kind {other:?}").into(),
            )),
        }
    }
}

/// An income or expense, i.e. an event where money was either earned or spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money that moved, always positive and rounded to cents.
    pub amount: f64,
    /// Whether the money came in or went out.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// The user that owns the transaction.
    pub user_id: UserID,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, kind: TransactionKind, date: Date, user_id: UserID) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            kind,
            date,
            description: String::new(),
            category_id: None,
            user_id,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Optional fields default to empty or none. Pass the builder to
/// [create_transaction] or [update_transaction] to persist it.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction, always positive.
    ///
    /// The direction of the money flow is stored separately in `kind`,
    /// so `45.99` with [TransactionKind::Expense] records money spent
    /// and `45.99` with [TransactionKind::Income] records money earned.
    pub amount: f64,

    /// Whether the money came in or went out.
    pub kind: TransactionKind,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,

    /// The user that owns the transaction.
    pub user_id: UserID,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the category ID for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// Round an amount to whole cents.
pub(crate) fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Create a new transaction in the database from a builder.
///
/// The amount is rounded to whole cents before it is stored.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, kind, date, description, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, amount, kind, date, description, category_id, user_id",
        )?
        .query_row(
            (
                round_to_cents(builder.amount),
                builder.kind,
                builder.date,
                &builder.description,
                builder.category_id,
                builder.user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, kind, date, description, category_id, user_id
             FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )
        .map_err(Error::from)?;

    Ok(transaction)
}

/// Overwrite the transaction `id` owned by `builder.user_id` with the
/// builder's fields.
///
/// The amount is rounded to whole cents before it is stored.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction owned by the user,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\"
             SET amount = ?1, kind = ?2, date = ?3, description = ?4, category_id = ?5
             WHERE id = ?6 AND user_id = ?7",
            (
                round_to_cents(builder.amount),
                builder.kind,
                builder.date,
                &builder.description,
                builder.category_id,
                id,
                builder.user_id.as_i64(),
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    get_transaction(id, builder.user_id, connection)
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category_id INTEGER,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Add composite index used by the dashboard page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date, category_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let kind = row.get(2)?;
    let date = row.get(3)?;
    let description = row.get(4)?;
    let category_id = row.get(5)?;
    let user_id = UserID::new(row.get(6)?);

    Ok(Transaction {
        id,
        amount,
        kind,
        date,
        description,
        category_id,
        user_id,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash, UserID,
        category::{CategoryName, create_category},
        db::initialize,
        transaction::{
            Transaction, TransactionKind, create_transaction, delete_transaction, get_transaction,
            update_transaction,
        },
        user::create_user,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            "ted@fintrack.dev",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .expect("Could not create test user");

        (conn, user.id)
    }

    fn create_other_user(conn: &Connection) -> UserID {
        create_user(
            "alice@fintrack.dev",
            PasswordHash::new_unchecked("hunter3"),
            conn,
        )
        .expect("Could not create second test user")
        .id
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();
        let amount = 12.3;

        let result = create_transaction(
            Transaction::build(amount, TransactionKind::Expense, date!(2026 - 01 - 05), user_id)
                .description("Coffee"),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert!(transaction.id > 0);
                assert_eq!(transaction.amount, amount);
                assert_eq!(transaction.kind, TransactionKind::Expense);
                assert_eq!(transaction.description, "Coffee");
                assert_eq!(transaction.user_id, user_id);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_rounds_amount_to_cents() {
        let (conn, user_id) = get_test_connection();

        let transaction = create_transaction(
            Transaction::build(
                12.345,
                TransactionKind::Income,
                date!(2026 - 01 - 05),
                user_id,
            ),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.amount, 12.35);
    }

    #[test]
    fn create_fails_on_invalid_category_id() {
        let (conn, user_id) = get_test_connection();
        let category_id = Some(42);

        let result = create_transaction(
            Transaction::build(
                123.45,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                user_id,
            )
            .category_id(category_id),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(category_id)));
    }

    #[test]
    fn create_succeeds_with_valid_category_id() {
        let (conn, user_id) = get_test_connection();
        let category =
            create_category(CategoryName::new_unchecked("Groceries"), user_id, &conn)
                .expect("Could not create test category");

        let transaction = create_transaction(
            Transaction::build(
                54.32,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                user_id,
            )
            .category_id(Some(category.id)),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.category_id, Some(category.id));
    }

    #[test]
    fn deleting_category_clears_reference_but_keeps_transaction() {
        let (conn, user_id) = get_test_connection();
        let category =
            create_category(CategoryName::new_unchecked("Groceries"), user_id, &conn)
                .expect("Could not create test category");
        let transaction = create_transaction(
            Transaction::build(
                54.32,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                user_id,
            )
            .category_id(Some(category.id)),
            &conn,
        )
        .expect("Could not create transaction");

        conn.execute("DELETE FROM category WHERE id = ?1", (category.id,))
            .expect("Could not delete category");

        let orphaned = get_transaction(transaction.id, user_id, &conn)
            .expect("Transaction should survive category deletion");
        assert_eq!(orphaned.category_id, None);
        assert_eq!(orphaned.amount, transaction.amount);
    }

    #[test]
    fn get_transaction_owned_by_other_user_returns_not_found() {
        let (conn, user_id) = get_test_connection();
        let other_user_id = create_other_user(&conn);
        let other_transaction = create_transaction(
            Transaction::build(
                10.0,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                other_user_id,
            ),
            &conn,
        )
        .expect("Could not create transaction");

        let result = get_transaction(other_transaction.id, user_id, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_succeeds() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(
                10.0,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                user_id,
            )
            .description("Lunch"),
            &conn,
        )
        .expect("Could not create transaction");

        let updated = update_transaction(
            transaction.id,
            Transaction::build(
                20.0,
                TransactionKind::Income,
                date!(2026 - 01 - 05),
                user_id,
            )
            .description("Refund"),
            &conn,
        )
        .expect("Could not update transaction");

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.amount, 20.0);
        assert_eq!(updated.kind, TransactionKind::Income);
        assert_eq!(updated.date, date!(2026 - 01 - 05));
        assert_eq!(updated.description, "Refund");
    }

    #[test]
    fn update_transaction_owned_by_other_user_fails() {
        let (conn, user_id) = get_test_connection();
        let other_user_id = create_other_user(&conn);
        let other_transaction = create_transaction(
            Transaction::build(
                10.0,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                other_user_id,
            ),
            &conn,
        )
        .expect("Could not create transaction");

        let result = update_transaction(
            other_transaction.id,
            Transaction::build(
                99.0,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                user_id,
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));

        // The other user's transaction is untouched.
        let unchanged = get_transaction(other_transaction.id, other_user_id, &conn).unwrap();
        assert_eq!(unchanged, other_transaction);
    }

    #[test]
    fn delete_succeeds() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(
                10.0,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                user_id,
            ),
            &conn,
        )
        .expect("Could not create transaction");

        delete_transaction(transaction.id, user_id, &conn)
            .expect("Could not delete transaction");

        assert_eq!(
            get_transaction(transaction.id, user_id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_transaction_owned_by_other_user_fails() {
        let (conn, user_id) = get_test_connection();
        let other_user_id = create_other_user(&conn);
        let other_transaction = create_transaction(
            Transaction::build(
                10.0,
                TransactionKind::Expense,
                date!(2026 - 01 - 04),
                other_user_id,
            ),
            &conn,
        )
        .expect("Could not create transaction");

        let result = delete_transaction(other_transaction.id, user_id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
        assert!(get_transaction(other_transaction.id, other_user_id, &conn).is_ok());
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let (conn, user_id) = get_test_connection();

        let result = delete_transaction(999, user_id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }
}
