//! Database operations for categories.
//!
//! All queries are scoped to the owning user. Asking for another user's
//! category behaves the same as asking for one that does not exist.

use rusqlite::{Connection, Row};

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName},
};

/// Create a category for `user_id` and return it with its generated ID.
pub fn create_category(
    name: CategoryName,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, user_id) VALUES (?1, ?2);",
        (name.as_ref(), user_id.as_i64()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, name, user_id })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category
/// owned by `user_id`.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, user_id FROM category WHERE id = :id AND user_id = :user_id;")?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the categories owned by `user_id`, ordered alphabetically by name.
pub fn get_all_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, user_id FROM category WHERE user_id = :user_id ORDER BY name ASC;")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_name ON category(user_id, name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let user_id = UserID::new(row.get(2)?);

    Ok(Category { id, name, user_id })
}
