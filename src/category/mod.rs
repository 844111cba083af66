//! Categories group transactions for reporting, e.g. "Groceries" or "Rent".

mod create_endpoint;
mod create_page;
mod db;
mod domain;

pub use create_endpoint::create_category_endpoint;
pub use create_page::get_new_category_page;
pub use db::{create_category, create_category_table, get_all_categories, get_category};
pub use domain::{Category, CategoryId, CategoryName};
