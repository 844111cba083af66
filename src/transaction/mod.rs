//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its builder
//! - Database functions for storing, querying, and managing transactions
//! - The filter criteria struct and the filtered listing query
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod query;

pub use core::{
    Transaction, TransactionId, TransactionKind, create_transaction, create_transaction_table,
    delete_transaction, get_transaction, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use query::{FilterParams, TransactionRow, get_transactions};
