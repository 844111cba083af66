//! The dashboard shown on the root page.
//!
//! This module contains:
//! - The route handler for the dashboard page
//! - Aggregation functions for totals, monthly summaries and the expense
//!   breakdown
//! - Chart generation for the aggregated data

mod aggregation;
mod charts;
mod handlers;

pub use handlers::get_dashboard_page;
