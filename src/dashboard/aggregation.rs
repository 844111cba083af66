//! Pure aggregation functions over filtered transaction rows.
//!
//! These functions compute the totals, the per-month series and the
//! expense-by-category breakdown shown on the dashboard. They operate on the
//! already-filtered rows so every summary reflects the active filter.

use std::collections::{BTreeMap, HashMap};

use time::{Date, Month};

use crate::transaction::{TransactionKind, TransactionRow};

/// The label used for expenses without a category.
pub(super) const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Sums the amounts of all income rows. Zero when there are none.
pub(super) fn total_income(rows: &[TransactionRow]) -> f64 {
    rows.iter()
        .filter(|row| row.kind == TransactionKind::Income)
        .map(|row| row.amount)
        .sum()
}

/// Sums the amounts of all expense rows. Zero when there are none.
pub(super) fn total_expense(rows: &[TransactionRow]) -> f64 {
    rows.iter()
        .filter(|row| row.kind == TransactionKind::Expense)
        .map(|row| row.amount)
        .sum()
}

/// The income and expense totals for a single month.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MonthlySummary {
    /// The month, as a date with the day set to one.
    pub month: Date,
    /// The total income for the month.
    pub income: f64,
    /// The total expenses for the month.
    pub expense: f64,
}

/// Aggregates rows into per-month income and expense totals, in ascending
/// month order.
///
/// Only months that appear in `rows` are included, months without
/// transactions are not synthesized.
pub(super) fn monthly_summaries(rows: &[TransactionRow]) -> Vec<MonthlySummary> {
    let mut totals: BTreeMap<Date, (f64, f64)> = BTreeMap::new();

    for row in rows {
        // The first day of the month is always a valid date.
        let month = row.date.replace_day(1).unwrap();
        let entry = totals.entry(month).or_insert((0.0, 0.0));

        match row.kind {
            TransactionKind::Income => entry.0 += row.amount,
            TransactionKind::Expense => entry.1 += row.amount,
        }
    }

    totals
        .into_iter()
        .map(|(month, (income, expense))| MonthlySummary {
            month,
            income,
            expense,
        })
        .collect()
}

/// Formats a month as a short label, e.g. "Jan 2026".
pub(super) fn format_month_label(month: Date) -> String {
    let month_name = match month.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{month_name} {}", month.year())
}

/// The total spent under one category label.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    /// The category name, or [UNCATEGORIZED_LABEL] for expenses without one.
    pub label: String,
    /// The total expense amount for the category.
    pub total: f64,
}

/// Groups expense rows by category and returns the totals in descending
/// order.
///
/// Income rows are ignored. Expenses without a category are collected under
/// [UNCATEGORIZED_LABEL]. Categories with equal totals keep the order in
/// which they first appeared in `rows`.
pub(super) fn expense_breakdown(rows: &[TransactionRow]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut index_by_label: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if row.kind != TransactionKind::Expense {
            continue;
        }

        let label = row
            .category_name
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_owned());

        match index_by_label.get(&label) {
            Some(&index) => totals[index].total += row.amount,
            None => {
                index_by_label.insert(label.clone(), totals.len());
                totals.push(CategoryTotal {
                    label,
                    total: row.amount,
                });
            }
        }
    }

    // sort_by is stable, so equal totals keep their first-seen order.
    totals.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    totals
}
