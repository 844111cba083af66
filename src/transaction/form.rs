//! The shared form fields for creating and editing transactions.

use maud::{Markup, html};
use time::Date;

use crate::{
    category::{Category, CategoryId},
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    transaction::TransactionKind,
};

/// Prefilled values for the transaction form, today's values for the create
/// page and the stored transaction for the edit page.
pub struct TransactionFormDefaults<'a> {
    pub kind: TransactionKind,
    pub amount: Option<f64>,
    pub date: Date,
    pub description: Option<&'a str>,
    pub category_id: Option<CategoryId>,
    pub max_date: Date,
    pub autofocus_amount: bool,
}

fn kind_radio(value: &str, label_text: &str, checked: bool) -> Markup {
    let id = format!("transaction-kind-{value}");

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="kind"
                id=(id)
                type="radio"
                value=(value)
                checked[checked]
                required
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (label_text) }
        }
    }
}

pub fn transaction_form_fields(
    defaults: &TransactionFormDefaults<'_>,
    available_categories: &[Category],
) -> Markup {
    let is_expense = matches!(defaults.kind, TransactionKind::Expense);
    let amount_str = defaults.amount.map(|amount| format!("{:.2}", amount.abs()));
    let amount_placeholder = amount_str.as_deref().unwrap_or("0.01");
    let description_placeholder = defaults.description.unwrap_or("Description");

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Transaction type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                (kind_radio("expense", "Expense", is_expense))
                (kind_radio("income", "Income", !is_expense))
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder=(amount_placeholder)
                    value=[amount_str.as_deref()]
                    autofocus[defaults.autofocus_amount]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder=(description_placeholder)
                value=[defaults.description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        @if !available_categories.is_empty() {
            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for category in available_categories {
                        option
                            value=(category.id)
                            selected[Some(category.id) == defaults.category_id]
                        {
                            (category.name)
                        }
                    }
                }
            }
        }
    }
}
