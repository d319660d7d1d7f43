//! Expense ledger: validated append and idempotent removal

use chrono::{DateTime, Utc};

use crate::aggregate::total_expenses;
use crate::error::{Result, TripError};
use crate::model::{parse_date, validate_amount, Expense, ExpenseCategory, ExpenseDraft};

/// Checks a draft and turns it into an expense
///
/// Title, payer and notes are copied verbatim; only emptiness is checked.
pub fn build_expense(
    trip_id: u64,
    draft: &ExpenseDraft,
    id: u64,
    now: DateTime<Utc>,
) -> Result<Expense> {
    if draft.title.trim().is_empty() {
        return Err(TripError::validation("title is required"));
    }
    validate_amount("amount", draft.amount)?;
    if draft.paid_by.trim().is_empty() {
        return Err(TripError::validation("paid_by is required"));
    }
    let paid_on = parse_date("paid_on", &draft.paid_on)?;
    let category: ExpenseCategory = draft.category.parse()?;

    Ok(Expense {
        id,
        trip_id,
        title: draft.title.clone(),
        amount: draft.amount,
        paid_by: draft.paid_by.clone(),
        paid_on,
        category,
        notes: draft.notes.clone(),
        created_at: now,
    })
}

/// Validates `draft` and appends it; `expenses` is unchanged on error
///
/// An expense that would push the ledger total out of range is rejected.
pub fn add_expense(
    expenses: &mut Vec<Expense>,
    trip_id: u64,
    draft: &ExpenseDraft,
    id: u64,
    now: DateTime<Utc>,
) -> Result<Expense> {
    let expense = build_expense(trip_id, draft, id, now)?;
    total_expenses(expenses)?
        .checked_add(expense.amount)
        .ok_or_else(|| TripError::validation("total_expenses is too large"))?;

    expenses.push(expense.clone());
    Ok(expense)
}

/// Removes the expense with `id`, returning whether one was removed
///
/// Unknown ids are a no-op.
pub fn remove_expense(expenses: &mut Vec<Expense>, id: u64) -> bool {
    let before = expenses.len();
    expenses.retain(|expense| expense.id != id);
    expenses.len() != before
}
