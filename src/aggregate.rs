//! Funding and expense aggregation
//!
//! Pure functions over in-memory collections. Nothing here touches storage,
//! so callers can summarize any slice of commitments or expenses.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::{Result, TripError};
use crate::model::{Amount, Commitment, Expense, Trip};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Sum of all pledged amounts, zero for no commitments
///
/// Fails with a validation error instead of overflowing.
pub fn total_committed(commitments: &[Commitment]) -> Result<Amount> {
    checked_total("total_committed", commitments.iter().map(|c| c.amount))
}

/// Sum of all expense amounts, zero for no expenses
pub fn total_expenses(expenses: &[Expense]) -> Result<Amount> {
    checked_total("total_expenses", expenses.iter().map(|e| e.amount))
}

fn checked_total(field: &str, mut amounts: impl Iterator<Item = Amount>) -> Result<Amount> {
    amounts
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or_else(|| TripError::validation(format!("{} is too large", field)))
}

/// One commitment per contributor, so this is the number of participants
pub fn participant_count(commitments: &[Commitment]) -> usize {
    commitments.len()
}

/// `round(100 * total_committed / goal_amount)`
///
/// A non-positive goal is rejected rather than producing a meaningless ratio.
pub fn progress_ratio(total_committed: Amount, goal_amount: Amount) -> Result<i64> {
    if goal_amount <= Decimal::ZERO {
        return Err(TripError::validation("goal_amount must be greater than zero"));
    }
    percentage(total_committed, goal_amount)
}

/// `round(100 * participant_count / max_participants)`
pub fn participation_ratio(participant_count: usize, max_participants: u32) -> Result<i64> {
    if max_participants == 0 {
        return Err(TripError::validation(
            "max_participants must be greater than zero",
        ));
    }
    percentage(
        Decimal::from(participant_count as u64),
        Decimal::from(max_participants),
    )
}

/// Whole days from `now` until the start of the deadline day (UTC), floored
///
/// Negative once the deadline has passed; callers decide how to show that.
pub fn days_remaining(deadline: NaiveDate, now: DateTime<Utc>) -> i64 {
    let deadline_start = deadline.and_time(NaiveTime::MIN).and_utc();
    let millis = (deadline_start - now).num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY)
}

fn percentage(numerator: Decimal, denominator: Decimal) -> Result<i64> {
    let overflow = || TripError::validation("amount is too large to compute a percentage");

    numerator
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(denominator))
        .map(|ratio| ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
        .ok_or_else(overflow)
}

/// Funding and spending figures shown on the trip page
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TripSummary {
    pub total_committed: Amount,
    pub total_expenses: Amount,
    pub num_participants: usize,
    pub progress_percentage: i64,
    pub participants_percentage: i64,

    /// Still needed to reach the goal; zero once the goal is met
    pub remaining_amount: Amount,

    pub days_remaining: i64,
    pub deadline_passed: bool,

    /// No more new contributors can join, only existing ones can change
    /// their pledge
    pub is_full: bool,
}

/// Derives the trip page figures
///
/// Stored trips only hold amounts that passed `validate_amount`, which keeps
/// every figure here within range.
pub fn summarize(trip: &Trip, expenses: &[Expense], now: DateTime<Utc>) -> Result<TripSummary> {
    let committed = total_committed(&trip.commitments)?;
    let num_participants = participant_count(&trip.commitments);
    let days_remaining = days_remaining(trip.deadline, now);

    Ok(TripSummary {
        total_committed: committed,
        total_expenses: total_expenses(expenses)?,
        num_participants,
        progress_percentage: progress_ratio(committed, trip.goal_amount)?,
        participants_percentage: participation_ratio(num_participants, trip.max_participants)?,
        remaining_amount: (trip.goal_amount - committed).max(Decimal::ZERO),
        days_remaining,
        deadline_passed: days_remaining < 0,
        is_full: num_participants >= trip.max_participants as usize,
    })
}
