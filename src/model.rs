//! Data models for the trip fundraising service
//!
//! This module defines the stored records (trips, commitments, expenses),
//! the drafts and patches used to create or change them, and the
//! request/response shapes of the HTTP API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::TripSummary;
use crate::error::{Result, TripError};

/// Monetary amount in the trip's (single) currency
pub type Amount = Decimal;

/// Calendar dates travel as `YYYY-MM-DD`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest accepted goal, pledge or expense (one billion)
///
/// Together with [`AMOUNT_DECIMAL_PLACES`] and [`MAX_PARTICIPANTS`] this keeps
/// every stored trip summarizable: the largest possible progress percentage
/// is `100 * MAX_PARTICIPANTS * MAX_AMOUNT / 0.01`, well inside an `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

/// Amounts are whole cents
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

pub const MAX_PARTICIPANTS: u32 = 10_000;

/// A group trip with a fundraising goal and a participant cap
///
/// Commitments are stored inline, in submission order, so a single record
/// holds everything the upsert rule needs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: u64,

    pub name: String,

    /// Shareable join code, unique per trip (e.g., "k3x9qa")
    pub code: String,

    /// Always greater than zero
    pub goal_amount: Amount,

    /// Always at least 1
    pub max_participants: u32,

    pub details: String,

    pub deadline: NaiveDate,

    pub created_at: DateTime<Utc>,

    pub creator_id: String,

    #[serde(default)]
    pub commitments: Vec<Commitment>,
}

/// A participant's pledge toward the trip goal
///
/// The contributor name is the dedup key: a trip holds at most one
/// commitment per exact name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Commitment {
    pub id: u64,
    pub trip_id: u64,
    pub user_id: String,
    pub name: String,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

/// A shared expense paid by one participant
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: u64,
    pub trip_id: u64,
    pub title: String,
    pub amount: Amount,
    pub paid_by: String,
    pub paid_on: NaiveDate,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseCategory {
    Accommodation,
    Food,
    Transportation,
    Activities,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Accommodation,
        ExpenseCategory::Food,
        ExpenseCategory::Transportation,
        ExpenseCategory::Activities,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Accommodation => "Accommodation",
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Activities => "Activities",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = TripError;

    /// Exact names only; unknown categories are rejected, never mapped to `Other`
    fn from_str(s: &str) -> Result<Self> {
        ExpenseCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                TripError::validation(format!(
                    "Unknown expense category '{}'. Expected one of: Accommodation, Food, Transportation, Activities, Other",
                    s
                ))
            })
    }
}

/// Checks that `amount` is positive, at most [`MAX_AMOUNT`] and in whole cents
pub fn validate_amount(field: &str, amount: Amount) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(TripError::validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(TripError::validation(format!(
            "{} must not exceed {}",
            field, MAX_AMOUNT
        )));
    }
    if amount.normalize().scale() > AMOUNT_DECIMAL_PLACES {
        return Err(TripError::validation(format!(
            "{} can have at most {} decimal places",
            field, AMOUNT_DECIMAL_PLACES
        )));
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` form value into a calendar date
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        TripError::validation(format!("{} must be a valid date (YYYY-MM-DD)", field))
    })
}

/// Request payload for creating a trip
///
/// # Example
/// ```json
/// {
///   "name": "Summer Beach Trip",
///   "goal_amount": 5000,
///   "max_participants": 4,
///   "details": "A weekend in Ibiza",
///   "deadline": "2026-12-01",
///   "creator_id": "user123"
/// }
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct TripDraft {
    pub name: String,
    pub goal_amount: Amount,
    pub max_participants: u32,
    #[serde(default)]
    pub details: String,
    /// Kept as the raw form string so a malformed date surfaces as a
    /// validation error instead of a body rejection
    pub deadline: String,
    /// Optional creator identifier; a placeholder is used when absent
    pub creator_id: Option<String>,
}

/// Optional changes to a trip's details; absent fields stay as they are
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TripPatch {
    pub name: Option<String>,
    pub details: Option<String>,
    pub goal_amount: Option<Amount>,
    pub max_participants: Option<u32>,
    pub deadline: Option<String>,
}

/// A named pledge submitted from the trip page
///
/// # Example
/// ```json
/// { "name": "Alice", "amount": 150 }
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct CommitmentSubmission {
    pub name: String,
    pub amount: Amount,
    /// Contributor identity from an external identity provider, if any
    pub user_id: Option<String>,
}

/// Request payload for adding an expense
///
/// `paid_on` and `category` are raw strings so the ledger can reject
/// malformed values explicitly.
#[derive(Deserialize, Debug, Clone)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: Amount,
    pub paid_by: String,
    pub paid_on: String,
    pub category: String,
    #[serde(default)]
    pub notes: String,
}

/// Request payload for joining a trip by its code
#[derive(Deserialize, Debug)]
pub struct JoinRequest {
    pub code: String,
}

/// Trip details together with the derived funding figures
#[derive(Serialize, Debug)]
pub struct TripResponse {
    pub trip: Trip,

    /// Link participants can open to join (e.g., "http://localhost:8080/trip/k3x9qa")
    pub share_url: String,

    #[serde(flatten)]
    pub summary: TripSummary,
}

/// Response returned after a commitment submission
#[derive(Serialize, Debug)]
pub struct CommitmentResponse {
    pub commitment: Commitment,

    /// `false` when an existing commitment with the same name was updated
    pub created: bool,
}

/// Expenses of a trip with their running total
#[derive(Serialize, Debug)]
pub struct ExpenseListResponse {
    pub total: Amount,
    pub count: usize,
    pub data: Vec<Expense>,
}
