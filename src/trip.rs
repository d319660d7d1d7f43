//! Trip creation, detail updates and join codes

use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};

use crate::aggregate::participant_count;
use crate::error::{Result, TripError};
use crate::model::{
    parse_date, validate_amount, Amount, Trip, TripDraft, TripPatch, MAX_PARTICIPANTS,
};

/// Used when a trip is created without a creator identifier
pub const ANONYMOUS_CREATOR: &str = "anonymous";

/// Generates a random lowercase alphanumeric join code
///
/// Uniqueness is not checked here; the store retries on collision.
pub fn generate_code(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Join codes are compared case-insensitively and without surrounding spaces
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// Validates a draft and builds a trip with no commitments yet
pub fn build_trip(draft: &TripDraft, id: u64, code: String, now: DateTime<Utc>) -> Result<Trip> {
    validate_name(&draft.name)?;
    validate_goal(draft.goal_amount)?;
    validate_max_participants(draft.max_participants)?;
    let deadline = parse_date("deadline", &draft.deadline)?;

    Ok(Trip {
        id,
        name: draft.name.trim().to_string(),
        code,
        goal_amount: draft.goal_amount,
        max_participants: draft.max_participants,
        details: draft.details.clone(),
        deadline,
        created_at: now,
        creator_id: draft
            .creator_id
            .clone()
            .filter(|creator| !creator.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_CREATOR.to_string()),
        commitments: Vec::new(),
    })
}

/// Applies the present fields of `patch`; the trip is unchanged on error
///
/// The participant cap cannot drop below the number of people who already
/// committed.
pub fn apply_patch(trip: &mut Trip, patch: &TripPatch) -> Result<()> {
    let mut updated = trip.clone();

    if let Some(name) = &patch.name {
        validate_name(name)?;
        updated.name = name.trim().to_string();
    }
    if let Some(details) = &patch.details {
        updated.details = details.clone();
    }
    if let Some(goal_amount) = patch.goal_amount {
        validate_goal(goal_amount)?;
        updated.goal_amount = goal_amount;
    }
    if let Some(max_participants) = patch.max_participants {
        validate_max_participants(max_participants)?;
        let committed = participant_count(&updated.commitments);
        if (max_participants as usize) < committed {
            return Err(TripError::validation(format!(
                "max_participants cannot be lower than the {} participants already committed",
                committed
            )));
        }
        updated.max_participants = max_participants;
    }
    if let Some(deadline) = &patch.deadline {
        updated.deadline = parse_date("deadline", deadline)?;
    }

    *trip = updated;
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TripError::validation("name is required"));
    }
    Ok(())
}

fn validate_goal(goal_amount: Amount) -> Result<()> {
    validate_amount("goal_amount", goal_amount)
}

fn validate_max_participants(max_participants: u32) -> Result<()> {
    if max_participants < 1 {
        return Err(TripError::validation("max_participants must be at least 1"));
    }
    if max_participants > MAX_PARTICIPANTS {
        return Err(TripError::validation(format!(
            "max_participants must not exceed {}",
            MAX_PARTICIPANTS
        )));
    }
    Ok(())
}
