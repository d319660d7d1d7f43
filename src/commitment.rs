//! Commitment upsert rule
//!
//! A submission either updates the pledge of an existing contributor
//! (matched by exact name) or adds a new contributor while the trip has
//! free spots. A full trip rejects new names and is left untouched.

use chrono::{DateTime, Utc};

use crate::aggregate::{participant_count, total_committed};
use crate::error::{Result, TripError};
use crate::model::{validate_amount, Commitment, CommitmentSubmission, Trip};

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub commitment: Commitment,
    pub created: bool,
}

/// Applies `submission` to the trip's commitments
///
/// `id` and `now` are only used when a new commitment is appended; an
/// update keeps the original identifier and creation time. On any error the
/// trip is not modified.
pub fn upsert_commitment(
    trip: &mut Trip,
    submission: &CommitmentSubmission,
    id: u64,
    now: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    validate_submission(submission)?;

    // 1. Existing contributor: change the pledge on a copy, keep it only if
    //    the trip total still fits
    if let Some(index) = trip
        .commitments
        .iter()
        .position(|c| c.name == submission.name)
    {
        let mut commitments = trip.commitments.clone();
        commitments[index].amount = submission.amount;
        total_committed(&commitments)?;

        let commitment = commitments[index].clone();
        trip.commitments = commitments;
        return Ok(UpsertOutcome {
            commitment,
            created: false,
        });
    }

    // 2. New contributor: needs a free spot
    if participant_count(&trip.commitments) >= trip.max_participants as usize {
        return Err(TripError::Capacity {
            max_participants: trip.max_participants,
        });
    }
    total_committed(&trip.commitments)?
        .checked_add(submission.amount)
        .ok_or_else(|| TripError::validation("total_committed is too large"))?;

    let commitment = Commitment {
        id,
        trip_id: trip.id,
        user_id: submission
            .user_id
            .clone()
            .filter(|user_id| !user_id.trim().is_empty())
            .unwrap_or_else(|| placeholder_user_id(now)),
        name: submission.name.clone(),
        amount: submission.amount,
        created_at: now,
    };
    trip.commitments.push(commitment.clone());

    Ok(UpsertOutcome {
        commitment,
        created: true,
    })
}

fn validate_submission(submission: &CommitmentSubmission) -> Result<()> {
    if submission.name.trim().is_empty() {
        return Err(TripError::validation("name is required"));
    }
    validate_amount("amount", submission.amount)
}

// Not an identity scheme, just a stable label until real accounts exist
fn placeholder_user_id(now: DateTime<Utc>) -> String {
    format!("user_{}", now.timestamp_millis())
}
