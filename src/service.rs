//! Trip operations backed by the embedded database
//!
//! Each mutation runs inside a single write transaction. redb admits one
//! writer at a time, so two submissions to the same trip never interleave
//! between reading the commitments and writing them back. A failed
//! operation returns before `commit()` and leaves the database untouched.
//!
//! The domain rules themselves live in [`crate::trip`], [`crate::commitment`]
//! and [`crate::ledger`]; this module loads their inputs and persists their
//! results.

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table};
use tracing::{debug, info, warn};

use crate::aggregate::{summarize, TripSummary};
use crate::commitment::upsert_commitment;
use crate::database::{
    expense_key, expense_range, next_id, peek_next_id, read_expenses, read_trip, trip_not_found,
    write_trip, COMMITMENT_SEQ, EXPENSE_SEQ, TABLE_COUNTERS, TABLE_EXPENSES, TABLE_TRIPS, TRIP_SEQ,
};
use crate::error::{Result, TripError};
use crate::ledger;
use crate::model::{Commitment, CommitmentSubmission, Expense, ExpenseDraft, Trip, TripDraft, TripPatch};
use crate::trip::{apply_patch, build_trip, generate_code};

/// How many random codes to try before giving up on a new trip
pub const MAX_CODE_ATTEMPTS: usize = 16;

/// Creates a trip under a fresh join code
///
/// # Arguments
///
/// * `db` - The database to write to
/// * `draft` - Trip fields as submitted
/// * `code_length` - Length of the generated join code
/// * `now` - Creation time stamped on the trip
///
/// # Returns
///
/// * `Ok(Trip)` - The stored trip, with its code and id
/// * `Err(TripError::Validation)` - The draft is invalid
/// * `Err(TripError::CodeSpaceExhausted)` - Every generated code was taken
///
/// # Database Operations
///
/// 1. Reads `TABLE_TRIPS` to find an unused code
/// 2. Advances the trip sequence in `TABLE_COUNTERS`
/// 3. Inserts the trip into `TABLE_TRIPS`
pub fn create_trip(
    db: &Database,
    draft: &TripDraft,
    code_length: usize,
    now: DateTime<Utc>,
) -> Result<Trip> {
    let write_txn = db.begin_write()?;
    let trip = {
        let mut trips = write_txn.open_table(TABLE_TRIPS)?;
        let mut counters = write_txn.open_table(TABLE_COUNTERS)?;

        // Pick the code and id inside the transaction so no other writer can take them
        let code = unused_code(&trips, code_length)?;
        let id = next_id(&mut counters, TRIP_SEQ)?;

        // An invalid draft returns here and the reserved id is rolled back
        let trip = build_trip(draft, id, code, now)?;

        write_trip(&mut trips, &trip)?;
        trip
    };
    write_txn.commit()?;

    info!(code = %trip.code, id = trip.id, goal = %trip.goal_amount, "trip created");
    Ok(trip)
}

fn unused_code(
    trips: &Table<'_, &'static str, &'static str>,
    code_length: usize,
) -> Result<String> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = generate_code(code_length);
        if trips.get(code.as_str())?.is_none() {
            return Ok(code);
        }
        debug!(attempt, %code, "trip code collision, retrying");
    }

    warn!(code_length, "no free trip code found");
    Err(TripError::CodeSpaceExhausted {
        attempts: MAX_CODE_ATTEMPTS,
    })
}

pub fn get_trip(db: &Database, code: &str) -> Result<Trip> {
    let read_txn = db.begin_read()?;
    let trips = read_txn.open_table(TABLE_TRIPS)?;
    read_trip(&trips, code)
}

/// Commitments of a trip in submission order
pub fn list_commitments(db: &Database, code: &str) -> Result<Vec<Commitment>> {
    Ok(get_trip(db, code)?.commitments)
}

/// Expenses of a trip in the order they were added
///
/// # Returns
///
/// * `Ok(Vec<Expense>)` - Possibly empty
/// * `Err(TripError::NotFound)` - No trip uses `code`
pub fn list_expenses(db: &Database, code: &str) -> Result<Vec<Expense>> {
    let read_txn = db.begin_read()?;
    let trips = read_txn.open_table(TABLE_TRIPS)?;
    if trips.get(code)?.is_none() {
        return Err(trip_not_found(code));
    }

    let expenses = read_txn.open_table(TABLE_EXPENSES)?;
    read_expenses(&expenses, code)
}

/// The trip and its figures, read from one consistent snapshot
pub fn trip_summary(db: &Database, code: &str, now: DateTime<Utc>) -> Result<(Trip, TripSummary)> {
    let read_txn = db.begin_read()?;
    let trip = read_trip(&read_txn.open_table(TABLE_TRIPS)?, code)?;
    let expenses = read_expenses(&read_txn.open_table(TABLE_EXPENSES)?, code)?;

    let summary = summarize(&trip, &expenses, now)?;
    Ok((trip, summary))
}

/// Adds or updates the submitter's commitment
///
/// # Arguments
///
/// * `db` - The database to write to
/// * `code` - Normalized join code of the trip
/// * `submission` - Contributor name and amount
/// * `now` - Creation time for a new commitment
///
/// # Returns
///
/// * `Ok((Commitment, true))` - A new participant was added
/// * `Ok((Commitment, false))` - An existing participant's amount was replaced
/// * `Err(TripError::Capacity)` - The trip is full and the name is new
/// * `Err(TripError::Validation)` - Empty name or bad amount
/// * `Err(TripError::NotFound)` - No trip uses `code`
///
/// # Database Operations
///
/// 1. Reads the trip from `TABLE_TRIPS`
/// 2. Advances the commitment sequence in `TABLE_COUNTERS`, only for a new participant
/// 3. Writes the trip back with its updated commitments
pub fn submit_commitment(
    db: &Database,
    code: &str,
    submission: &CommitmentSubmission,
    now: DateTime<Utc>,
) -> Result<(Commitment, bool)> {
    let write_txn = db.begin_write()?;
    let outcome = {
        let mut trips = write_txn.open_table(TABLE_TRIPS)?;
        let mut counters = write_txn.open_table(TABLE_COUNTERS)?;

        let mut trip = read_trip(&trips, code)?;

        // Updates keep their id, so the sequence is only peeked here
        let id = peek_next_id(&counters, COMMITMENT_SEQ)?;

        let outcome = upsert_commitment(&mut trip, submission, id, now).inspect_err(|err| {
            if let TripError::Capacity { max_participants } = err {
                info!(%code, name = %submission.name, max_participants, "commitment rejected, trip is full");
            }
        })?;

        if outcome.created {
            next_id(&mut counters, COMMITMENT_SEQ)?;
        }
        write_trip(&mut trips, &trip)?;
        outcome
    };
    write_txn.commit()?;

    info!(
        %code,
        name = %outcome.commitment.name,
        amount = %outcome.commitment.amount,
        created = outcome.created,
        "commitment saved"
    );
    Ok((outcome.commitment, outcome.created))
}

/// Records an expense for a trip
///
/// # Arguments
///
/// * `db` - The database to write to
/// * `code` - Normalized join code of the trip
/// * `draft` - Expense fields as submitted
/// * `now` - Creation time stamped on the expense
///
/// # Returns
///
/// * `Ok(Expense)` - The stored expense with its new id
/// * `Err(TripError::Validation)` - Invalid draft, or the ledger total would overflow
/// * `Err(TripError::NotFound)` - No trip uses `code`
///
/// # Database Operations
///
/// 1. Reads the trip from `TABLE_TRIPS` and its expenses from `TABLE_EXPENSES`
/// 2. Advances the expense sequence in `TABLE_COUNTERS`
/// 3. Inserts the expense under `"{code}:{id:020}"` in `TABLE_EXPENSES`
pub fn add_expense(
    db: &Database,
    code: &str,
    draft: &ExpenseDraft,
    now: DateTime<Utc>,
) -> Result<Expense> {
    let write_txn = db.begin_write()?;
    let expense = {
        let trips = write_txn.open_table(TABLE_TRIPS)?;
        let mut expenses = write_txn.open_table(TABLE_EXPENSES)?;
        let mut counters = write_txn.open_table(TABLE_COUNTERS)?;

        let trip = read_trip(&trips, code)?;
        let mut ledger_entries = read_expenses(&expenses, code)?;

        // Validate against the current ledger before reserving an id
        let id = peek_next_id(&counters, EXPENSE_SEQ)?;
        let expense = ledger::add_expense(&mut ledger_entries, trip.id, draft, id, now)?;
        next_id(&mut counters, EXPENSE_SEQ)?;

        let record_json = serde_json::to_string(&expense)?;
        expenses.insert(expense_key(code, expense.id).as_str(), record_json.as_str())?;
        expense
    };
    write_txn.commit()?;

    info!(%code, id = expense.id, amount = %expense.amount, category = %expense.category, "expense added");
    Ok(expense)
}

/// Deletes one expense; an unknown id is not an error
///
/// # Returns
///
/// * `Ok(true)` - The expense was removed
/// * `Ok(false)` - The trip has no expense with `id`
/// * `Err(TripError::NotFound)` - No trip uses `code`
///
/// # Database Operations
///
/// 1. Checks the trip exists in `TABLE_TRIPS`
/// 2. Loads the trip's expenses from `TABLE_EXPENSES`
/// 3. Removes the expense's key only when the ledger held it
pub fn delete_expense(db: &Database, code: &str, id: u64) -> Result<bool> {
    let write_txn = db.begin_write()?;
    let removed = {
        let trips = write_txn.open_table(TABLE_TRIPS)?;
        if trips.get(code)?.is_none() {
            return Err(trip_not_found(code));
        }

        let mut expenses = write_txn.open_table(TABLE_EXPENSES)?;
        let mut ledger_entries = read_expenses(&expenses, code)?;

        let removed = ledger::remove_expense(&mut ledger_entries, id);
        if removed {
            expenses.remove(expense_key(code, id).as_str())?;
        }
        removed
    };
    write_txn.commit()?;

    if removed {
        info!(%code, id, "expense deleted");
    } else {
        debug!(%code, id, "expense already absent");
    }
    Ok(removed)
}

/// Applies a partial update to a trip's details
///
/// # Returns
///
/// * `Ok(Trip)` - The trip as stored after the update
/// * `Err(TripError::Validation)` - A present field is invalid; nothing is changed
/// * `Err(TripError::NotFound)` - No trip uses `code`
pub fn update_trip_details(db: &Database, code: &str, patch: &TripPatch) -> Result<Trip> {
    let write_txn = db.begin_write()?;
    let trip = {
        let mut trips = write_txn.open_table(TABLE_TRIPS)?;
        let mut trip = read_trip(&trips, code)?;
        apply_patch(&mut trip, patch)?;
        write_trip(&mut trips, &trip)?;
        trip
    };
    write_txn.commit()?;

    info!(%code, "trip details updated");
    Ok(trip)
}

/// Deletes a trip together with all of its expenses
///
/// # Returns
///
/// * `Ok(usize)` - Number of expenses removed alongside the trip
/// * `Err(TripError::NotFound)` - No trip uses `code`
///
/// # Database Operations
///
/// 1. Removes the trip (and its commitments) from `TABLE_TRIPS`
/// 2. Collects the trip's expense keys with a range query on `TABLE_EXPENSES`
/// 3. Removes each collected key
pub fn delete_trip(db: &Database, code: &str) -> Result<usize> {
    let write_txn = db.begin_write()?;
    let removed_expenses = {
        let mut trips = write_txn.open_table(TABLE_TRIPS)?;
        if trips.remove(code)?.is_none() {
            return Err(trip_not_found(code));
        }

        let mut expenses = write_txn.open_table(TABLE_EXPENSES)?;

        // Keys are collected first; the range borrows the table
        let keys = {
            let (start_key, end_key) = expense_range(code);
            let mut keys = Vec::new();
            for entry in expenses.range(start_key.as_str()..end_key.as_str())? {
                let (key, _) = entry?;
                keys.push(key.value().to_string());
            }
            keys
        };
        for key in &keys {
            expenses.remove(key.as_str())?;
        }
        keys.len()
    };
    write_txn.commit()?;

    info!(%code, removed_expenses, "trip deleted");
    Ok(removed_expenses)
}
