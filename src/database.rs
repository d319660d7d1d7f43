//! Database initialization and table definitions
//!
//! This module handles the setup of the embedded redb database. Records are
//! stored as JSON strings, keyed so that everything belonging to one trip
//! can be found from its join code.

use redb::{Database, ReadableTable, Table, TableDefinition};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, TripError};
use crate::model::{Expense, Trip};

/// Main table for trips, commitments included
///
/// Key: Join code
/// Value: JSON-serialized Trip
///
/// Example:
/// - Key: "k3x9qa"
/// - Value: '{"id":1,"name":"Summer Beach Trip","code":"k3x9qa",...,"commitments":[...]}'
pub const TABLE_TRIPS: TableDefinition<&str, &str> = TableDefinition::new("trips_v1");

/// Expenses grouped by trip
///
/// Key: Composite key in format "{code}:{expense_id:020}"
/// Value: JSON-serialized Expense
///
/// The zero-padded id keeps a trip's expenses in insertion order and lets a
/// single range query fetch (or cascade-delete) all of them.
pub const TABLE_EXPENSES: TableDefinition<&str, &str> = TableDefinition::new("expenses_v1");

/// Monotonic id sequences, one row per entity kind
pub const TABLE_COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters_v1");

pub const TRIP_SEQ: &str = "trip";
pub const COMMITMENT_SEQ: &str = "commitment";
pub const EXPENSE_SEQ: &str = "expense";

/// Application state shared across all request handlers
///
/// This struct wraps the database and the runtime configuration in `Arc`s
/// for cheap cloning into each async handler.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database
    pub db: Arc<Database>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}

/// Creates or opens the database file and makes sure every table exists
///
/// This function:
/// 1. Creates or opens the database file at the specified path
/// 2. Opens the trips, expenses and counters tables
/// 3. Commits the transaction to ensure tables are persisted
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "data.db")
///
/// # Returns
///
/// * `Ok(Database)` - Successfully initialized database instance
/// * `Err(TripError::Storage)` - The file could not be opened or the tables created
///
/// # Example
///
/// ```no_run
/// # use tripfund::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database> {
    // Create or open the database file
    let db = Database::create(db_path)?;

    // Begin a write transaction to create tables
    let write_txn = db.begin_write()?;
    {
        // Open (or create if not exists) every table
        write_txn.open_table(TABLE_TRIPS)?;
        write_txn.open_table(TABLE_EXPENSES)?;
        write_txn.open_table(TABLE_COUNTERS)?;
    }

    // Commit the transaction to persist the table structures
    write_txn.commit()?;

    Ok(db)
}

/// Key of one expense in `TABLE_EXPENSES`
///
/// Example: `expense_key("k3x9qa", 7)` is "k3x9qa:00000000000000000007"
pub fn expense_key(code: &str, id: u64) -> String {
    format!("{}:{:020}", code, id)
}

/// Bounds covering every expense key of one trip
///
/// '{' sorts right after the digits, so "{code}:{" closes the range.
pub fn expense_range(code: &str) -> (String, String) {
    (format!("{}:", code), format!("{}:{{", code))
}

pub fn trip_not_found(code: &str) -> TripError {
    TripError::NotFound(format!("Trip '{}'", code))
}

/// Loads and deserializes one trip
///
/// Works on both read-only and writable tables.
///
/// # Returns
///
/// * `Ok(Trip)` - The stored trip, commitments included
/// * `Err(TripError::NotFound)` - No trip uses `code`
/// * `Err(TripError::Serialization)` - The stored record is not a valid trip
pub fn read_trip<T>(table: &T, code: &str) -> Result<Trip>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let guard = table.get(code)?.ok_or_else(|| trip_not_found(code))?;
    Ok(serde_json::from_str(guard.value())?)
}

/// Serializes `trip` and stores it under its join code, replacing any previous record
pub fn write_trip(table: &mut Table<'_, &'static str, &'static str>, trip: &Trip) -> Result<()> {
    let record_json = serde_json::to_string(trip)?;
    table.insert(trip.code.as_str(), record_json.as_str())?;
    Ok(())
}

/// All expenses of a trip, in id order
pub fn read_expenses<T>(table: &T, code: &str) -> Result<Vec<Expense>>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let (start_key, end_key) = expense_range(code);

    let mut expenses = Vec::new();
    for entry in table.range(start_key.as_str()..end_key.as_str())? {
        let (_, value) = entry?;
        expenses.push(serde_json::from_str::<Expense>(value.value())?);
    }
    Ok(expenses)
}

/// The id the next record of `seq` would get, without reserving it
pub fn peek_next_id<T>(counters: &T, seq: &str) -> Result<u64>
where
    T: ReadableTable<&'static str, u64>,
{
    let current = counters.get(seq)?.map(|guard| guard.value()).unwrap_or(0);
    Ok(current + 1)
}

/// Reserves and returns the next id of `seq`
pub fn next_id(counters: &mut Table<'_, &'static str, u64>, seq: &str) -> Result<u64> {
    let id = peek_next_id(&*counters, seq)?;
    counters.insert(seq, id)?;
    Ok(id)
}
