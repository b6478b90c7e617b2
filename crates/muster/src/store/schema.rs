//! `SQLite` schema definitions for the check-in store.
//!
//! The database is laid out as a small key-value store: named append-only
//! lists of JSON values and named integer counters.

/// SQL statement to create the list entries table.
///
/// `position` orders entries within a list by insertion.
pub const CREATE_LIST_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS list_entries (
    position INTEGER PRIMARY KEY AUTOINCREMENT,
    list_key TEXT NOT NULL,
    value TEXT NOT NULL
)
";

/// SQL statement to create an index for reading one list in order.
pub const CREATE_LIST_KEY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_list_entries_key ON list_entries(list_key, position)
";

/// SQL statement to create the counters table.
pub const CREATE_COUNTERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS counters (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Increment a counter, creating it at 1, and return the new value.
pub const INCREMENT_COUNTER: &str = r"
INSERT INTO counters (key, value) VALUES (?1, 1)
ON CONFLICT(key) DO UPDATE SET value = value + 1
RETURNING value
";

/// Set a counter to an explicit value.
pub const SET_COUNTER: &str = r"
INSERT INTO counters (key, value) VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_LIST_ENTRIES_TABLE,
    CREATE_LIST_KEY_INDEX,
    CREATE_COUNTERS_TABLE,
    CREATE_METADATA_TABLE,
];
