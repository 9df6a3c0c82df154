//! Database schema definitions
//!
//! The participant table and the status table usually live in two separate
//! database files; both files get the full schema so either can be opened
//! on its own.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    year TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per participant of every lot
CREATE TABLE IF NOT EXISTS lot_participants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    entity_name TEXT NOT NULL,
    entity_tax_id TEXT NOT NULL,
    award_id TEXT NOT NULL,
    participant_id TEXT,
    is_winner INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lot_participants_award ON lot_participants(award_id);
CREATE INDEX IF NOT EXISTS idx_lot_participants_entity ON lot_participants(entity_tax_id);

-- One row per catalog seed; return_code is NULL for unrecognized documents
CREATE TABLE IF NOT EXISTS link_status (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    year TEXT NOT NULL,
    entity_tax_id TEXT NOT NULL,
    entity_name TEXT NOT NULL,
    url TEXT NOT NULL,
    return_code INTEGER,
    outcome TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_link_status_outcome ON link_status(outcome);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
