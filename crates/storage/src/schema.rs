use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA cache_size = -32000;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS settings (
    user_id BLOB PRIMARY KEY CHECK (length(user_id) = 16),
    doc TEXT NOT NULL,
    version INTEGER NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (unixepoch())
);

CREATE TABLE IF NOT EXISTS calendar_days (
    user_id BLOB NOT NULL CHECK (length(user_id) = 16),
    date TEXT NOT NULL,
    cycle_day INTEGER NOT NULL,
    work_type TEXT NOT NULL,
    state TEXT NOT NULL,
    manual_override INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, date)
);
CREATE INDEX IF NOT EXISTS idx_days_override ON calendar_days (user_id, manual_override);

CREATE TABLE IF NOT EXISTS mutations (
    mutation_id BLOB PRIMARY KEY CHECK (length(mutation_id) = 16),
    user_id BLOB NOT NULL CHECK (length(user_id) = 16),
    status TEXT NOT NULL,
    record BLOB NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);
CREATE INDEX IF NOT EXISTS idx_mutations_user ON mutations (user_id, status);

CREATE TABLE IF NOT EXISTS snapshots (
    user_id BLOB NOT NULL CHECK (length(user_id) = 16),
    state_hash TEXT NOT NULL,
    days BLOB NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch()),
    PRIMARY KEY (user_id, state_hash)
);

CREATE TABLE IF NOT EXISTS command_log (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    command_id BLOB NOT NULL CHECK (length(command_id) = 16),
    user_id BLOB NOT NULL CHECK (length(user_id) = 16),
    action TEXT NOT NULL,
    status TEXT NOT NULL,
    before_state TEXT NOT NULL,
    after_state TEXT NOT NULL,
    applied_at INTEGER NOT NULL DEFAULT (unixepoch())
);
CREATE INDEX IF NOT EXISTS idx_command_log_user ON command_log (user_id, status, seq);
";
