//! SQL schema for the Kado SQLite store.
//!
//! Versions are tracked in `PRAGMA user_version`. Each migration step is
//! additive: it only creates tables and indexes, so upgrading a database
//! written by an older version never touches existing rows. Every statement
//! is `IF NOT EXISTS`, which keeps re-running a step harmless.

/// Connection-level settings applied on every open (outside any transaction).
pub const PRAGMAS: &str = "PRAGMA journal_mode = WAL;";

/// v1: the item catalog and key/value settings.
const V1: &str = "
CREATE TABLE IF NOT EXISTS items (
    item_id            TEXT PRIMARY KEY,
    meaning            TEXT NOT NULL,
    primary_readings   TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    secondary_readings TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    examples           TEXT NOT NULL DEFAULT '[]'    -- JSON array of examples
);

CREATE TABLE IF NOT EXISTS settings (
    key        TEXT PRIMARY KEY,
    value_json TEXT NOT NULL
);
";

/// v2: per-user review state.
///
/// No foreign key to `items`: deleting an item removes its progress rows
/// explicitly in the same transaction.
const V2: &str = "
CREATE TABLE IF NOT EXISTS progress (
    user_id       TEXT    NOT NULL,
    item_id       TEXT    NOT NULL,
    mastery       TEXT,                 -- 'new' | 'learning' | 'known'; NULL reads as 'new'
    interval_days INTEGER NOT NULL DEFAULT 1 CHECK (interval_days > 0),
    last_seen     TEXT,                 -- RFC 3339 UTC or NULL
    PRIMARY KEY (user_id, item_id)
);

CREATE INDEX IF NOT EXISTS progress_item_idx ON progress(item_id);
";

/// v3: append-only score history.
const V3: &str = "
CREATE TABLE IF NOT EXISTS scores (
    score_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    correct         INTEGER NOT NULL CHECK (correct >= 0),
    total           INTEGER NOT NULL CHECK (total >= correct),
    percentage      INTEGER NOT NULL CHECK (percentage BETWEEN 0 AND 100),
    elapsed_seconds INTEGER NOT NULL CHECK (elapsed_seconds >= 0),
    test_kind       TEXT    NOT NULL,
    recorded_at     TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS scores_recorded_idx ON scores(recorded_at);
";

/// Migration steps in order; step `i` upgrades version `i` to `i + 1`.
pub const MIGRATIONS: &[&str] = &[V1, V2, V3];

/// The schema version this build writes.
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;
