//! SQL schema for the Wuloye SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. `body` is the JSON document exactly as written.
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    id          TEXT NOT NULL,
    body        TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC; first write
    updated_at  TEXT NOT NULL,   -- ISO 8601 UTC; last write
    PRIMARY KEY (collection, id)
);

PRAGMA user_version = 1;
";
