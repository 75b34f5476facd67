//! SQL schema for the Likeness SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,       -- ISO 8601 UTC; server-assigned
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,       -- argon2 PHC string
    is_verified   INTEGER NOT NULL DEFAULT 0,
    permissions   INTEGER NOT NULL DEFAULT 15  -- read|write|delete|update
);

-- The embedding is immutable once stored; only label is ever updated.
CREATE TABLE IF NOT EXISTS faces (
    face_id     TEXT PRIMARY KEY,
    uploaded_by TEXT NOT NULL,
    uploaded_at TEXT NOT NULL,
    blob        BLOB NOT NULL,
    embedding   TEXT NOT NULL,         -- JSON float array
    label       TEXT
);

CREATE INDEX IF NOT EXISTS faces_uploader_idx ON faces(uploaded_by);

PRAGMA user_version = 1;
";
