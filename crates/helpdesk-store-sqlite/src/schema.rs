//! SQL schema for the helpdesk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
/// WAL journaling keeps a failed write from ever leaving the file
/// half-written — a rolled-back transaction is invisible to readers.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per active (non-deleted) ticket. Deletion removes the row;
-- the ticket's history survives in audit_log.
CREATE TABLE IF NOT EXISTS tickets (
    ticket_id   TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    category    TEXT NOT NULL,   -- 'purchase' | 'tech_support' | 'general_support' | 'unban_request'
    status      TEXT NOT NULL,   -- 'open' | 'claimed' | 'closed' | 'archived'
    claimed_by  TEXT,
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC
    closed_at   TEXT,
    archived_at TEXT
);

-- The audit log is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_log (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    at         TEXT NOT NULL,
    action     TEXT NOT NULL,    -- 'create' | 'claim' | 'close' | 'archive' | 'delete'
    actor_id   TEXT NOT NULL,
    actor_name TEXT NOT NULL,
    ticket_id  TEXT NOT NULL,
    detail     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tickets_owner_idx  ON tickets(owner_id);
CREATE INDEX IF NOT EXISTS tickets_status_idx ON tickets(status);
CREATE INDEX IF NOT EXISTS audit_ticket_idx   ON audit_log(ticket_id);

PRAGMA user_version = 1;
";
