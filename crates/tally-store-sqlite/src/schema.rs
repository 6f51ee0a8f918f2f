//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Hours are stored as decimal strings so arithmetic stays exact.
CREATE TABLE IF NOT EXISTS volunteers (
    volunteer_id    TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
    full_name       TEXT NOT NULL,
    role            TEXT NOT NULL,             -- 'volunteer' | 'admin'
    password_hash   TEXT NOT NULL,
    total_hours     TEXT NOT NULL DEFAULT '0',
    this_year_hours TEXT NOT NULL DEFAULT '0',
    hours_year      INTEGER NOT NULL,
    tier            TEXT NOT NULL DEFAULT 'None',
    badges          TEXT NOT NULL DEFAULT '[]', -- JSON array of labels
    referral_code   TEXT NOT NULL UNIQUE,
    referred_by     TEXT,
    referral_count  INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    version         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id    TEXT PRIMARY KEY,
    volunteer_id     TEXT NOT NULL REFERENCES volunteers(volunteer_id),
    activity_name    TEXT NOT NULL,
    service_type     TEXT NOT NULL,
    hours            TEXT NOT NULL,
    service_date     TEXT NOT NULL,            -- YYYY-MM-DD
    description      TEXT NOT NULL,
    proof_reference  TEXT,
    is_historical    INTEGER NOT NULL DEFAULT 0,
    submitted_at     TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending',
    reviewed_at      TEXT,
    reviewed_by      TEXT,
    rejection_reason TEXT,
    version          INTEGER NOT NULL DEFAULT 0,
    CHECK (status IN ('pending', 'approved', 'rejected')),
    CHECK ((status = 'pending') = (reviewed_at IS NULL)),
    CHECK ((status = 'rejected') = (rejection_reason IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS submissions_volunteer_idx ON submissions(volunteer_id);
CREATE INDEX IF NOT EXISTS submissions_status_idx    ON submissions(status);
CREATE INDEX IF NOT EXISTS submissions_date_idx      ON submissions(service_date);

PRAGMA user_version = 1;
";
