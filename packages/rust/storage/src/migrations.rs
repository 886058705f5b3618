//! SQL migration definitions for the PartnerScout database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: potential_partners, previously_considered, search_history",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Scored partner candidates, keyed by company name.
-- List/struct columns hold JSON.
CREATE TABLE IF NOT EXISTS potential_partners (
    id                    TEXT PRIMARY KEY,
    name                  TEXT NOT NULL UNIQUE,
    score                 REAL NOT NULL,
    industry              TEXT NOT NULL,
    description           TEXT NOT NULL DEFAULT '',
    leadership            TEXT NOT NULL DEFAULT '[]',
    products              TEXT NOT NULL DEFAULT '[]',
    opportunities         TEXT NOT NULL DEFAULT '[]',
    market_analysis       TEXT,
    partnership_potential TEXT,
    hq_location           TEXT NOT NULL DEFAULT '',
    website               TEXT NOT NULL DEFAULT '',
    size_range            TEXT NOT NULL DEFAULT '',
    logo                  TEXT NOT NULL DEFAULT '',
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_partners_score ON potential_partners(score);

-- Companies already surfaced by a past run, keyed case-insensitively.
CREATE TABLE IF NOT EXISTS previously_considered (
    name_key      TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    considered_at TEXT NOT NULL
);

-- Append-only log of completed pipeline runs.
CREATE TABLE IF NOT EXISTS search_history (
    id            TEXT PRIMARY KEY,
    timestamp     TEXT NOT NULL,
    search_type   TEXT NOT NULL,
    query         TEXT NOT NULL,
    results_count INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_timestamp ON search_history(timestamp);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
