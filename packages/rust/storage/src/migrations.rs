//! SQL migration definitions for the scriptwatch database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as a batch.

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
        description: "Initial schema: js_files",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Registered remote JavaScript files.
-- No uniqueness constraint on (company_id, url): duplicate registrations
-- of the same URL by the same tenant are permitted.
CREATE TABLE IF NOT EXISTS js_files (
    id           TEXT PRIMARY KEY,
    url          TEXT NOT NULL,
    host         TEXT NOT NULL,
    content      TEXT,
    priority     INTEGER NOT NULL,
    company_id   TEXT NOT NULL,
    last_fetched TEXT,
    last_updated TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_js_files_company_id ON js_files(company_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
