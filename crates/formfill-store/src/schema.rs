use rusqlite::Connection;

/// Current schema revision recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Create all tables if missing and record the schema revision
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

// form_id is '' rather than NULL for "no form": UNIQUE treats NULLs as distinct.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_data (
    id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS form_mappings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    form_id TEXT NOT NULL DEFAULT '',
    field_name TEXT NOT NULL,
    field_type TEXT,
    user_field TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 1.0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(domain, form_id, field_name)
);

CREATE TABLE IF NOT EXISTS form_interpretations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    form_id TEXT NOT NULL DEFAULT '',
    interpretation TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0.0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(domain, form_id)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_form_mappings_domain ON form_mappings(domain);
CREATE INDEX IF NOT EXISTS idx_form_interpretations_domain ON form_interpretations(domain);
"#;
