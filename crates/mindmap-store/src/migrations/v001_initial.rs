//! v001 -- Initial schema creation.
//!
//! Creates the `mindmaps` table: one row per project holding its sealed
//! document.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS mindmaps (
    id             TEXT PRIMARY KEY NOT NULL,   -- UUID v4, or 'default'
    name           TEXT NOT NULL,
    encrypted_data TEXT NOT NULL DEFAULT '',    -- base64 envelope, '' = no document yet
    updated_at     TEXT NOT NULL                -- RFC-3339, fixed-width UTC
);

CREATE INDEX IF NOT EXISTS idx_mindmaps_updated_at
    ON mindmaps(updated_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
