//! v002 -- Keep the number exactly as the user entered it.
//!
//! Rows written before this version get their canonical number as the raw
//! input.

use rusqlite::Connection;

const UP_SQL: &str = r#"
ALTER TABLE contacts ADD COLUMN raw_phone TEXT NOT NULL DEFAULT '';
UPDATE contacts SET raw_phone = phone WHERE raw_phone = '';
"#;

/// Apply the raw phone migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
