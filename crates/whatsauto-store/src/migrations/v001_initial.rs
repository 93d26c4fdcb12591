//! v001 -- Initial schema creation.
//!
//! Creates the three collections: `documents`, `contacts` and `assignments`.
//! There are deliberately no foreign keys: deleting a document or contact
//! leaves its assignment in place.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents (uploaded invitation PDFs)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name         TEXT NOT NULL,
    payload      BLOB NOT NULL,               -- raw file bytes
    uploaded_at  TEXT NOT NULL,               -- ISO-8601 / RFC-3339
    variants     TEXT NOT NULL,               -- JSON {"two-member":bool,"all-member":bool}
    size         INTEGER NOT NULL,
    mime_type    TEXT NOT NULL,
    content_hash TEXT NOT NULL                -- hex-encoded BLAKE3 of payload
);

CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at);

-- ----------------------------------------------------------------
-- Contacts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS contacts (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT NOT NULL,
    phone         TEXT NOT NULL,              -- canonical +<digits>
    display_phone TEXT NOT NULL,
    origin        TEXT NOT NULL,              -- device | file
    status        TEXT NOT NULL DEFAULT 'pending',
    last_sent_at  TEXT,                       -- ISO-8601, nullable
    last_error    TEXT
);

CREATE INDEX IF NOT EXISTS idx_contacts_phone ON contacts(phone);
CREATE INDEX IF NOT EXISTS idx_contacts_status ON contacts(status);

-- ----------------------------------------------------------------
-- Assignments (one per contact)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS assignments (
    contact_id  TEXT PRIMARY KEY NOT NULL,    -- contacts(id), not enforced
    document_id TEXT NOT NULL,                -- documents(id), not enforced
    variant     TEXT NOT NULL,                -- two-member | all-member
    assigned_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_assignments_document_id ON assignments(document_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
