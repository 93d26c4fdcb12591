//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. The host opens it once and
//! hands out references; there is no process-wide instance.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "whatsauto.db";

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Platform default location of the database file:
    /// - Linux:   `~/.local/share/whatsauto/whatsauto.db`
    /// - macOS:   `~/Library/Application Support/app.whatsauto.whatsauto/whatsauto.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\whatsauto\whatsauto\data\whatsauto.db`
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("app", "whatsauto", "whatsauto").ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().join(DB_FILE_NAME))
    }

    /// Open (or create) the default application database.
    pub fn new() -> Result<Self> {
        let db_path = Self::default_path()?;
        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path, creating missing
    /// parent directories.
    ///
    /// Any failure here is reported as [`StoreError::Unavailable`] (or
    /// [`StoreError::Migration`]) so callers can tell "no storage at all"
    /// apart from per-record problems.
    pub fn open_at(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening database");

        let unavailable = |e: &dyn std::fmt::Display| {
            StoreError::Unavailable(format!("{}: {e}", path.display()))
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(&e))?;
        }

        let conn = Connection::open(path).map_err(|e| unavailable(&e))?;

        // WAL keeps readers unblocked while a batch import is committing.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| unavailable(&e))?;

        migrations::run_migrations(&conn).map_err(|e| match e {
            StoreError::Sqlite(e) => unavailable(&e),
            other => other,
        })?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());
        assert!(path.exists());

        // Reopening an existing file runs no migration twice.
        drop(db);
        Database::open_at(&path).expect("should reopen");
    }

    #[test]
    fn unopenable_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let err = Database::open_at(dir.path()).err().expect("should fail");
        assert!(err.is_unavailable(), "got {err:?}");
    }
}
