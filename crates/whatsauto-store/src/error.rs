use std::path::PathBuf;

use thiserror::Error;
use whatsauto_shared::types::{ContactId, ContactStatus};

use crate::record::Collection;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be opened (missing permissions, disk full,
    /// corrupt file...). Nothing downstream can work without it.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// SQLite error outside of open / decode.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A keyed lookup that requires the record found nothing.
    #[error("{collection} record not found: {key}")]
    NotFound { collection: Collection, key: String },

    /// A value could not be encoded for storage or decoded back.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The source of a document payload could not be read.
    #[error("Payload unreadable: {}: {source}", path.display())]
    PayloadUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A status update that would move a contact backwards.
    #[error("Contact {contact}: cannot move from {from} to {to}")]
    InvalidTransition {
        contact: ContactId,
        from: ContactStatus,
        to: ContactStatus,
    },
}

impl StoreError {
    /// Whether this error means the store itself is unusable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::NoDataDir | StoreError::Migration(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub(crate) fn not_found(collection: Collection, key: impl ToString) -> Self {
        StoreError::NotFound {
            collection,
            key: key.to_string(),
        }
    }

    /// Sort a rusqlite error raised while reading rows: decode failures are
    /// serialization errors, everything else stays a database error.
    pub(crate) fn from_read(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(idx, _, source) => {
                StoreError::Serialization(format!("column {idx}: {source}"))
            }
            rusqlite::Error::InvalidColumnType(idx, name, ty) => {
                StoreError::Serialization(format!("column {idx} ({name}): unexpected {ty}"))
            }
            other => StoreError::Sqlite(other),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
