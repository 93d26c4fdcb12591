use thiserror::Error;
use whatsauto_store::StoreError;

use crate::walker::WalkerState;

/// Failure to open a conversation.
#[derive(Error, Debug)]
pub enum OpenError {
    /// The mechanism does not exist on this system (not configured, program
    /// missing).
    #[error("Opener unavailable: {0}")]
    Unavailable(String),

    /// The user dismissed the share prompt.
    #[error("Share cancelled")]
    Cancelled,

    /// The launcher ran but reported failure.
    #[error("Failed to open conversation: {0}")]
    Launch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpenError {
    /// Cancellation and unavailability are expected outcomes of the share
    /// attempt and are not worth a warning.
    pub fn is_quiet(&self) -> bool {
        matches!(self, OpenError::Cancelled | OpenError::Unavailable(_))
    }
}

#[derive(Error, Debug)]
pub enum WalkerError {
    #[error("No contacts assigned. Please assign PDFs to contacts first.")]
    EmptyQueue,

    #[error("Walker is already {0}")]
    AlreadyActive(WalkerState),

    #[error("Walker is not running")]
    NotRunning,

    #[error("Walker is not paused")]
    NotPaused,

    #[error("No contact is waiting for an acknowledgement")]
    NothingToAcknowledge,

    #[error("Invalid cooldown range: {min_ms}ms..{max_ms}ms")]
    InvalidCooldown { min_ms: u64, max_ms: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, WalkerError>;
