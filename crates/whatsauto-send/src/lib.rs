//! # whatsauto-send
//!
//! The guided send loop.
//!
//! - [`queue`] projects the persisted contacts, assignments and documents
//!   into the ordered list of contacts still waiting for a send.
//! - [`opener`] is the seam to the outside world that opens a conversation
//!   with one contact.
//! - [`cooldown`] draws the randomized pause between two contacts and owns
//!   the cancellable timer task.
//! - [`walker`] is the state machine that walks the queue one contact at a
//!   time, waiting for the user to acknowledge each send.

pub mod cooldown;
pub mod error;
pub mod opener;
pub mod queue;
pub mod walker;

pub use cooldown::{CooldownPolicy, Wakeup};
pub use error::{OpenError, WalkerError};
pub use opener::{ConversationOpener, OpenRequest, OpenedVia};
pub use queue::{QueueEntry, QueueStats};
pub use walker::{Acknowledgement, SendWalker, WalkerSnapshot, WalkerState};
