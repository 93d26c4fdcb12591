use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use whatsauto_shared::constants::{COOLDOWN_MAX_MS, COOLDOWN_MIN_MS};

use crate::error::{Result, WalkerError};

/// Range the pause between two contacts is drawn from, `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    min_ms: u64,
    max_ms: u64,
}

impl CooldownPolicy {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        if max_ms <= min_ms {
            return Err(WalkerError::InvalidCooldown { min_ms, max_ms });
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    /// Uniform draw in whole milliseconds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.min_ms..self.max_ms))
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            min_ms: COOLDOWN_MIN_MS,
            max_ms: COOLDOWN_MAX_MS,
        }
    }
}

/// Delivered to the host when a scheduled step is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wakeup {
    generation: u64,
}

impl Wakeup {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A pending step: a timer task that sends one [`Wakeup`] at `deadline`.
///
/// Dropping the handle aborts the task, so a step can never fire after its
/// owner has let go of it.
#[derive(Debug)]
pub(crate) struct ScheduledStep {
    generation: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

impl ScheduledStep {
    pub(crate) fn spawn(generation: u64, delay: Duration, tx: mpsc::UnboundedSender<Wakeup>) -> Self {
        let deadline = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Receiver gone means the host is shutting down.
            let _ = tx.send(Wakeup { generation });
        });
        Self {
            generation,
            deadline,
            handle,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Drop for ScheduledStep {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
