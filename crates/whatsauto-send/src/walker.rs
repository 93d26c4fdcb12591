//! The send walker.
//!
//! Walks the send queue one contact at a time. For each contact it opens the
//! conversation, waits for the user to say what happened (sent, skipped,
//! failed) and then waits a randomized cooldown before the next contact.
//!
//! ```text
//! Idle/Completed --start--> Running --pause--> Paused --resume--> Running
//!                              |
//!                              +--(cursor reaches the end)--> Completed
//! ```
//!
//! The walker never runs on its own. The host drives it: it calls the
//! control methods in response to user input and forwards every [`Wakeup`]
//! received on the channel returned by [`SendWalker::new`] to
//! [`SendWalker::on_wakeup`]. Wakeups that belong to a cancelled cooldown
//! are recognised by their generation and ignored.

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use whatsauto_shared::types::ContactStatus;
use whatsauto_store::{Database, StoreError};

use crate::cooldown::{CooldownPolicy, ScheduledStep, Wakeup};
use crate::error::{Result, WalkerError};
use crate::opener::{ConversationOpener, OpenRequest, OpenedVia};
use crate::queue::{load_queue, QueueEntry, QueueStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkerState {
    Idle,
    Running,
    Paused,
    Completed,
}

impl WalkerState {
    pub fn is_active(&self) -> bool {
        matches!(self, WalkerState::Running | WalkerState::Paused)
    }
}

impl fmt::Display for WalkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WalkerState::Idle => "idle",
            WalkerState::Running => "running",
            WalkerState::Paused => "paused",
            WalkerState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// The user's verdict on the conversation that was just opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    Sent,
    Skipped,
    Failed,
}

/// Everything an observer needs to render the walker.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkerSnapshot {
    pub state: WalkerState,
    pub cursor: usize,
    pub queue_len: usize,
    pub current: Option<QueueEntry>,
    pub awaiting_ack: bool,
    pub opened_via: Option<OpenedVia>,
    pub next_step_at: Option<Instant>,
    pub stats: QueueStats,
}

pub struct SendWalker<'db, O> {
    db: &'db Database,
    opener: O,
    cooldown: CooldownPolicy,
    rng: StdRng,

    state: WalkerState,
    queue: Vec<QueueEntry>,
    stats: QueueStats,
    cursor: usize,
    current: Option<QueueEntry>,
    awaiting_ack: bool,
    opened_via: Option<OpenedVia>,

    scheduled: Option<ScheduledStep>,
    generation: u64,
    wakeup_tx: mpsc::UnboundedSender<Wakeup>,
    snapshot_tx: watch::Sender<WalkerSnapshot>,
}

impl<'db, O: ConversationOpener> SendWalker<'db, O> {
    /// Create an idle walker with the queue loaded from `db`.
    ///
    /// The returned receiver carries cooldown wakeups; the host must pass
    /// each one to [`SendWalker::on_wakeup`].
    pub fn new(
        db: &'db Database,
        opener: O,
        cooldown: CooldownPolicy,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Wakeup>)> {
        let (wakeup_tx, wakeup_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(WalkerSnapshot {
            state: WalkerState::Idle,
            cursor: 0,
            queue_len: 0,
            current: None,
            awaiting_ack: false,
            opened_via: None,
            next_step_at: None,
            stats: QueueStats::default(),
        });

        let mut walker = Self {
            db,
            opener,
            cooldown,
            rng: StdRng::from_entropy(),
            state: WalkerState::Idle,
            queue: Vec::new(),
            stats: QueueStats::default(),
            cursor: 0,
            current: None,
            awaiting_ack: false,
            opened_via: None,
            scheduled: None,
            generation: 0,
            wakeup_tx,
            snapshot_tx,
        };
        walker.reload()?;
        Ok((walker, wakeup_rx))
    }

    /// Replace the cooldown RNG, for reproducible delays.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<WalkerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> WalkerSnapshot {
        WalkerSnapshot {
            state: self.state,
            cursor: self.cursor,
            queue_len: self.queue.len(),
            current: self.current.clone(),
            awaiting_ack: self.awaiting_ack,
            opened_via: self.opened_via,
            next_step_at: self.scheduled.as_ref().map(ScheduledStep::deadline),
            stats: self.stats,
        }
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.as_ref()
    }

    pub fn awaiting_ack(&self) -> bool {
        self.awaiting_ack
    }

    /// Time left until the scheduled step, if one is pending.
    pub fn next_step_in(&self) -> Option<Duration> {
        self.scheduled
            .as_ref()
            .map(|s| s.deadline().saturating_duration_since(Instant::now()))
    }

    /// Rebuild the queue and counters from the store.
    ///
    /// Refused while a run is active: the cursor indexes the queue taken at
    /// start.
    pub fn reload(&mut self) -> Result<()> {
        if self.state.is_active() {
            return Err(WalkerError::AlreadyActive(self.state));
        }
        self.queue = load_queue(self.db)?;
        self.stats = QueueStats::load(self.db)?;
        self.cursor = 0;
        self.publish();
        Ok(())
    }

    /// Begin a run over a freshly built queue and open the first contact.
    pub async fn start(&mut self) -> Result<()> {
        if self.state.is_active() {
            return Err(WalkerError::AlreadyActive(self.state));
        }
        self.reload()?;
        if self.queue.is_empty() {
            return Err(WalkerError::EmptyQueue);
        }

        self.state = WalkerState::Running;
        self.current = None;
        self.awaiting_ack = false;
        self.opened_via = None;
        info!(queued = self.queue.len(), "send run started");

        self.step().await
    }

    /// Cancel the pending cooldown. The current contact and cursor are kept.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != WalkerState::Running {
            return Err(WalkerError::NotRunning);
        }
        self.cancel_scheduled();
        self.state = WalkerState::Paused;
        info!(cursor = self.cursor, "send run paused");
        self.publish();
        Ok(())
    }

    /// Continue a paused run by opening the contact at the cursor again.
    pub async fn resume(&mut self) -> Result<()> {
        if self.state != WalkerState::Paused {
            return Err(WalkerError::NotPaused);
        }
        self.state = WalkerState::Running;
        info!(cursor = self.cursor, "send run resumed");
        self.step().await
    }

    /// Handle a cooldown wakeup. Returns `false` when the wakeup was stale.
    pub async fn on_wakeup(&mut self, wakeup: Wakeup) -> Result<bool> {
        let due = self.state == WalkerState::Running
            && self
                .scheduled
                .as_ref()
                .is_some_and(|s| s.generation() == wakeup.generation());
        if !due {
            debug!(generation = wakeup.generation(), "stale wakeup ignored");
            return Ok(false);
        }

        self.scheduled = None;
        self.step().await?;
        Ok(true)
    }

    pub fn mark_sent(&mut self) -> Result<()> {
        self.acknowledge(Acknowledgement::Sent)
    }

    pub fn skip(&mut self) -> Result<()> {
        self.acknowledge(Acknowledgement::Skipped)
    }

    pub fn mark_failed(&mut self) -> Result<()> {
        self.acknowledge(Acknowledgement::Failed)
    }

    /// Record the verdict on the current contact and move on.
    ///
    /// Skipping writes nothing. The run completes immediately when this was
    /// the last contact; otherwise the next one is scheduled after a
    /// cooldown, unless the run is paused.
    pub fn acknowledge(&mut self, ack: Acknowledgement) -> Result<()> {
        if !self.state.is_active() {
            return Err(WalkerError::NotRunning);
        }
        let contact_id = match (&self.current, self.awaiting_ack) {
            (Some(entry), true) => entry.contact.id,
            _ => return Err(WalkerError::NothingToAcknowledge),
        };

        let status = match ack {
            Acknowledgement::Sent => Some(ContactStatus::Sent),
            Acknowledgement::Failed => Some(ContactStatus::Failed),
            Acknowledgement::Skipped => None,
        };
        if let Some(status) = status {
            match self.db.update_status(contact_id, status, None) {
                Ok(updated) => self.apply_contact_update(updated),
                // Deleted or finished elsewhere while awaiting the answer.
                Err(e @ (StoreError::NotFound { .. } | StoreError::InvalidTransition { .. })) => {
                    warn!(contact = %contact_id.short(), error = %e, "acknowledgement not recorded");
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(contact = %contact_id.short(), ?ack, "contact acknowledged");
        self.awaiting_ack = false;
        self.cursor += 1;
        self.advance()
    }

    /// Open the contact at the cursor, or complete the run.
    async fn step(&mut self) -> Result<()> {
        self.cancel_scheduled();

        let Some(entry) = self.queue.get(self.cursor).cloned() else {
            return self.complete();
        };
        let contact_id = entry.contact.id;
        let request = OpenRequest::for_entry(&entry);
        self.current = Some(entry);
        self.awaiting_ack = false;
        self.opened_via = None;

        let opened = self.opener.open(&request).await;
        match opened {
            Ok(via) => match self.db.update_status(contact_id, ContactStatus::Assigned, None) {
                Ok(updated) => {
                    self.apply_contact_update(updated);
                    self.awaiting_ack = true;
                    self.opened_via = Some(via);
                    info!(
                        contact = %contact_id.short(),
                        label = %request.label,
                        attachment = request.attachment.as_deref().unwrap_or("-"),
                        ?via,
                        "conversation opened, waiting for acknowledgement"
                    );
                    self.publish();
                    Ok(())
                }
                // Deleted or finished elsewhere since the queue was built.
                Err(e @ (StoreError::NotFound { .. } | StoreError::InvalidTransition { .. })) => {
                    warn!(contact = %contact_id.short(), error = %e, "contact changed under the walker, skipping");
                    self.cursor += 1;
                    self.advance()
                }
                Err(e) => Err(e.into()),
            },
            Err(open_error) => {
                warn!(contact = %contact_id.short(), error = %open_error, "could not open conversation");
                match self.db.update_status(
                    contact_id,
                    ContactStatus::Failed,
                    Some(&open_error.to_string()),
                ) {
                    Ok(updated) => self.apply_contact_update(updated),
                    Err(e @ (StoreError::NotFound { .. } | StoreError::InvalidTransition { .. })) => {
                        warn!(contact = %contact_id.short(), error = %e, "failure not recorded");
                    }
                    Err(e) => return Err(e.into()),
                }
                self.cursor += 1;
                self.advance()
            }
        }
    }

    /// After the cursor moved: complete, or schedule the next step.
    fn advance(&mut self) -> Result<()> {
        if self.cursor >= self.queue.len() {
            return self.complete();
        }
        if self.state == WalkerState::Running {
            self.schedule_next();
        }
        self.publish();
        Ok(())
    }

    fn schedule_next(&mut self) {
        self.cancel_scheduled();
        self.generation += 1;
        let delay = self.cooldown.sample(&mut self.rng);
        self.scheduled = Some(ScheduledStep::spawn(
            self.generation,
            delay,
            self.wakeup_tx.clone(),
        ));
        info!(
            delay_secs = delay.as_secs(),
            next = self.cursor,
            "next contact scheduled"
        );
    }

    fn cancel_scheduled(&mut self) {
        if let Some(step) = self.scheduled.take() {
            debug!(generation = step.generation(), "scheduled step cancelled");
        }
    }

    fn complete(&mut self) -> Result<()> {
        self.cancel_scheduled();
        self.state = WalkerState::Completed;
        self.current = None;
        self.awaiting_ack = false;
        self.opened_via = None;
        info!(
            sent = self.stats.sent,
            failed = self.stats.failed,
            "send run completed"
        );
        self.reload()
    }

    /// Keep the queue snapshot and counters in step with a status write.
    fn apply_contact_update(&mut self, updated: whatsauto_store::Contact) {
        if let Some(entry) = self.queue.get_mut(self.cursor) {
            if entry.contact.id == updated.id {
                entry.contact = updated.clone();
            }
        }
        if let Some(current) = self.current.as_mut() {
            if current.contact.id == updated.id {
                current.contact = updated;
            }
        }
        match QueueStats::load(self.db) {
            Ok(stats) => self.stats = stats,
            Err(e) => warn!(error = %e, "could not refresh queue stats"),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use whatsauto_shared::types::{ContactId, ContactOrigin, Variant};
    use whatsauto_store::{Assignment, Contact, Document};

    use crate::error::OpenError;

    /// Records every label it is asked to open. Labels listed in `failing`
    /// fail to open.
    #[derive(Clone, Default)]
    struct RecordingOpener {
        opened: Arc<Mutex<Vec<String>>>,
        failing: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingOpener {
        fn opened(&self) -> Vec<String> {
            self.opened.lock().unwrap().clone()
        }

        fn fail_for(&self, label: &str) {
            self.failing.lock().unwrap().push(label.to_string());
        }
    }

    #[async_trait]
    impl ConversationOpener for RecordingOpener {
        async fn open(&self, request: &OpenRequest) -> std::result::Result<OpenedVia, OpenError> {
            if self.failing.lock().unwrap().contains(&request.label) {
                return Err(OpenError::Launch("launcher exited with 1".into()));
            }
            self.opened.lock().unwrap().push(request.label.clone());
            Ok(OpenedVia::Url)
        }
    }

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("walker.db")).unwrap();
        (dir, db)
    }

    /// Two device contacts X and Y, assigned in that order but left
    /// `pending` so the walker's own status writes are visible.
    fn seed(db: &Database) -> (ContactId, ContactId) {
        let doc = Document::new("invite.pdf", b"%PDF-x".to_vec());
        db.put(&doc).unwrap();
        let x = Contact::new("X", "555-000-0001", ContactOrigin::Device, "1").unwrap();
        let y = Contact::new("Y", "555-000-0002", ContactOrigin::Device, "1").unwrap();
        db.put_many(&[x.clone(), y.clone()]).unwrap();
        db.put_many(&[
            Assignment::new(x.id, doc.id, Variant::TwoMember),
            Assignment::new(y.id, doc.id, Variant::TwoMember),
        ])
        .unwrap();
        (x.id, y.id)
    }

    fn status(db: &Database, id: ContactId) -> ContactStatus {
        db.get_one::<Contact>(&id).unwrap().unwrap().status
    }

    fn walker<'db>(
        db: &'db Database,
        opener: &RecordingOpener,
    ) -> (
        SendWalker<'db, RecordingOpener>,
        mpsc::UnboundedReceiver<Wakeup>,
    ) {
        let (walker, rx) = SendWalker::new(db, opener.clone(), CooldownPolicy::default()).unwrap();
        (walker.with_rng(StdRng::seed_from_u64(11)), rx)
    }

    /// Let the runtime process aborted or woken tasks without moving the
    /// paused clock.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn walks_queue_end_to_end() {
        let (_dir, db) = open_db();
        let (x, y) = seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, mut wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        assert_eq!(opener.opened(), vec!["X"]);
        assert_eq!(status(&db, x), ContactStatus::Assigned);
        assert!(walker.awaiting_ack());

        walker.mark_sent().unwrap();
        assert_eq!(status(&db, x), ContactStatus::Sent);
        let delay = walker.next_step_in().unwrap();
        assert!(delay >= Duration::from_secs(60), "delay {delay:?}");
        assert!(delay < Duration::from_secs(120), "delay {delay:?}");

        let scheduled_at = Instant::now();
        let wakeup = wakeups.recv().await.unwrap();
        assert!(scheduled_at.elapsed() >= delay);
        assert!(walker.on_wakeup(wakeup).await.unwrap());
        assert_eq!(opener.opened(), vec!["X", "Y"]);
        assert_eq!(status(&db, y), ContactStatus::Assigned);

        walker.mark_sent().unwrap();
        assert_eq!(status(&db, y), ContactStatus::Sent);
        assert_eq!(walker.state(), WalkerState::Completed);
        assert!(walker.current().is_none());
        assert!(walker.queue().is_empty());
        assert!(walker.next_step_in().is_none());
        assert_eq!(walker.stats().sent, 2);
        assert_eq!(walker.stats().progress_percent(), 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_during_cooldown_then_resume_opens_next_once() {
        let (_dir, db) = open_db();
        seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, mut wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        walker.mark_sent().unwrap();
        walker.pause().unwrap();
        assert_eq!(walker.state(), WalkerState::Paused);
        assert!(walker.next_step_in().is_none());

        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert!(wakeups.try_recv().is_err());
        assert_eq!(opener.opened(), vec!["X"]);

        walker.resume().await.unwrap();
        assert_eq!(opener.opened(), vec!["X", "Y"]);
        assert!(walker.awaiting_ack());

        // Nothing else is scheduled while Y waits for acknowledgement.
        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert!(wakeups.try_recv().is_err());
        assert_eq!(opener.opened(), vec!["X", "Y"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_while_waiting_reopens_same_contact() {
        let (_dir, db) = open_db();
        let (x, _) = seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, _wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        walker.pause().unwrap();
        walker.resume().await.unwrap();

        assert_eq!(opener.opened(), vec!["X", "X"]);
        assert_eq!(walker.current().unwrap().contact.id, x);
        assert_eq!(walker.cursor(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_wakeup_is_ignored() {
        let (_dir, db) = open_db();
        seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, mut wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        walker.mark_sent().unwrap();
        let wakeup = wakeups.recv().await.unwrap();
        walker.pause().unwrap();

        assert!(!walker.on_wakeup(wakeup).await.unwrap());
        assert_eq!(opener.opened(), vec!["X"]);
    }

    #[tokio::test(start_paused = true)]
    async fn open_failure_marks_failed_and_moves_on() {
        let (_dir, db) = open_db();
        let (x, y) = seed(&db);
        let opener = RecordingOpener::default();
        opener.fail_for("X");
        let (mut walker, mut wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        let failed = db.get_one::<Contact>(&x).unwrap().unwrap();
        assert_eq!(failed.status, ContactStatus::Failed);
        assert!(failed.last_error.unwrap().contains("launcher exited"));
        assert!(!walker.awaiting_ack());
        assert!(walker.next_step_in().is_some());

        let wakeup = wakeups.recv().await.unwrap();
        walker.on_wakeup(wakeup).await.unwrap();
        assert_eq!(opener.opened(), vec!["Y"]);
        assert_eq!(status(&db, y), ContactStatus::Assigned);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_writes_nothing_and_fail_is_terminal() {
        let (_dir, db) = open_db();
        let (x, y) = seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, mut wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        walker.skip().unwrap();
        assert_eq!(status(&db, x), ContactStatus::Assigned);

        let wakeup = wakeups.recv().await.unwrap();
        walker.on_wakeup(wakeup).await.unwrap();
        walker.mark_failed().unwrap();
        assert_eq!(status(&db, y), ContactStatus::Failed);

        // The skipped contact is still queued for the next run.
        assert_eq!(walker.state(), WalkerState::Completed);
        assert_eq!(walker.queue().len(), 1);
        assert_eq!(walker.queue()[0].contact.id, x);
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledging_twice_is_rejected() {
        let (_dir, db) = open_db();
        seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, _wakeups) = walker(&db, &opener);

        assert!(matches!(walker.mark_sent(), Err(WalkerError::NotRunning)));
        walker.start().await.unwrap();
        walker.mark_sent().unwrap();
        assert!(matches!(
            walker.mark_sent(),
            Err(WalkerError::NothingToAcknowledge)
        ));
        assert_eq!(walker.cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn contact_deleted_while_waiting_still_advances() {
        let (_dir, db) = open_db();
        let (x, _) = seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, mut wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        assert!(db.delete::<Contact>(&x).unwrap());

        walker.mark_sent().unwrap();
        assert!(!walker.awaiting_ack());
        assert_eq!(walker.cursor(), 1);
        assert_eq!(walker.state(), WalkerState::Running);

        let wakeup = wakeups.recv().await.unwrap();
        walker.on_wakeup(wakeup).await.unwrap();
        assert_eq!(opener.opened(), vec!["X", "Y"]);
    }

    #[tokio::test(start_paused = true)]
    async fn contact_finished_elsewhere_is_not_a_store_error() {
        let (_dir, db) = open_db();
        let (x, _) = seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, _wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        db.update_status(x, ContactStatus::Sent, None).unwrap();

        walker.mark_failed().unwrap();
        assert_eq!(status(&db, x), ContactStatus::Sent);
        assert_eq!(walker.cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_can_complete_the_run_on_its_own() {
        let (_dir, db) = open_db();
        let doc = Document::new("invite.pdf", b"%PDF-x".to_vec());
        let only = Contact::new("Solo", "555-000-0009", ContactOrigin::Device, "1").unwrap();
        db.put(&doc).unwrap();
        db.put(&only).unwrap();
        db.put(&Assignment::new(only.id, doc.id, Variant::TwoMember)).unwrap();
        let opener = RecordingOpener::default();
        opener.fail_for("Solo");
        let (mut walker, _wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        assert_eq!(walker.state(), WalkerState::Completed);
        assert_eq!(status(&db, only.id), ContactStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_refuses_to_start() {
        let (_dir, db) = open_db();
        let opener = RecordingOpener::default();
        let (mut walker, _wakeups) = walker(&db, &opener);

        assert!(matches!(walker.start().await, Err(WalkerError::EmptyQueue)));
        assert_eq!(walker.state(), WalkerState::Idle);
        assert!(opener.opened().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_walker_cancels_the_cooldown() {
        let (_dir, db) = open_db();
        seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, mut wakeups) = walker(&db, &opener);

        walker.start().await.unwrap();
        walker.mark_sent().unwrap();
        drop(walker);

        assert!(wakeups.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_follow_the_run() {
        let (_dir, db) = open_db();
        seed(&db);
        let opener = RecordingOpener::default();
        let (mut walker, _wakeups) = walker(&db, &opener);
        let snapshots = walker.subscribe();

        walker.start().await.unwrap();
        let snap = snapshots.borrow().clone();
        assert_eq!(snap.state, WalkerState::Running);
        assert_eq!(snap.queue_len, 2);
        assert!(snap.awaiting_ack);
        assert_eq!(snap.opened_via, Some(OpenedVia::Url));
        assert_eq!(snap.current.unwrap().contact.name, "X");

        walker.mark_sent().unwrap();
        let snap = snapshots.borrow().clone();
        assert_eq!(snap.cursor, 1);
        assert!(snap.next_step_at.is_some());
        assert_eq!(snap.stats.sent, 1);
    }
}
