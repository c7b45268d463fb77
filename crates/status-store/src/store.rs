//! The polling status store.
//!
//! One store instance exclusively owns one snapshot. Polls and command
//! responses funnel through a single application path that tags every
//! request with a monotonically increasing sequence number at issue time
//! and discards any response older than the last one applied, so a slow
//! poll can never overwrite a newer snapshot. A liveness flag checked
//! before every mutation keeps responses that arrive after `stop()` from
//! touching a dead store.

use crate::transport::{StatusTransport, TransportError};
use autopilot_core::{BotStatus, ControlAction, RiskConfigUpdate};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Display phase of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// No snapshot has been confirmed yet; the default shape is shown.
    Loading,
    /// At least one response has been applied.
    Ready,
}

/// Immutable view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreView {
    pub phase: StorePhase,
    pub snapshot: BotStatus,
    /// True while a command round trip is in flight.
    pub saving: bool,
    /// Most recent failure message; cleared by the next applied success.
    pub last_error: Option<String>,
}

/// Errors returned by command submission.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another command is still in flight; the store does not queue.
    #[error("a command is already in flight")]
    CommandInFlight,

    /// The command round trip failed; the message is also recorded on the
    /// store view.
    #[error("{0}")]
    Transport(String),
}

struct StoreState {
    phase: StorePhase,
    snapshot: BotStatus,
    saving: bool,
    last_error: Option<String>,
    last_applied_seq: u64,
}

impl StoreState {
    fn view(&self) -> StoreView {
        StoreView {
            phase: self.phase,
            snapshot: self.snapshot.clone(),
            saving: self.saving,
            last_error: self.last_error.clone(),
        }
    }
}

struct StoreInner {
    transport: Arc<dyn StatusTransport>,
    alive: AtomicBool,
    next_seq: AtomicU64,
    state: Mutex<StoreState>,
    watch_tx: watch::Sender<StoreView>,
}

impl StoreInner {
    fn issue_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Applies a successful response unless the store died or a newer
    /// response already landed.
    fn apply_success(&self, seq: u64, body: &Value) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        let mut state = self.state.lock();
        if seq < state.last_applied_seq {
            tracing::debug!(
                seq,
                last_applied = state.last_applied_seq,
                "discarding stale response"
            );
            return;
        }

        state.snapshot = BotStatus::from_partial(body);
        state.phase = StorePhase::Ready;
        state.last_error = None;
        state.last_applied_seq = seq;
        let _ = self.watch_tx.send(state.view());
    }

    /// Records a failure without disturbing the last-known-good snapshot.
    fn record_failure(&self, error: &TransportError) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        let mut state = self.state.lock();
        state.last_error = Some(error.to_string());
        let _ = self.watch_tx.send(state.view());
    }

    fn set_saving(&self, saving: bool) {
        let mut state = self.state.lock();
        state.saving = saving;
        let _ = self.watch_tx.send(state.view());
    }
}

/// Owns the authoritative client-side snapshot and the poll timer.
pub struct StatusStore {
    inner: Arc<StoreInner>,
    poll_interval: Duration,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusStore {
    /// Creates a stopped store around the given transport. Call [`start`]
    /// to begin polling.
    ///
    /// [`start`]: StatusStore::start
    #[must_use]
    pub fn new(transport: Arc<dyn StatusTransport>, poll_interval: Duration) -> Self {
        let state = StoreState {
            phase: StorePhase::Loading,
            snapshot: BotStatus::default(),
            saving: false,
            last_error: None,
            last_applied_seq: 0,
        };
        let (watch_tx, _) = watch::channel(state.view());

        Self {
            inner: Arc::new(StoreInner {
                transport,
                alive: AtomicBool::new(true),
                next_seq: AtomicU64::new(1),
                state: Mutex::new(state),
                watch_tx,
            }),
            poll_interval,
            poll_task: Mutex::new(None),
        }
    }

    /// Launches the repeating poll timer. The first poll fires immediately.
    ///
    /// Each firing spawns an independent fetch; firings never wait on prior
    /// polls, so overlapping polls are possible and the sequence guard in
    /// the application path restores ordering. Calling `start` on a running
    /// store is a no-op.
    pub fn start(&self) {
        let mut task = self.poll_task.lock();
        if task.is_some() {
            return;
        }

        let inner = self.inner.clone();
        let interval_duration = self.poll_interval;
        *task = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval_duration);
            loop {
                tick.tick().await;
                if !inner.alive.load(Ordering::SeqCst) {
                    break;
                }

                let seq = inner.issue_seq();
                let worker = inner.clone();
                tokio::spawn(async move {
                    match worker.transport.fetch_status().await {
                        Ok(body) => worker.apply_success(seq, &body),
                        Err(err) => {
                            tracing::warn!("status poll failed: {err}");
                            worker.record_failure(&err);
                        }
                    }
                });
            }
        }));
    }

    /// Cancels the poll timer and marks the store dead; responses still in
    /// flight are discarded on arrival. Idempotent.
    pub fn stop(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        if let Some(task) = self.poll_task.lock().take() {
            task.abort();
        }
    }

    /// Returns the current view.
    #[must_use]
    pub fn view(&self) -> StoreView {
        self.inner.state.lock().view()
    }

    /// Subscribes to view changes; a fresh view is sent after every
    /// mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreView> {
        self.inner.watch_tx.subscribe()
    }

    /// True while a command round trip is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.inner.state.lock().saving
    }

    /// Sends a control command and applies the resulting snapshot.
    ///
    /// # Errors
    /// Returns [`StoreError::CommandInFlight`] if another command has not
    /// completed, or [`StoreError::Transport`] if the round trip failed (the
    /// failure is also recorded on the view).
    pub async fn send_control(&self, action: ControlAction) -> Result<(), StoreError> {
        self.begin_command()?;
        let seq = self.inner.issue_seq();
        let result = self.inner.transport.send_control(action).await;
        self.finish_command(seq, result)
    }

    /// Submits new risk limits and applies the snapshot echoing the
    /// agent-acknowledged values.
    ///
    /// # Errors
    /// Returns [`StoreError::CommandInFlight`] if another command has not
    /// completed, or [`StoreError::Transport`] if the round trip failed (the
    /// failure is also recorded on the view).
    pub async fn update_risk_config(&self, update: RiskConfigUpdate) -> Result<(), StoreError> {
        self.begin_command()?;
        let seq = self.inner.issue_seq();
        let result = self.inner.transport.update_risk_config(update).await;
        self.finish_command(seq, result)
    }

    /// Single-slot in-flight guard.
    fn begin_command(&self) -> Result<(), StoreError> {
        let mut state = self.inner.state.lock();
        if state.saving {
            return Err(StoreError::CommandInFlight);
        }
        state.saving = true;
        let _ = self.inner.watch_tx.send(state.view());
        Ok(())
    }

    fn finish_command(
        &self,
        seq: u64,
        result: Result<Value, TransportError>,
    ) -> Result<(), StoreError> {
        self.inner.set_saving(false);

        match result {
            Ok(body) => {
                self.inner.apply_success(seq, &body);
                Ok(())
            }
            Err(err) => {
                self.inner.record_failure(&err);
                Err(StoreError::Transport(err.to_string()))
            }
        }
    }
}

impl Drop for StatusStore {
    fn drop(&mut self) {
        self.stop();
    }
}
