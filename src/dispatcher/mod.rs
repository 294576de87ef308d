//! Batch dispatcher — owns one run from counting through completion.
//!
//! The dispatcher is the only component with a view of the whole run: it
//! pulls candidates from the enumerator, prices each upload with the
//! timeout planner, calls the archive-check client, accumulates outcomes,
//! and hands the finished map to the exporter. Submodules:
//! - [`run`] — the counting/processing state machine
//!
//! Consumers subscribe to [`Event`]s and may cancel cooperatively; an
//! in-flight upload finishes before cancellation is honored on the next
//! file.

mod run;


use crate::config::RunConfig;
use crate::error::Result;
use crate::types::{Event, RunReport};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Event buffer size. A subscriber that falls further behind than this
/// receives a `Lagged` error instead of blocking the worker.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Drives one batch run (cloneable - all fields are cheaply shared).
///
/// One dispatcher corresponds to one run; its cancellation token is
/// one-shot, so a canceled dispatcher is done for good. Construct a fresh
/// dispatcher for the next run.
#[derive(Clone)]
pub struct BatchDispatcher {
    /// Immutable run configuration, validated at construction
    pub(crate) config: Arc<RunConfig>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Cooperative cancellation, checked at file-loop boundaries only
    pub(crate) cancel: CancellationToken,
}

impl BatchDispatcher {
    /// Validate the configuration and build a dispatcher for it.
    ///
    /// Validation failures (missing root directory, malformed endpoint)
    /// reject here, before any work starts and before any event is emitted.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to run events.
    ///
    /// Multiple subscribers are supported; each receives all events emitted
    /// after it subscribed. With no subscribers, events are dropped
    /// silently and the run proceeds regardless.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Request cancellation.
    ///
    /// Best-effort eventual: an upload already in flight completes and its
    /// outcome is recorded; the run stops before starting the next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The configuration this dispatcher was built with.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Spawn the run on a dedicated worker task and return its handle.
    ///
    /// Progress and cancellation remain observable from other tasks while
    /// the worker processes files strictly sequentially.
    pub fn start(&self) -> tokio::task::JoinHandle<RunReport> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.run().await })
    }

    /// Emit an event to all subscribers; dropped silently when nobody
    /// listens.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    pub(crate) fn emit_progress(&self, percent: u8) {
        self.emit_event(Event::Progress { percent });
    }

    pub(crate) fn emit_status(&self, message: impl Into<String>) {
        self.emit_event(Event::Status {
            message: message.into(),
        });
    }

    pub(crate) fn emit_error(&self, message: impl Into<String>) {
        self.emit_event(Event::Error {
            message: message.into(),
        });
    }
}
