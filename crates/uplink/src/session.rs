//! Session Context - per-session coordinator.
//!
//! Owns every piece of mutable per-session state (channel material,
//! echo tracker, passive aggregator, submission queue, collector
//! credential) as one explicit context object with a single-instance
//! lifecycle, instead of ambient module globals.
//!
//! The model is single-threaded and event-driven: the transport layer
//! calls [`handle_frame`](SessionContext::handle_frame) per received
//! frame, a driver calls [`tick`](SessionContext::tick) with the current
//! location and time, and the outer orchestration signals
//! [`session_started`](SessionContext::session_started) /
//! [`session_ending`](SessionContext::session_ending). Network
//! submission is the only suspending operation.

use echogrid_core::config::{Config, QueueConfig};
use echogrid_core::{format_heard_summary, EntryKind, GeoCoordinate, QueueEntry};
use echogrid_crypto::{derive_material, ChannelMaterial};
use echogrid_mesh::{parse_frame, EchoCandidate, EchoTracker, PassiveAggregator, RawFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::collector::Collector;
use crate::queue::{EnqueueOutcome, FlushDisposition, FlushReason, SubmissionQueue, SubmitOutcome};

/// Point-in-time session status for display layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Queue readout, e.g. `"Queued (3/50)"`
    pub queue_status: String,
    /// Pending entry count
    pub queue_depth: usize,
    /// Open passive observation buffers
    pub passive_buffers: usize,
    /// Whether channel crypto material derived successfully
    pub crypto_available: bool,
    /// Whether the collector revoked the session
    pub revoked: bool,
}

/// Per-session coordinator for correlation, batching, and submission.
pub struct SessionContext<C: Collector> {
    channel_index: u8,
    queue_config: QueueConfig,
    material: Option<ChannelMaterial>,
    tracker: Option<EchoTracker>,
    aggregator: PassiveAggregator,
    queue: SubmissionQueue,
    collector: C,
    credential: Option<String>,
    revoked: bool,
}

impl<C: Collector> SessionContext<C> {
    /// Build a session context from configuration.
    ///
    /// A channel name that fails material derivation does not fail
    /// construction: echo and decrypt dependent features degrade off for
    /// the process lifetime, logged once.
    pub fn new(config: &Config, collector: C) -> Self {
        let material = match derive_material(&config.channel.name) {
            Ok(material) => Some(material),
            Err(e) => {
                warn!(
                    error = %e,
                    channel = %config.channel.name,
                    "channel material derivation failed; echo correlation disabled"
                );
                None
            }
        };

        let tracker = material.clone().map(EchoTracker::new);

        Self {
            channel_index: config.channel.index,
            queue_config: config.queue.clone(),
            material,
            tracker,
            aggregator: PassiveAggregator::new(&config.passive),
            queue: SubmissionQueue::new(&config.queue),
            collector,
            credential: None,
            revoked: false,
        }
    }

    /// Begin a new connected session with the given credential.
    pub fn session_started(&mut self, credential: impl Into<String>, now_ms: u64) {
        let credential = credential.into();
        info!("session started");
        self.credential = Some(credential);
        self.revoked = false;
        self.queue = SubmissionQueue::new(&self.queue_config);
        self.queue.start(now_ms);
    }

    /// Process one raw frame from the transport layer.
    ///
    /// An open echo window gets first claim; unclaimed frames (or all
    /// frames when no window is open) feed the passive aggregator.
    /// Completes synchronously; entries are only created at flush time.
    pub fn handle_frame(&mut self, frame: &RawFrame, location: GeoCoordinate, now_ms: u64) {
        let meta = parse_frame(&frame.bytes);

        let consumed = self
            .tracker
            .as_mut()
            .is_some_and(|tracker| tracker.on_frame(&meta, &frame.signal));

        if !consumed {
            self.aggregator.on_frame(&meta, &frame.signal, location, now_ms);
        }
    }

    /// Open an echo tracking window for a just-sent probe.
    ///
    /// Returns `false` when channel material is unavailable and echo
    /// correlation is disabled.
    pub fn open_echo_window(&mut self, sent_text: &str) -> bool {
        match self.tracker.as_mut() {
            Some(tracker) => {
                tracker.open(sent_text, self.channel_index);
                true
            }
            None => {
                debug!("echo window not opened: channel material unavailable");
                false
            }
        }
    }

    /// Close the echo window, enqueue the TX result, and return ranked
    /// candidates for display.
    ///
    /// A window that heard no echoes still produces a TX entry with the
    /// literal `"None"` summary; silence is coverage data too.
    pub async fn close_echo_window(
        &mut self,
        location: GeoCoordinate,
        now_ms: u64,
    ) -> Vec<EchoCandidate> {
        let Some(tracker) = self.tracker.as_mut() else {
            return Vec::new();
        };
        if !tracker.is_open() {
            return Vec::new();
        }

        let candidates = tracker.close();

        let heard: Vec<(String, f32)> = candidates
            .iter()
            .map(|c| (c.repeater_id.clone(), c.best_snr))
            .collect();
        let entry = QueueEntry::new(
            EntryKind::Tx,
            location,
            format_heard_summary(&heard),
            now_ms,
        );

        if self.enqueue(entry, now_ms) {
            self.flush(FlushReason::Capacity, now_ms).await;
        }

        candidates
    }

    /// Drive timer-based work: aggregator flush triggers and queue
    /// deadlines. The driver supplies current location and time.
    pub async fn tick(&mut self, location: GeoCoordinate, now_ms: u64) {
        let mut capacity_hit = false;
        for entry in self.aggregator.poll_flush(location, now_ms) {
            capacity_hit |= self.enqueue(entry, now_ms);
        }

        if capacity_hit {
            self.flush(FlushReason::Capacity, now_ms).await;
        } else if let Some(reason) = self.queue.due_reason(now_ms) {
            self.flush(reason, now_ms).await;
        }
    }

    /// End the session: drain all open buffers and pending entries into
    /// one final submission, then release the credential. No timers
    /// remain armed afterwards.
    pub async fn session_ending(&mut self, location: GeoCoordinate, now_ms: u64) {
        info!("session ending; draining buffers");

        // An echo window still open at teardown is closed so the probe
        // entry itself is not lost.
        if self.tracker.as_ref().is_some_and(EchoTracker::is_open) {
            self.close_echo_window(location, now_ms).await;
        }

        for entry in self.aggregator.drain(now_ms) {
            self.enqueue(entry, now_ms);
        }

        self.flush(FlushReason::Drain, now_ms).await;
        self.credential = None;
    }

    /// Toggle passive-only RX aggregation.
    pub fn set_passive_enabled(&mut self, enabled: bool) {
        self.aggregator.set_enabled(enabled);
    }

    /// Whether the collector revoked this session.
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Queue readout for the status display, e.g. `"Queued (3/50)"`.
    pub fn queue_status(&self) -> String {
        self.queue.status_line()
    }

    /// Snapshot of the session state for display layers.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            queue_status: self.queue.status_line(),
            queue_depth: self.queue.depth(),
            passive_buffers: self.aggregator.buffer_count(),
            crypto_available: self.material.is_some(),
            revoked: self.revoked,
        }
    }

    /// Enqueue an entry; returns `true` when capacity was reached and an
    /// immediate flush is required.
    fn enqueue(&mut self, entry: QueueEntry, now_ms: u64) -> bool {
        matches!(
            self.queue.enqueue(entry, now_ms),
            EnqueueOutcome::CapacityReached { .. }
        )
    }

    /// Run one flush cycle: take a batch, submit it, apply the outcome.
    async fn flush(&mut self, reason: FlushReason, now_ms: u64) {
        let Some(batch) = self.queue.begin_flush(reason, now_ms) else {
            return;
        };

        let credential = self.credential.clone().unwrap_or_default();
        let outcome = match self.collector.submit(&credential, &batch.entries).await {
            Ok(true) => SubmitOutcome::Accepted,
            Ok(false) => SubmitOutcome::Revoked,
            Err(e) => SubmitOutcome::TransportFailure(e.to_string()),
        };

        if self.queue.finish_flush(batch, outcome) == FlushDisposition::TerminateSession {
            error!("session revoked by collector");
            self.revoked = true;
        }
    }
}
