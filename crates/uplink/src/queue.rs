//! Submission queue with capacity, debounce, and periodic flush policy.
//!
//! Entries accumulate in arrival order. Three triggers force a batch
//! out: hitting the capacity ceiling, a short debounce window re-armed
//! on every TX enqueue (so near-simultaneous RX entries ride the same
//! batch), and an independent periodic deadline that guarantees flush
//! under low traffic.
//!
//! Flushing is split in two so a single in-flight guard makes it
//! reentrant-safe without locks: [`SubmissionQueue::begin_flush`]
//! atomically takes the live buffer and sets the guard (a concurrent
//! call while one is outstanding is a no-op), and
//! [`SubmissionQueue::finish_flush`] applies the submission outcome and
//! clears the guard.

use echogrid_core::config::QueueConfig;
use echogrid_core::{EntryKind, QueueEntry};
use tracing::{debug, info, warn};

/// Why a flush was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// Queue reached its capacity ceiling
    Capacity,
    /// Debounce window after a TX enqueue elapsed
    Debounce,
    /// Periodic low-traffic guarantee fired
    Periodic,
    /// Final drain at session teardown
    Drain,
    /// Explicit caller request
    Manual,
}

/// Result of appending an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Entry appended; queue depth after the append
    Queued {
        /// Current number of pending entries
        depth: usize,
    },
    /// Entry appended and the capacity ceiling was reached; the caller
    /// must flush immediately
    CapacityReached {
        /// Current number of pending entries
        depth: usize,
    },
    /// Queue is not accepting entries (session revoked or ended)
    NotAccepting,
}

/// A batch taken from the queue for one submission attempt.
#[derive(Debug)]
pub struct Batch {
    /// Why this batch was taken
    pub reason: FlushReason,
    /// Entries in arrival order
    pub entries: Vec<QueueEntry>,
}

/// Outcome of submitting a batch to the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Collector accepted the batch
    Accepted,
    /// Collector rejected the session credential
    Revoked,
    /// Transport or HTTP failure after bounded retry
    TransportFailure(String),
}

/// What the caller should do after a finished flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDisposition {
    /// Batch is considered delivered (including fail-open drops)
    Delivered,
    /// Batch was re-queued per the requeue policy
    Requeued,
    /// Session credential is invalid; terminate the session
    TerminateSession,
}

/// Ordered, capacity-bounded queue of telemetry entries.
#[derive(Debug)]
pub struct SubmissionQueue {
    entries: Vec<QueueEntry>,
    capacity: usize,
    debounce_ms: u64,
    periodic_flush_ms: u64,
    requeue_on_failure: bool,
    accepting: bool,
    in_flight: bool,
    debounce_deadline_ms: Option<u64>,
    periodic_deadline_ms: Option<u64>,
    consecutive_failures: u32,
}

impl SubmissionQueue {
    /// Create a queue from the queue configuration section. The queue
    /// accepts entries immediately; [`start`](Self::start) arms the
    /// periodic deadline for a new session.
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            entries: Vec::new(),
            capacity: config.capacity,
            debounce_ms: config.debounce_ms,
            periodic_flush_ms: config.periodic_flush_ms,
            requeue_on_failure: config.requeue_on_failure,
            accepting: true,
            in_flight: false,
            debounce_deadline_ms: None,
            periodic_deadline_ms: None,
            consecutive_failures: 0,
        }
    }

    /// Reset for a new session: clear entries and deadlines, resume
    /// accepting, arm the periodic deadline.
    pub fn start(&mut self, now_ms: u64) {
        self.entries.clear();
        self.accepting = true;
        self.in_flight = false;
        self.debounce_deadline_ms = None;
        self.periodic_deadline_ms = Some(now_ms + self.periodic_flush_ms);
        self.consecutive_failures = 0;
    }

    /// Append an entry, preserving arrival order.
    ///
    /// A TX enqueue (re)arms the debounce deadline. Reaching the
    /// capacity ceiling is reported so the caller flushes immediately.
    pub fn enqueue(&mut self, entry: QueueEntry, now_ms: u64) -> EnqueueOutcome {
        if !self.accepting {
            debug!("entry dropped: queue not accepting");
            return EnqueueOutcome::NotAccepting;
        }

        if entry.kind == EntryKind::Tx {
            self.debounce_deadline_ms = Some(now_ms + self.debounce_ms);
        }

        self.entries.push(entry);
        let depth = self.entries.len();

        if depth >= self.capacity {
            EnqueueOutcome::CapacityReached { depth }
        } else {
            EnqueueOutcome::Queued { depth }
        }
    }

    /// Number of pending entries.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Human-readable queue status, e.g. `"Queued (3/50)"`.
    pub fn status_line(&self) -> String {
        format!("Queued ({}/{})", self.entries.len(), self.capacity)
    }

    /// Whether a submission is currently outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the queue accepts new entries.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Transport failures since the last successful submission.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Earliest armed deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.debounce_deadline_ms, self.periodic_deadline_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Which timer-driven flush is due at `now_ms`, if any. Polling a
    /// deadline that has not elapsed is a no-op.
    pub fn due_reason(&self, now_ms: u64) -> Option<FlushReason> {
        if matches!(self.debounce_deadline_ms, Some(deadline) if now_ms >= deadline) {
            return Some(FlushReason::Debounce);
        }
        if matches!(self.periodic_deadline_ms, Some(deadline) if now_ms >= deadline) {
            return Some(FlushReason::Periodic);
        }
        None
    }

    /// Atomically take the current contents for one submission.
    ///
    /// Sets the in-flight guard; a call while a submission is already
    /// outstanding returns `None`, as does an empty queue. Both timer
    /// deadlines are serviced here: the debounce deadline is cleared and
    /// the periodic deadline re-armed, even when there is nothing to
    /// send.
    pub fn begin_flush(&mut self, reason: FlushReason, now_ms: u64) -> Option<Batch> {
        if self.in_flight {
            debug!(?reason, "flush skipped: submission already in flight");
            return None;
        }

        self.debounce_deadline_ms = None;
        self.periodic_deadline_ms = Some(now_ms + self.periodic_flush_ms);

        if self.entries.is_empty() {
            return None;
        }

        self.in_flight = true;
        let entries = std::mem::take(&mut self.entries);
        info!(?reason, count = entries.len(), "flush started");
        Some(Batch { reason, entries })
    }

    /// Apply the submission outcome for a batch taken by
    /// [`begin_flush`](Self::begin_flush) and clear the in-flight guard.
    ///
    /// Transport failures are fail-open: the batch is treated as
    /// delivered and only logged, so the collection loop never stalls.
    /// The `requeue_on_failure` policy re-queues the batch instead.
    pub fn finish_flush(&mut self, batch: Batch, outcome: SubmitOutcome) -> FlushDisposition {
        self.in_flight = false;

        match outcome {
            SubmitOutcome::Accepted => {
                self.consecutive_failures = 0;
                debug!(count = batch.entries.len(), "batch accepted by collector");
                FlushDisposition::Delivered
            }
            SubmitOutcome::Revoked => {
                self.accepting = false;
                warn!("collector revoked session; queue stopped accepting entries");
                FlushDisposition::TerminateSession
            }
            SubmitOutcome::TransportFailure(error) => {
                self.consecutive_failures += 1;
                warn!(
                    %error,
                    count = batch.entries.len(),
                    consecutive_failures = self.consecutive_failures,
                    "submission failed; continuing fail-open"
                );
                if self.requeue_on_failure {
                    let mut entries = batch.entries;
                    entries.extend(self.entries.drain(..));
                    self.entries = entries;
                    FlushDisposition::Requeued
                } else {
                    FlushDisposition::Delivered
                }
            }
        }
    }

    /// Take everything for the final submission at session teardown,
    /// regardless of deadlines.
    pub fn drain(&mut self, now_ms: u64) -> Option<Batch> {
        self.begin_flush(FlushReason::Drain, now_ms)
    }
}
