//! Pending-target queue.
//!
//! FIFO of validated, not-yet-visited targets with two layers of
//! duplicate suppression: an id set that only ever grows, and a spatial
//! check against every record still waiting in the FIFO. The spatial
//! check uses the same planar distance as the navigation arrival test so
//! "arrived" and "too close to an existing target" agree on geometry.
//!
//! At most one record is checked out at a time: the controller dequeues
//! the head, flies it, and either completes it with a terminal status or
//! (on reset) abandons it. A record is always in exactly one of
//! {FIFO, checked out, completed-and-gone}.

use core::fmt;

use heapless::{Deque, FnvIndexSet};

use crate::config::MissionConfig;
use crate::nav::flat_distance_m;
use crate::packet::{TargetRecord, TargetStatus};

/// FIFO capacity. One mission batch is far below this.
pub const MAX_PENDING_TARGETS: usize = 64;

/// Seen-id set capacity (power of two, required by the index set).
const SEEN_IDS_CAPACITY: usize = 256;

/// Why a record was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptError {
    /// The id was already seen at some point in the queue's lifetime
    DuplicateId,
    /// Closer than the configured separation to a pending record
    TooClose,
    /// FIFO is full
    QueueFull,
    /// Seen-id set is full; no further ids can be tracked or admitted
    SeenSetFull,
}

impl fmt::Display for AcceptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptError::DuplicateId => write!(f, "duplicate target id"),
            AcceptError::TooClose => write!(f, "too close to a queued target"),
            AcceptError::QueueFull => write!(f, "target queue full"),
            AcceptError::SeenSetFull => write!(f, "seen-id set full"),
        }
    }
}

/// Errors from the checkout protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutError {
    /// `complete_current` called with nothing checked out
    NothingCheckedOut,
    /// `complete_current` called with a non-terminal status
    NonTerminalStatus,
}

impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutError::NothingCheckedOut => write!(f, "no target checked out"),
            CheckoutError::NonTerminalStatus => {
                write!(f, "completion status must be terminal")
            }
        }
    }
}

/// Deduplicating FIFO of pending spray targets.
pub struct TargetQueue {
    pending: Deque<TargetRecord, MAX_PENDING_TARGETS>,
    seen_ids: FnvIndexSet<u32, SEEN_IDS_CAPACITY>,
    checked_out: Option<TargetRecord>,
    min_separation_m: f32,
    min_batch: usize,
}

impl TargetQueue {
    pub fn new(config: &MissionConfig) -> Self {
        Self {
            pending: Deque::new(),
            seen_ids: FnvIndexSet::new(),
            checked_out: None,
            min_separation_m: config.min_target_separation_m,
            min_batch: config.min_batch_size,
        }
    }

    /// Offer a validated record to the queue.
    ///
    /// Rejects on id reuse (forever — the seen set never shrinks) and on
    /// proximity to any record still pending. An accepted record's id is
    /// recorded before it is enqueued, so even if it later completes, a
    /// resend of the same id stays rejected.
    pub fn accept(&mut self, record: TargetRecord) -> Result<(), AcceptError> {
        if self.seen_ids.contains(&record.id) {
            return Err(AcceptError::DuplicateId);
        }

        for existing in self.pending.iter() {
            let d = flat_distance_m(existing.lat, existing.lon, record.lat, record.lon);
            if d < self.min_separation_m {
                return Err(AcceptError::TooClose);
            }
        }

        if self.pending.is_full() {
            return Err(AcceptError::QueueFull);
        }
        self.seen_ids
            .insert(record.id)
            .map_err(|_| AcceptError::SeenSetFull)?;

        // Cannot fail: fullness was checked above
        let _ = self.pending.push_back(record);
        Ok(())
    }

    /// True once enough targets are queued to start the mission.
    pub fn ready_for_dispatch(&self) -> bool {
        self.pending.len() >= self.min_batch
    }

    /// Check out the head of the FIFO.
    ///
    /// Returns `None` while a previous checkout is still outstanding or
    /// when the FIFO is empty.
    pub fn dequeue_next(&mut self) -> Option<TargetRecord> {
        if self.checked_out.is_some() {
            return None;
        }
        let record = self.pending.pop_front()?;
        self.checked_out = Some(record);
        Some(record)
    }

    /// Finish the checked-out target with a terminal status.
    ///
    /// Returns the completed record for downstream logging.
    pub fn complete_current(
        &mut self,
        status: TargetStatus,
    ) -> Result<TargetRecord, CheckoutError> {
        if !status.is_terminal() {
            return Err(CheckoutError::NonTerminalStatus);
        }
        let mut record = self
            .checked_out
            .take()
            .ok_or(CheckoutError::NothingCheckedOut)?;
        record.status = status;
        Ok(record)
    }

    /// The record currently checked out, if any.
    pub fn current(&self) -> Option<&TargetRecord> {
        self.checked_out.as_ref()
    }

    /// True while the FIFO holds at least one record.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of records waiting in the FIFO.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of distinct ids ever accepted or offered and admitted.
    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }
}
