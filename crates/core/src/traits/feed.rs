//! Target ingestion feed abstraction.

use heapless::Vec;

use crate::packet::RawTargetPacket;

/// Upper bound on packets handed over per tick.
///
/// The feed side buffers anything beyond this until the next poll, so a
/// burst of arrivals is spread across ticks instead of blowing the tick
/// budget.
pub const MAX_PACKETS_PER_POLL: usize = 16;

/// Single-consumer channel of raw target reports.
///
/// Polled exactly once per tick by the controller; every returned packet
/// is offered to the validator and then the queue. The feed must never
/// block and must never hand out the same row twice.
pub trait TargetFeed {
    /// Drain up to [`MAX_PACKETS_PER_POLL`] newly arrived packets.
    fn poll(&mut self) -> Vec<RawTargetPacket, MAX_PACKETS_PER_POLL>;
}
