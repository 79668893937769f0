//! Time abstraction for mission timers and packet-age checks.
//!
//! Every grace period, hover timer, debounce window, and spray phase in
//! the mission core is driven by [`TimeSource::now_ms`], a monotonic
//! millisecond clock. Packet freshness is the one exception: target
//! records carry epoch timestamps stamped by the perception host, so the
//! validator compares them against [`TimeSource::now_epoch_s`].

use core::cell::Cell;

/// Clock injected into the mission controller.
///
/// Implementations:
/// - `HostTime` (in the sitl crate) backed by `Instant`/`SystemTime`
/// - [`MockTime`] for deterministic tests with controllable time
pub trait TimeSource: Clone {
    /// Monotonic milliseconds since system start.
    fn now_ms(&self) -> u64;

    /// Wall-clock seconds since the Unix epoch.
    ///
    /// Only used to judge the age of incoming target packets; mission
    /// timers never touch the wall clock.
    fn now_epoch_s(&self) -> f64;

    /// Elapsed monotonic milliseconds since a reference point.
    ///
    /// Uses saturating subtraction so a stale reference never wraps.
    fn elapsed_ms_since(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock clock with controllable advancement.
///
/// The epoch clock is derived from the monotonic clock plus a settable
/// base, so advancing time moves both in lockstep.
///
/// # Example
///
/// ```
/// use spray_pilot_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// assert_eq!(time.now_ms(), 0);
///
/// time.advance_ms(1500);
/// assert_eq!(time.now_ms(), 1500);
/// assert!((time.now_epoch_s() - 1.5).abs() < 1e-9);
/// ```
#[derive(Clone, Default)]
pub struct MockTime {
    current_ms: Cell<u64>,
    epoch_base_s: Cell<f64>,
}

impl MockTime {
    /// Creates a mock clock starting at time 0 with epoch base 0.
    pub fn new() -> Self {
        Self {
            current_ms: Cell::new(0),
            epoch_base_s: Cell::new(0.0),
        }
    }

    /// Creates a mock clock whose epoch clock starts at `epoch_s`.
    pub fn with_epoch_base(epoch_s: f64) -> Self {
        Self {
            current_ms: Cell::new(0),
            epoch_base_s: Cell::new(epoch_s),
        }
    }

    /// Sets the monotonic clock to an absolute value.
    pub fn set_ms(&self, ms: u64) {
        self.current_ms.set(ms);
    }

    /// Advances the monotonic clock (and therefore the epoch clock).
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.set(self.current_ms.get() + ms);
    }

    /// Moves the epoch base without touching the monotonic clock.
    pub fn set_epoch_base(&self, epoch_s: f64) {
        self.epoch_base_s.set(epoch_s);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_ms.get()
    }

    fn now_epoch_s(&self) -> f64 {
        self.epoch_base_s.get() + self.current_ms.get() as f64 / 1000.0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
