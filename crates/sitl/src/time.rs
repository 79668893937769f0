//! Wall-clock time source.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use spray_pilot_core::traits::TimeSource;

/// Real clock: monotonic milliseconds from process start, epoch seconds
/// from the system clock.
#[derive(Clone)]
pub struct HostTime {
    start: Instant,
}

impl HostTime {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HostTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for HostTime {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn now_epoch_s(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}
