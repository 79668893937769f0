//! Vision alignment monitor.
//!
//! Debounces the per-frame vision error signal into a stable "aligned"
//! verdict: both axis errors must sit inside the pixel tolerance for a
//! configured number of consecutive frames. Any out-of-tolerance or
//! target-less frame resets the count, so a single twitch restarts the
//! whole confirmation window.
//!
//! A timeout layer reports [`AlignmentStatus::Lost`] when no target has
//! been seen for too long, so the alignment phase cannot wait forever on
//! a target that drifted out of view.

use crate::config::MissionConfig;
use crate::traits::VisionSample;

/// Verdict for one alignment frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentStatus {
    /// Enough consecutive centered frames; safe to begin spraying
    Aligned,
    /// Still converging (or the target briefly left tolerance)
    NotAligned,
    /// No target seen for the configured timeout
    Lost,
}

/// Stability-debounced wrapper over the raw vision error signal.
pub struct AlignmentMonitor {
    tolerance_px: i32,
    stable_frames: u32,
    timeout_ms: u64,
    stable_count: u32,
    /// Last frame on which a target was visible
    last_target_ms: Option<u64>,
}

impl AlignmentMonitor {
    pub fn new(config: &MissionConfig) -> Self {
        Self {
            tolerance_px: config.alignment_tolerance_px,
            stable_frames: config.alignment_stable_frames,
            timeout_ms: config.alignment_timeout_ms(),
            stable_count: 0,
            last_target_ms: None,
        }
    }

    /// Feed one frame's sample and get the current verdict.
    pub fn update(&mut self, sample: VisionSample, now_ms: u64) -> AlignmentStatus {
        match sample {
            VisionSample::Target {
                error_x_px,
                error_y_px,
            } => {
                self.last_target_ms = Some(now_ms);
                if error_x_px.abs() < self.tolerance_px && error_y_px.abs() < self.tolerance_px {
                    self.stable_count += 1;
                } else {
                    self.stable_count = 0;
                }
                if self.stable_count >= self.stable_frames {
                    AlignmentStatus::Aligned
                } else {
                    AlignmentStatus::NotAligned
                }
            }
            VisionSample::NoTarget => {
                self.stable_count = 0;
                let last = *self.last_target_ms.get_or_insert(now_ms);
                if now_ms.saturating_sub(last) > self.timeout_ms {
                    AlignmentStatus::Lost
                } else {
                    AlignmentStatus::NotAligned
                }
            }
        }
    }

    /// Consecutive in-tolerance frames so far.
    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    /// Restart the confirmation window (entering a new alignment phase).
    pub fn reset(&mut self) {
        self.stable_count = 0;
        self.last_target_ms = None;
    }
}
