//! Vision sensor abstraction.
//!
//! The camera pipeline (capture, color segmentation, centroid
//! extraction) lives outside the core. What crosses the boundary is one
//! sample per frame: the pixel offset of the detected target from the
//! image center, or the fact that nothing was detected.

/// One frame's worth of vision output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionSample {
    /// A target is in view at the given offset from image center.
    Target {
        /// Horizontal offset in pixels (positive = right of center)
        error_x_px: i32,
        /// Vertical offset in pixels (positive = below center)
        error_y_px: i32,
    },
    /// Frame processed, no target detected.
    NoTarget,
}

/// Frame-rate vision source.
///
/// `sample` returning `None` means the pipeline produced no frame this
/// tick; the safety gate treats a sustained run of `None` as a dead
/// vision subsystem. `Some(VisionSample::NoTarget)` is different — the
/// pipeline is alive, the target just is not in view.
pub trait VisionSensor {
    /// Bring the pipeline up.
    fn start(&mut self) -> Result<(), &'static str>;

    /// Fetch the sample for this tick, if a frame was produced.
    fn sample(&mut self) -> Option<VisionSample>;

    /// Release the pipeline.
    fn stop(&mut self);
}
