//! Scripted vision source.

use spray_pilot_core::traits::{VisionSample, VisionSensor};

/// Replays a fixed sequence of vision samples, then repeats the final
/// entry forever. `None` entries simulate a stalled pipeline (no frame
/// produced), which ages the safety gate's vision heartbeat.
pub struct ScriptedVision {
    frames: Vec<Option<VisionSample>>,
    index: usize,
    started: bool,
    fail_start: bool,
}

impl ScriptedVision {
    pub fn new(frames: Vec<Option<VisionSample>>) -> Self {
        Self {
            frames,
            index: 0,
            started: false,
            fail_start: false,
        }
    }

    /// A camera that always sees the target dead-center.
    pub fn locked_on() -> Self {
        Self::new(vec![Some(VisionSample::Target {
            error_x_px: 1,
            error_y_px: -1,
        })])
    }

    /// A camera that never finds a target.
    pub fn blind() -> Self {
        Self::new(vec![Some(VisionSample::NoTarget)])
    }

    /// A camera whose pipeline dies after `alive_frames` frames.
    pub fn dying_after(alive_frames: usize) -> Self {
        let mut frames = vec![
            Some(VisionSample::Target {
                error_x_px: 2,
                error_y_px: 2,
            });
            alive_frames
        ];
        frames.push(None);
        Self::new(frames)
    }

    /// Make `start` fail, for init-failure tests.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl VisionSensor for ScriptedVision {
    fn start(&mut self) -> Result<(), &'static str> {
        if self.fail_start {
            return Err("camera could not be opened");
        }
        self.started = true;
        self.index = 0;
        Ok(())
    }

    fn sample(&mut self) -> Option<VisionSample> {
        if self.frames.is_empty() {
            return Some(VisionSample::NoTarget);
        }
        let i = self.index.min(self.frames.len() - 1);
        self.index += 1;
        self.frames[i]
    }

    fn stop(&mut self) {
        self.started = false;
    }
}
