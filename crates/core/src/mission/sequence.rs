//! Timed sub-sequences advanced across ticks.
//!
//! Arm/takeoff and the spray cycle are the two places the mission has to
//! wait on real time or on the platform. Both are modeled as small
//! sub-state machines the controller advances once per tick, so the tick
//! loop itself never blocks.

use crate::config::MissionConfig;
use crate::traits::{FlightMode, SprayActuator, VehiclePlatform};

// ============================================================================
// Spray sequence
// ============================================================================

/// Phase of the spray cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprayPhase {
    /// Holding still so sloshing settles before the valve opens
    Stabilize,
    /// Valve open
    On,
    /// Valve closed, waiting for drips to clear before moving
    Settle,
    /// Cycle finished
    Done,
}

/// One spray cycle: stabilize, spray, settle.
///
/// Phase boundaries are computed from the sequence start, not from the
/// tick that happened to observe them, so total cycle time is exactly
/// `pre + duration + post` regardless of tick cadence.
pub struct SpraySequence {
    phase: SprayPhase,
    phase_started_ms: u64,
    stabilize_ms: u64,
    on_ms: u64,
    settle_ms: u64,
}

impl SpraySequence {
    pub fn start(config: &MissionConfig, now_ms: u64) -> Self {
        Self {
            phase: SprayPhase::Stabilize,
            phase_started_ms: now_ms,
            stabilize_ms: (config.pre_spray_delay_s * 1000.0) as u64,
            on_ms: (config.spray_duration_s * 1000.0) as u64,
            settle_ms: (config.post_spray_delay_s * 1000.0) as u64,
        }
    }

    pub fn phase(&self) -> SprayPhase {
        self.phase
    }

    /// Advance the cycle; returns true once the whole cycle is done.
    ///
    /// Crosses as many phase boundaries as `now_ms` has passed, so
    /// zero-length phases fall through in a single tick.
    pub fn update(&mut self, sprayer: &mut dyn SprayActuator, now_ms: u64) -> bool {
        loop {
            let elapsed = now_ms.saturating_sub(self.phase_started_ms);
            match self.phase {
                SprayPhase::Stabilize => {
                    if elapsed < self.stabilize_ms {
                        break;
                    }
                    sprayer.set_on();
                    self.phase = SprayPhase::On;
                    self.phase_started_ms += self.stabilize_ms;
                }
                SprayPhase::On => {
                    if elapsed < self.on_ms {
                        break;
                    }
                    sprayer.set_off();
                    self.phase = SprayPhase::Settle;
                    self.phase_started_ms += self.on_ms;
                }
                SprayPhase::Settle => {
                    if elapsed < self.settle_ms {
                        break;
                    }
                    self.phase = SprayPhase::Done;
                }
                SprayPhase::Done => break,
            }
        }
        self.phase == SprayPhase::Done
    }

    /// Cut the cycle short, valve closed.
    pub fn abort(&mut self, sprayer: &mut dyn SprayActuator) {
        sprayer.set_off();
        self.phase = SprayPhase::Done;
    }
}

// ============================================================================
// Takeoff sequence
// ============================================================================

/// Phase of arm-and-takeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeoffPhase {
    /// Waiting for the platform to report armable
    AwaitArmable,
    /// Guided mode commanded, waiting for confirmation
    AwaitGuidedMode,
    /// Arming commanded, waiting for motors
    AwaitArmed,
    /// Takeoff commanded, waiting for altitude
    Climbing,
    /// Airborne at travel altitude
    Done,
}

/// Arm, switch to guided, take off, climb — one condition poll per tick.
pub struct TakeoffSequence {
    phase: TakeoffPhase,
    climb_m: f32,
    target_alt_m: Option<f32>,
}

impl TakeoffSequence {
    pub fn new(climb_m: f32) -> Self {
        Self {
            phase: TakeoffPhase::AwaitArmable,
            climb_m,
            target_alt_m: None,
        }
    }

    pub fn phase(&self) -> TakeoffPhase {
        self.phase
    }

    /// Commanded takeoff altitude, known once climbing starts.
    pub fn target_alt_m(&self) -> Option<f32> {
        self.target_alt_m
    }

    /// Advance one phase check; returns true once airborne at altitude.
    pub fn update(&mut self, vehicle: &mut dyn VehiclePlatform) -> bool {
        match self.phase {
            TakeoffPhase::AwaitArmable => {
                if vehicle.is_armable() {
                    vehicle.set_mode(FlightMode::Guided);
                    self.phase = TakeoffPhase::AwaitGuidedMode;
                }
            }
            TakeoffPhase::AwaitGuidedMode => {
                if vehicle.telemetry().mode == FlightMode::Guided {
                    vehicle.arm();
                    self.phase = TakeoffPhase::AwaitArmed;
                }
            }
            TakeoffPhase::AwaitArmed => {
                if vehicle.is_armed() {
                    let target = vehicle.telemetry().rel_alt_m + self.climb_m;
                    self.target_alt_m = Some(target);
                    vehicle.command_takeoff(target);
                    self.phase = TakeoffPhase::Climbing;
                }
            }
            TakeoffPhase::Climbing => {
                // 95% of commanded altitude counts as arrived, matching
                // the platform's own takeoff completion heuristic
                if let Some(target) = self.target_alt_m {
                    if vehicle.telemetry().rel_alt_m >= target * 0.95 {
                        self.phase = TakeoffPhase::Done;
                    }
                }
            }
            TakeoffPhase::Done => {}
        }
        self.phase == TakeoffPhase::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TelemetrySnapshot;

    // ========================================================================
    // Mocks
    // ========================================================================

    #[derive(Default)]
    struct MockSprayer {
        on: bool,
        transitions: u32,
    }

    impl SprayActuator for MockSprayer {
        fn setup(&mut self) -> Result<(), &'static str> {
            self.on = false;
            Ok(())
        }
        fn set_on(&mut self) {
            if !self.on {
                self.transitions += 1;
            }
            self.on = true;
        }
        fn set_off(&mut self) {
            self.on = false;
        }
        fn is_on(&self) -> bool {
            self.on
        }
    }

    struct MockVehicle {
        armable: bool,
        armed: bool,
        mode: FlightMode,
        rel_alt_m: f32,
        takeoff_target: Option<f32>,
    }

    impl MockVehicle {
        fn on_ground() -> Self {
            Self {
                armable: false,
                armed: false,
                mode: FlightMode::Stabilize,
                rel_alt_m: 0.0,
                takeoff_target: None,
            }
        }
    }

    impl VehiclePlatform for MockVehicle {
        fn telemetry(&self) -> TelemetrySnapshot {
            TelemetrySnapshot {
                rel_alt_m: self.rel_alt_m,
                mode: self.mode,
                armed: self.armed,
                ..TelemetrySnapshot::default()
            }
        }
        fn is_armable(&self) -> bool {
            self.armable
        }
        fn is_armed(&self) -> bool {
            self.armed
        }
        fn arm(&mut self) {
            self.armed = true;
        }
        fn set_mode(&mut self, mode: FlightMode) {
            self.mode = mode;
        }
        fn command_takeoff(&mut self, target_alt_m: f32) {
            self.takeoff_target = Some(target_alt_m);
        }
        fn goto_location(&mut self, _lat: f64, _lon: f64, _alt_m: f32) {}
        fn set_groundspeed(&mut self, _speed_ms: f32) {}
    }

    // ========================================================================
    // Spray sequence
    // ========================================================================

    fn spray_config() -> MissionConfig {
        // pre 3 s, on 2 s, post 3 s (defaults)
        MissionConfig::default()
    }

    #[test]
    fn spray_phase_order_and_durations() {
        let mut seq = SpraySequence::start(&spray_config(), 1_000);
        let mut sprayer = MockSprayer::default();

        // Stabilizing: valve closed
        assert!(!seq.update(&mut sprayer, 1_000));
        assert_eq!(seq.phase(), SprayPhase::Stabilize);
        assert!(!sprayer.is_on());

        assert!(!seq.update(&mut sprayer, 3_999));
        assert!(!sprayer.is_on());

        // t = start + 3 s: valve opens
        assert!(!seq.update(&mut sprayer, 4_000));
        assert_eq!(seq.phase(), SprayPhase::On);
        assert!(sprayer.is_on());

        assert!(!seq.update(&mut sprayer, 5_999));
        assert!(sprayer.is_on());

        // t = start + 5 s: valve closes, settle begins
        assert!(!seq.update(&mut sprayer, 6_000));
        assert_eq!(seq.phase(), SprayPhase::Settle);
        assert!(!sprayer.is_on());

        // t = start + 8 s: cycle complete
        assert!(!seq.update(&mut sprayer, 8_999));
        assert!(seq.update(&mut sprayer, 9_000));
        assert_eq!(seq.phase(), SprayPhase::Done);
        assert!(!sprayer.is_on());
        assert_eq!(sprayer.transitions, 1);
    }

    #[test]
    fn spray_total_time_is_exact_despite_coarse_ticks() {
        // Ticks every 1.7 s still produce the exact 8 s cycle boundaries
        let mut seq = SpraySequence::start(&spray_config(), 0);
        let mut sprayer = MockSprayer::default();

        let mut t = 0;
        while !seq.update(&mut sprayer, t) {
            t += 1_700;
        }
        // Done observed on the first tick at or after 8 s
        assert_eq!(t, 8_500);
        assert_eq!(sprayer.transitions, 1);
    }

    #[test]
    fn zero_length_phases_fall_through_in_one_tick() {
        let mut config = MissionConfig::default();
        config.pre_spray_delay_s = 0.0;
        config.post_spray_delay_s = 0.0;
        config.spray_duration_s = 0.5;

        let mut seq = SpraySequence::start(&config, 0);
        let mut sprayer = MockSprayer::default();

        assert!(!seq.update(&mut sprayer, 0));
        assert_eq!(seq.phase(), SprayPhase::On);
        assert!(sprayer.is_on());

        assert!(seq.update(&mut sprayer, 500));
        assert!(!sprayer.is_on());
    }

    #[test]
    fn abort_closes_valve_and_finishes() {
        let mut seq = SpraySequence::start(&spray_config(), 0);
        let mut sprayer = MockSprayer::default();

        seq.update(&mut sprayer, 4_000); // valve open
        assert!(sprayer.is_on());

        seq.abort(&mut sprayer);
        assert!(!sprayer.is_on());
        assert!(seq.update(&mut sprayer, 4_100));
    }

    // ========================================================================
    // Takeoff sequence
    // ========================================================================

    #[test]
    fn takeoff_walks_through_phases() {
        let mut vehicle = MockVehicle::on_ground();
        let mut seq = TakeoffSequence::new(5.0);

        // Not armable yet: nothing happens
        assert!(!seq.update(&mut vehicle));
        assert_eq!(seq.phase(), TakeoffPhase::AwaitArmable);
        assert_eq!(vehicle.mode, FlightMode::Stabilize);

        // Armable: guided mode commanded, then confirmed next tick
        vehicle.armable = true;
        assert!(!seq.update(&mut vehicle));
        assert_eq!(seq.phase(), TakeoffPhase::AwaitGuidedMode);
        assert_eq!(vehicle.mode, FlightMode::Guided);

        // Mode confirmed: arming commanded
        assert!(!seq.update(&mut vehicle));
        assert_eq!(seq.phase(), TakeoffPhase::AwaitArmed);

        // Armed: takeoff commanded to current alt + climb
        assert!(!seq.update(&mut vehicle));
        assert_eq!(seq.phase(), TakeoffPhase::Climbing);
        assert_eq!(vehicle.takeoff_target, Some(5.0));
        assert_eq!(seq.target_alt_m(), Some(5.0));

        // Climbing: below 95% is not done
        vehicle.rel_alt_m = 4.0;
        assert!(!seq.update(&mut vehicle));

        vehicle.rel_alt_m = 4.80;
        assert!(seq.update(&mut vehicle));
        assert_eq!(seq.phase(), TakeoffPhase::Done);
    }

    #[test]
    fn takeoff_target_tracks_current_altitude() {
        // Vehicle already hovering at 2 m climbs to 7 m
        let mut vehicle = MockVehicle::on_ground();
        vehicle.armable = true;
        vehicle.rel_alt_m = 2.0;

        let mut seq = TakeoffSequence::new(5.0);
        seq.update(&mut vehicle); // -> guided commanded
        seq.update(&mut vehicle); // -> arm commanded
        seq.update(&mut vehicle); // -> takeoff commanded
        assert_eq!(vehicle.takeoff_target, Some(7.0));
    }
}
