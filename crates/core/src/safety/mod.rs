//! Per-tick safety gate.
//!
//! Evaluates one telemetry snapshot against the configured limits and
//! answers "safe to continue?" — naming the failed check when not. Every
//! check is immediately fatal except GPS fix loss, which is wrapped in a
//! grace window: the fix must stay bad for the whole window before the
//! gate reports a violation. HDOP and satellite-count checks are
//! suspended while the fix itself is bad, since they are meaningless
//! without a fix and would short-circuit the grace window.
//!
//! The gate owns two timestamps: when the fix first went bad, and when
//! the vision subsystem last produced a frame. The controller feeds the
//! latter via [`SafetyGate::note_vision_heartbeat`].

use core::fmt;

use crate::config::MissionConfig;
use crate::traits::TelemetrySnapshot;

/// The specific check that failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SafetyViolation {
    /// Battery below the minimum voltage
    BatteryLow { voltage: f32 },
    /// GPS fix below minimum for longer than the grace window
    GpsFixLost,
    /// Horizontal dilution of precision above the ceiling
    HdopTooHigh { hdop: f32 },
    /// Fewer visible satellites than required
    TooFewSatellites { count: u8 },
    /// Roll beyond the configured maximum
    RollExceeded { roll_deg: f32 },
    /// Pitch beyond the configured maximum
    PitchExceeded { pitch_deg: f32 },
    /// Above the altitude ceiling
    AltitudeExceeded { alt_m: f32 },
    /// Vision subsystem silent beyond its timeout
    VisionHeartbeatLost,
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyViolation::BatteryLow { voltage } => {
                write!(f, "battery low ({:.1} V)", voltage)
            }
            SafetyViolation::GpsFixLost => write!(f, "GPS fix lost beyond grace"),
            SafetyViolation::HdopTooHigh { hdop } => write!(f, "HDOP too high ({:.1})", hdop),
            SafetyViolation::TooFewSatellites { count } => {
                write!(f, "too few satellites ({})", count)
            }
            SafetyViolation::RollExceeded { roll_deg } => {
                write!(f, "roll exceeded ({:.1} deg)", roll_deg)
            }
            SafetyViolation::PitchExceeded { pitch_deg } => {
                write!(f, "pitch exceeded ({:.1} deg)", pitch_deg)
            }
            SafetyViolation::AltitudeExceeded { alt_m } => {
                write!(f, "altitude exceeded ({:.1} m)", alt_m)
            }
            SafetyViolation::VisionHeartbeatLost => write!(f, "vision heartbeat lost"),
        }
    }
}

/// Continuously evaluated abort monitor.
pub struct SafetyGate {
    /// When the GPS fix first dropped below minimum (None = fix is good)
    gps_bad_since_ms: Option<u64>,
    /// When the vision subsystem last delivered a frame
    last_vision_ms: Option<u64>,
}

impl SafetyGate {
    pub fn new() -> Self {
        Self {
            gps_bad_since_ms: None,
            last_vision_ms: None,
        }
    }

    /// Record that the vision subsystem delivered a frame.
    pub fn note_vision_heartbeat(&mut self, now_ms: u64) {
        self.last_vision_ms = Some(now_ms);
    }

    /// Clear all timers (controller reset).
    pub fn reset(&mut self) {
        self.gps_bad_since_ms = None;
        self.last_vision_ms = None;
    }

    /// True while the fix is bad but still inside the grace window.
    pub fn gps_in_grace(&self) -> bool {
        self.gps_bad_since_ms.is_some()
    }

    /// Run all checks against one snapshot.
    ///
    /// Check order: battery, GPS fix (grace-wrapped), HDOP, satellites,
    /// roll, pitch, altitude, vision heartbeat. The first failure wins.
    pub fn evaluate(
        &mut self,
        snapshot: &TelemetrySnapshot,
        config: &MissionConfig,
        now_ms: u64,
    ) -> Result<(), SafetyViolation> {
        if snapshot.battery_voltage < config.min_battery_voltage {
            return Err(SafetyViolation::BatteryLow {
                voltage: snapshot.battery_voltage,
            });
        }

        if snapshot.fix_type >= config.min_fix {
            self.gps_bad_since_ms = None;

            if snapshot.hdop > config.max_hdop {
                return Err(SafetyViolation::HdopTooHigh {
                    hdop: snapshot.hdop,
                });
            }
            if snapshot.satellites < config.min_satellites {
                return Err(SafetyViolation::TooFewSatellites {
                    count: snapshot.satellites,
                });
            }
        } else {
            let since = *self.gps_bad_since_ms.get_or_insert(now_ms);
            if now_ms.saturating_sub(since) >= config.gps_grace_ms() {
                return Err(SafetyViolation::GpsFixLost);
            }
        }

        let roll = snapshot.roll_deg;
        if roll.abs() > config.max_roll_deg {
            return Err(SafetyViolation::RollExceeded { roll_deg: roll });
        }
        let pitch = snapshot.pitch_deg;
        if pitch.abs() > config.max_pitch_deg {
            return Err(SafetyViolation::PitchExceeded { pitch_deg: pitch });
        }

        if snapshot.rel_alt_m > config.max_altitude_m {
            return Err(SafetyViolation::AltitudeExceeded {
                alt_m: snapshot.rel_alt_m,
            });
        }

        if config.alignment_enabled {
            let last = *self.last_vision_ms.get_or_insert(now_ms);
            if now_ms.saturating_sub(last) > config.alignment_timeout_ms() {
                return Err(SafetyViolation::VisionHeartbeatLost);
            }
        }

        Ok(())
    }
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::GpsFixType;

    fn healthy() -> TelemetrySnapshot {
        TelemetrySnapshot {
            lat: 35.0,
            lon: 139.0,
            rel_alt_m: 5.0,
            roll_deg: 0.5,
            pitch_deg: -0.5,
            fix_type: GpsFixType::Fix3D,
            hdop: 1.1,
            satellites: 9,
            battery_voltage: 12.2,
            groundspeed_ms: 0.8,
            mode: crate::traits::FlightMode::Guided,
            armed: true,
        }
    }

    fn config() -> MissionConfig {
        MissionConfig::default()
    }

    #[test]
    fn healthy_snapshot_passes() {
        let mut gate = SafetyGate::new();
        assert!(gate.evaluate(&healthy(), &config(), 0).is_ok());
    }

    #[test]
    fn battery_low_is_immediately_fatal() {
        let mut gate = SafetyGate::new();
        let mut snap = healthy();
        snap.battery_voltage = 9.9;

        assert_eq!(
            gate.evaluate(&snap, &config(), 0),
            Err(SafetyViolation::BatteryLow { voltage: 9.9 })
        );
    }

    #[test]
    fn tilt_is_immediately_fatal() {
        let mut gate = SafetyGate::new();

        let mut snap = healthy();
        snap.roll_deg = -3.5;
        assert_eq!(
            gate.evaluate(&snap, &config(), 0),
            Err(SafetyViolation::RollExceeded { roll_deg: -3.5 })
        );

        let mut snap = healthy();
        snap.pitch_deg = 4.0;
        assert_eq!(
            gate.evaluate(&snap, &config(), 0),
            Err(SafetyViolation::PitchExceeded { pitch_deg: 4.0 })
        );
    }

    #[test]
    fn altitude_ceiling_is_immediately_fatal() {
        let mut gate = SafetyGate::new();
        let mut snap = healthy();
        snap.rel_alt_m = 10.5;

        assert!(matches!(
            gate.evaluate(&snap, &config(), 0),
            Err(SafetyViolation::AltitudeExceeded { .. })
        ));
    }

    #[test]
    fn hdop_and_satellites_fatal_with_good_fix() {
        let mut gate = SafetyGate::new();

        let mut snap = healthy();
        snap.hdop = 3.0;
        assert!(matches!(
            gate.evaluate(&snap, &config(), 0),
            Err(SafetyViolation::HdopTooHigh { .. })
        ));

        let mut snap = healthy();
        snap.satellites = 4;
        assert_eq!(
            gate.evaluate(&snap, &config(), 0),
            Err(SafetyViolation::TooFewSatellites { count: 4 })
        );
    }

    #[test]
    fn fix_loss_tolerated_inside_grace() {
        let mut gate = SafetyGate::new();
        let mut snap = healthy();
        snap.fix_type = GpsFixType::Fix2D;
        snap.hdop = 50.0; // garbage DOP while fix is bad must not abort
        snap.satellites = 2;

        // Grace is 10 s; bad fix from t=0
        assert!(gate.evaluate(&snap, &config(), 0).is_ok());
        assert!(gate.gps_in_grace());
        assert!(gate.evaluate(&snap, &config(), 9_000).is_ok());
    }

    #[test]
    fn fix_loss_fatal_past_grace() {
        let mut gate = SafetyGate::new();
        let mut snap = healthy();
        snap.fix_type = GpsFixType::NoFix;

        assert!(gate.evaluate(&snap, &config(), 0).is_ok());
        assert_eq!(
            gate.evaluate(&snap, &config(), 11_000),
            Err(SafetyViolation::GpsFixLost)
        );
    }

    #[test]
    fn fix_recovery_resets_grace() {
        let mut gate = SafetyGate::new();
        let mut snap = healthy();

        snap.fix_type = GpsFixType::NoFix;
        assert!(gate.evaluate(&snap, &config(), 0).is_ok());
        assert!(gate.evaluate(&snap, &config(), 8_000).is_ok());

        // Fix comes back at t=9s
        snap.fix_type = GpsFixType::Fix3D;
        assert!(gate.evaluate(&snap, &config(), 9_000).is_ok());
        assert!(!gate.gps_in_grace());

        // A fresh loss gets a fresh window
        snap.fix_type = GpsFixType::NoFix;
        assert!(gate.evaluate(&snap, &config(), 10_000).is_ok());
        assert!(gate.evaluate(&snap, &config(), 19_000).is_ok());
        assert_eq!(
            gate.evaluate(&snap, &config(), 20_000),
            Err(SafetyViolation::GpsFixLost)
        );
    }

    #[test]
    fn better_than_3d_fix_is_accepted() {
        let mut gate = SafetyGate::new();
        let mut snap = healthy();
        snap.fix_type = GpsFixType::RtkFixed;
        assert!(gate.evaluate(&snap, &config(), 0).is_ok());
    }

    #[test]
    fn vision_heartbeat_ages_out() {
        let mut gate = SafetyGate::new();
        let snap = healthy();
        let config = config(); // alignment enabled, 10 s timeout

        // First evaluation seeds the heartbeat
        assert!(gate.evaluate(&snap, &config, 0).is_ok());
        assert!(gate.evaluate(&snap, &config, 10_000).is_ok());
        assert_eq!(
            gate.evaluate(&snap, &config, 10_001),
            Err(SafetyViolation::VisionHeartbeatLost)
        );
    }

    #[test]
    fn vision_heartbeat_keeps_gate_open() {
        let mut gate = SafetyGate::new();
        let snap = healthy();
        let config = config();

        assert!(gate.evaluate(&snap, &config, 0).is_ok());
        gate.note_vision_heartbeat(9_000);
        assert!(gate.evaluate(&snap, &config, 15_000).is_ok());
        assert_eq!(
            gate.evaluate(&snap, &config, 19_100),
            Err(SafetyViolation::VisionHeartbeatLost)
        );
    }

    #[test]
    fn vision_check_skipped_when_alignment_disabled() {
        let mut gate = SafetyGate::new();
        let snap = healthy();
        let mut config = config();
        config.alignment_enabled = false;

        assert!(gate.evaluate(&snap, &config, 0).is_ok());
        assert!(gate.evaluate(&snap, &config, 1_000_000).is_ok());
    }
}
