//! Simulated vehicle platform.
//!
//! A kinematic point-mass that responds to the same narrow command set
//! the mission core issues to a real flight stack: mode changes, arming,
//! takeoff, and goto. Motion is integrated by [`SimVehicle::step`],
//! which the test loop calls once per tick with the tick period.
//!
//! Telemetry is fully exposed through [`SimVehicle::telemetry_mut`] so
//! tests can inject GPS degradation, attitude upsets, and battery droop
//! mid-flight.

use spray_pilot_core::nav::flat_distance_m;
use spray_pilot_core::traits::{FlightMode, GpsFixType, TelemetrySnapshot, VehiclePlatform};

/// Fixed climb/descent rate of the simulated airframe (m/s).
const CLIMB_RATE_MS: f32 = 1.0;

/// Simulated spray drone.
pub struct SimVehicle {
    snap: TelemetrySnapshot,
    armable: bool,
    goto_target: Option<(f64, f64, f32)>,
    takeoff_target_m: Option<f32>,
    cruise_ms: f32,
}

impl SimVehicle {
    /// A healthy vehicle sitting on the ground at the given position.
    pub fn parked_at(lat: f64, lon: f64) -> Self {
        Self {
            snap: TelemetrySnapshot {
                lat,
                lon,
                rel_alt_m: 0.0,
                roll_deg: 0.3,
                pitch_deg: -0.2,
                fix_type: GpsFixType::Fix3D,
                hdop: 0.9,
                satellites: 11,
                battery_voltage: 12.6,
                groundspeed_ms: 0.0,
                mode: FlightMode::Stabilize,
                armed: false,
            },
            armable: true,
            goto_target: None,
            takeoff_target_m: None,
            cruise_ms: 1.0,
        }
    }

    /// Mutable telemetry for fault injection.
    pub fn telemetry_mut(&mut self) -> &mut TelemetrySnapshot {
        &mut self.snap
    }

    /// Make the platform refuse to arm.
    pub fn set_armable(&mut self, armable: bool) {
        self.armable = armable;
    }

    /// Integrate motion over `dt_s` seconds.
    pub fn step(&mut self, dt_s: f32) {
        if !self.snap.armed {
            return;
        }

        // Vertical: takeoff target dominates until reached, then the
        // goto altitude takes over
        let target_alt = match (self.takeoff_target_m, self.goto_target) {
            (Some(t), _) => Some(t),
            (None, Some((_, _, alt))) => Some(alt),
            (None, None) => None,
        };
        if let Some(target) = target_alt {
            let step = CLIMB_RATE_MS * dt_s;
            let delta = target - self.snap.rel_alt_m;
            if delta.abs() <= step {
                self.snap.rel_alt_m = target;
                if self.takeoff_target_m == Some(target) {
                    self.takeoff_target_m = None;
                }
            } else {
                self.snap.rel_alt_m += step * delta.signum();
            }
        }

        // Horizontal: only in guided mode, only with a target
        if self.snap.mode == FlightMode::Guided {
            if let Some((tlat, tlon, _)) = self.goto_target {
                let dist = flat_distance_m(self.snap.lat, self.snap.lon, tlat, tlon);
                let step = self.cruise_ms * dt_s;
                if dist <= step {
                    self.snap.lat = tlat;
                    self.snap.lon = tlon;
                    self.snap.groundspeed_ms = 0.0;
                } else {
                    let fraction = (step / dist) as f64;
                    self.snap.lat += (tlat - self.snap.lat) * fraction;
                    self.snap.lon += (tlon - self.snap.lon) * fraction;
                    self.snap.groundspeed_ms = self.cruise_ms;
                }
            }
        }
    }
}

impl VehiclePlatform for SimVehicle {
    fn telemetry(&self) -> TelemetrySnapshot {
        self.snap
    }

    fn is_armable(&self) -> bool {
        self.armable
    }

    fn is_armed(&self) -> bool {
        self.snap.armed
    }

    fn arm(&mut self) {
        if self.armable {
            self.snap.armed = true;
        }
    }

    fn set_mode(&mut self, mode: FlightMode) {
        self.snap.mode = mode;
    }

    fn command_takeoff(&mut self, target_alt_m: f32) {
        if self.snap.armed {
            self.takeoff_target_m = Some(target_alt_m);
        }
    }

    fn goto_location(&mut self, lat: f64, lon: f64, alt_m: f32) {
        self.goto_target = Some((lat, lon, alt_m));
    }

    fn set_groundspeed(&mut self, speed_ms: f32) {
        self.cruise_ms = speed_ms;
    }
}
