//! Vehicle platform abstraction.
//!
//! The mission controller never talks to a flight stack directly: it
//! reads one [`TelemetrySnapshot`] per tick and issues a handful of
//! fire-and-forget commands. Completion of a command (mode change,
//! arming, altitude acquisition) is always observed through subsequent
//! telemetry, never assumed.

use core::fmt;

/// Flight modes the mission core commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightMode {
    /// Manual stabilization, the power-on default
    #[default]
    Stabilize,
    /// Autonomous position control, accepts goto/takeoff commands
    Guided,
    /// Return to launch and land
    Rtl,
}

impl fmt::Display for FlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightMode::Stabilize => write!(f, "STABILIZE"),
            FlightMode::Guided => write!(f, "GUIDED"),
            FlightMode::Rtl => write!(f, "RTL"),
        }
    }
}

/// GPS fix type, ordered by quality.
///
/// The derived ordering is load-bearing: the safety gate compares a
/// snapshot's fix against the configured minimum with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum GpsFixType {
    #[default]
    NoFix,
    Fix2D,
    Fix3D,
    DGps,
    RtkFloat,
    RtkFixed,
}

impl fmt::Display for GpsFixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpsFixType::NoFix => write!(f, "no fix"),
            GpsFixType::Fix2D => write!(f, "2D fix"),
            GpsFixType::Fix3D => write!(f, "3D fix"),
            GpsFixType::DGps => write!(f, "DGPS"),
            GpsFixType::RtkFloat => write!(f, "RTK float"),
            GpsFixType::RtkFixed => write!(f, "RTK fixed"),
        }
    }
}

/// One per-tick read of platform telemetry.
///
/// Ephemeral by design: the controller takes a fresh snapshot every tick
/// and never caches one across ticks.
#[derive(Debug, Clone, Copy)]
pub struct TelemetrySnapshot {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Altitude above the home position in meters
    pub rel_alt_m: f32,
    /// Roll angle in degrees
    pub roll_deg: f32,
    /// Pitch angle in degrees
    pub pitch_deg: f32,
    /// GPS fix type
    pub fix_type: GpsFixType,
    /// Horizontal dilution of precision
    pub hdop: f32,
    /// Number of visible satellites
    pub satellites: u8,
    /// Battery voltage in volts
    pub battery_voltage: f32,
    /// Ground speed in m/s
    pub groundspeed_ms: f32,
    /// Current flight mode
    pub mode: FlightMode,
    /// Armed state
    pub armed: bool,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            rel_alt_m: 0.0,
            roll_deg: 0.0,
            pitch_deg: 0.0,
            fix_type: GpsFixType::NoFix,
            hdop: 99.9,
            satellites: 0,
            battery_voltage: 0.0,
            groundspeed_ms: 0.0,
            mode: FlightMode::Stabilize,
            armed: false,
        }
    }
}

/// Narrow command/telemetry interface to the vehicle.
///
/// Commands are fire-and-forget; the controller polls telemetry until the
/// commanded condition is observed (guided mode active, armed, altitude
/// reached, within arrival radius of a target).
pub trait VehiclePlatform {
    /// Read the current telemetry snapshot.
    fn telemetry(&self) -> TelemetrySnapshot;

    /// True once the platform reports it is ready to arm.
    fn is_armable(&self) -> bool;

    /// True once motors are armed.
    fn is_armed(&self) -> bool;

    /// Request motor arming.
    fn arm(&mut self);

    /// Request a flight mode change.
    fn set_mode(&mut self, mode: FlightMode);

    /// Command a takeoff to the given relative altitude.
    fn command_takeoff(&mut self, target_alt_m: f32);

    /// Command travel toward a position at the current cruise speed.
    fn goto_location(&mut self, lat: f64, lon: f64, alt_m: f32);

    /// Set the cruise ground speed for subsequent travel.
    fn set_groundspeed(&mut self, speed_ms: f32);
}
