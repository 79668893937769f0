//! Mission configuration.
//!
//! One immutable struct passed into each component at construction.
//! There is no ambient or global configuration lookup anywhere in the
//! crate; tests build a [`MissionConfig`], tweak the fields under test,
//! and hand it over.

use crate::traits::GpsFixType;

/// All tunables for a spray mission.
#[derive(Debug, Clone)]
pub struct MissionConfig {
    // ------------------------------------------------------------------
    // Queue / batch
    // ------------------------------------------------------------------
    /// Targets required in the queue before departure
    pub min_batch_size: usize,
    /// Minimum separation between two queued targets (meters)
    pub min_target_separation_m: f32,

    // ------------------------------------------------------------------
    // Packet validation
    // ------------------------------------------------------------------
    /// Minimum confidence required to accept a target
    pub min_confidence: f32,
    /// Maximum packet age before rejection (seconds)
    pub max_packet_age_s: f64,

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------
    /// Distance considered "arrived" at a target (meters)
    pub arrival_radius_m: f32,
    /// Cruise ground speed while traveling between targets (m/s)
    pub travel_speed_ms: f32,
    /// Climb above the current altitude on takeoff (meters)
    pub takeoff_climb_m: f32,

    // ------------------------------------------------------------------
    // Safety limits
    // ------------------------------------------------------------------
    /// Minimum battery voltage (volts)
    pub min_battery_voltage: f32,
    /// Minimum acceptable GPS fix
    pub min_fix: GpsFixType,
    /// GPS loss tolerated before recovery (seconds)
    pub gps_grace_s: f32,
    /// Maximum horizontal dilution of precision
    pub max_hdop: f32,
    /// Minimum visible satellites
    pub min_satellites: u8,
    /// Maximum roll during the mission (degrees)
    pub max_roll_deg: f32,
    /// Maximum pitch during the mission (degrees)
    pub max_pitch_deg: f32,
    /// Altitude ceiling (meters, relative)
    pub max_altitude_m: f32,

    // ------------------------------------------------------------------
    // Hover / recovery
    // ------------------------------------------------------------------
    /// Hover time after the last target before recovery (seconds)
    pub no_target_hover_s: f32,

    // ------------------------------------------------------------------
    // Vision alignment
    // ------------------------------------------------------------------
    /// Enable vision-based fine alignment before spraying
    pub alignment_enabled: bool,
    /// Pixel tolerance on each axis for "centered"
    pub alignment_tolerance_px: i32,
    /// Consecutive in-tolerance frames required to declare alignment
    pub alignment_stable_frames: u32,
    /// Vision silence tolerated before the subsystem counts as dead (seconds)
    pub alignment_timeout_s: f32,

    // ------------------------------------------------------------------
    // Spray sequence
    // ------------------------------------------------------------------
    /// Spray output duration per target (seconds)
    pub spray_duration_s: f32,
    /// Hold still before opening the valve (seconds)
    pub pre_spray_delay_s: f32,
    /// Hold after closing the valve so drips clear (seconds)
    pub post_spray_delay_s: f32,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 1,
            min_target_separation_m: 1.0,
            min_confidence: 0.6,
            max_packet_age_s: 9999.0,
            arrival_radius_m: 0.4,
            travel_speed_ms: 1.0,
            takeoff_climb_m: 5.0,
            min_battery_voltage: 10.0,
            min_fix: GpsFixType::Fix3D,
            gps_grace_s: 10.0,
            max_hdop: 2.5,
            min_satellites: 6,
            max_roll_deg: 3.0,
            max_pitch_deg: 3.0,
            max_altitude_m: 10.0,
            no_target_hover_s: 10.0,
            alignment_enabled: true,
            alignment_tolerance_px: 15,
            alignment_stable_frames: 10,
            alignment_timeout_s: 10.0,
            spray_duration_s: 2.0,
            pre_spray_delay_s: 3.0,
            post_spray_delay_s: 3.0,
        }
    }
}

impl MissionConfig {
    /// GPS grace period in milliseconds.
    pub fn gps_grace_ms(&self) -> u64 {
        (self.gps_grace_s * 1000.0) as u64
    }

    /// No-target hover window in milliseconds.
    pub fn no_target_hover_ms(&self) -> u64 {
        (self.no_target_hover_s * 1000.0) as u64
    }

    /// Vision silence timeout in milliseconds.
    pub fn alignment_timeout_ms(&self) -> u64 {
        (self.alignment_timeout_s * 1000.0) as u64
    }
}
