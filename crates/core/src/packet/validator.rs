//! Packet validation.
//!
//! Pure classification of a single raw packet: parse, range-check,
//! freshness-check, and emit a pending [`TargetRecord`] — or name the
//! first rule the packet broke. No I/O, no side effects; rejected
//! packets are simply dropped by the caller (the source may resend).

use core::fmt;

use super::{RawTargetPacket, TargetRecord, TargetStatus};
use crate::config::MissionConfig;

/// Why a raw packet was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent
    MissingField(&'static str),
    /// A field was present but not parseable as a finite number
    Malformed(&'static str),
    /// Latitude outside [-90, 90]
    LatitudeOutOfRange,
    /// Longitude outside [-180, 180]
    LongitudeOutOfRange,
    /// Confidence below the configured minimum
    ConfidenceTooLow,
    /// Packet older than the configured maximum age
    Stale,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(name) => write!(f, "missing field: {}", name),
            ValidationError::Malformed(name) => write!(f, "malformed field: {}", name),
            ValidationError::LatitudeOutOfRange => write!(f, "latitude out of range"),
            ValidationError::LongitudeOutOfRange => write!(f, "longitude out of range"),
            ValidationError::ConfidenceTooLow => write!(f, "confidence below minimum"),
            ValidationError::Stale => write!(f, "packet too old"),
        }
    }
}

/// Normalizes raw target reports into typed, range-checked records.
#[derive(Debug, Clone)]
pub struct PacketValidator {
    min_confidence: f32,
    max_age_s: f64,
}

impl PacketValidator {
    pub fn new(config: &MissionConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            max_age_s: config.max_packet_age_s,
        }
    }

    /// Validate one raw packet against `now_epoch_s`.
    ///
    /// On success the returned record is `Pending` and carries exactly
    /// the parsed values; the validator never mutates anything.
    pub fn validate(
        &self,
        raw: &RawTargetPacket,
        now_epoch_s: f64,
    ) -> Result<TargetRecord, ValidationError> {
        let id = parse_u32(&raw.id, "id")?;
        let lat = parse_finite(&raw.lat, "lat")?;
        let lon = parse_finite(&raw.lon, "lon")?;
        let alt = parse_finite(&raw.alt, "alt")? as f32;
        let confidence = parse_finite(&raw.confidence, "confidence")? as f32;
        let timestamp = parse_finite(&raw.timestamp, "timestamp")?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::LongitudeOutOfRange);
        }
        if confidence < self.min_confidence {
            return Err(ValidationError::ConfidenceTooLow);
        }
        if now_epoch_s - timestamp > self.max_age_s {
            return Err(ValidationError::Stale);
        }

        Ok(TargetRecord {
            id,
            lat,
            lon,
            alt_m: alt,
            confidence,
            observed_at_s: timestamp,
            status: TargetStatus::Pending,
        })
    }
}

fn parse_u32(
    field: &Option<super::FieldBuf>,
    name: &'static str,
) -> Result<u32, ValidationError> {
    let text = field.as_deref().ok_or(ValidationError::MissingField(name))?;
    text.trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::Malformed(name))
}

fn parse_finite(
    field: &Option<super::FieldBuf>,
    name: &'static str,
) -> Result<f64, ValidationError> {
    let text = field.as_deref().ok_or(ValidationError::MissingField(name))?;
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::Malformed(name))?;
    if !value.is_finite() {
        return Err(ValidationError::Malformed(name));
    }
    Ok(value)
}
