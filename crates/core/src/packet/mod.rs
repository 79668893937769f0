//! Target packet types.
//!
//! A raw packet is the untrusted shape that crosses the ingestion
//! boundary: six fields that may each be absent or non-numeric,
//! mirroring a row pulled from a CSV feed or a telemetry side channel.
//! The [`validator`] turns a raw packet into a [`TargetRecord`] or
//! rejects it; nothing else in the crate ever touches raw field text.

pub mod validator;

use core::fmt;

use heapless::String;

pub use validator::{PacketValidator, ValidationError};

/// Bounded buffer for one raw field's text.
pub type FieldBuf = String<32>;

/// Untrusted target report as received from the perception host.
///
/// Fields are `None` when the source row lacked the column entirely.
/// Text that does not fit [`FieldBuf`] is treated as absent — nothing a
/// well-formed source emits comes close to the bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTargetPacket {
    pub id: Option<FieldBuf>,
    pub lat: Option<FieldBuf>,
    pub lon: Option<FieldBuf>,
    pub alt: Option<FieldBuf>,
    pub confidence: Option<FieldBuf>,
    pub timestamp: Option<FieldBuf>,
}

impl RawTargetPacket {
    /// Wrap one field's text, mapping oversized text to `None`.
    pub fn field(text: &str) -> Option<FieldBuf> {
        let mut buf = FieldBuf::new();
        buf.push_str(text).ok()?;
        Some(buf)
    }
}

/// Lifecycle status of a target.
///
/// A record is created `Pending` and moves to exactly one terminal
/// status when the controller finishes with it; there is no transition
/// back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetStatus {
    /// Waiting in the queue or checked out for service
    #[default]
    Pending,
    /// Serviced: the spray sequence ran at this target
    Sprayed,
    /// Abandoned without service (mission recovered first)
    Skipped,
}

impl TargetStatus {
    /// True for statuses a record can never leave.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TargetStatus::Pending)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Pending => write!(f, "pending"),
            TargetStatus::Sprayed => write!(f, "sprayed"),
            TargetStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Validated target: one location the vehicle must visit and spray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRecord {
    /// Source-assigned identifier, unique per perception run
    pub id: u32,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Target altitude above home in meters
    pub alt_m: f32,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
    /// Epoch seconds when the target was observed
    pub observed_at_s: f64,
    /// Lifecycle status
    pub status: TargetStatus,
}
