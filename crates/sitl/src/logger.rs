//! Durable spray log.
//!
//! Appends one CSV row per completed target. The mission core emits
//! `TargetCompleted` events and forgets them; this sink is what makes a
//! run auditable after the battery comes out.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use spray_pilot_core::mission::MissionEvent;
use spray_pilot_core::packet::TargetStatus;

use crate::error::HarnessError;

#[derive(Debug, Serialize)]
struct SprayLogRow<'a> {
    id: u32,
    lat: f64,
    lon: f64,
    alt: f32,
    spray_duration: f32,
    timestamp: u64,
    status: &'a str,
}

/// Append-only CSV sink for completion events.
pub struct SprayLogWriter {
    path: PathBuf,
}

impl SprayLogWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the event if it is a completion; returns whether a row was
    /// written.
    pub fn log_event(&self, event: &MissionEvent, epoch_s: f64) -> Result<bool, HarnessError> {
        if let MissionEvent::TargetCompleted {
            id,
            lat,
            lon,
            alt_m,
            spray_duration_s,
            status,
        } = *event
        {
            self.append(SprayLogRow {
                id,
                lat,
                lon,
                alt: alt_m,
                spray_duration: spray_duration_s,
                timestamp: epoch_s as u64,
                status: match status {
                    TargetStatus::Sprayed => "sprayed",
                    TargetStatus::Skipped => "skipped",
                    TargetStatus::Pending => "pending",
                },
            })?;
            return Ok(true);
        }
        Ok(false)
    }

    fn append(&self, row: SprayLogRow<'_>) -> Result<(), HarnessError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let write_header = !self.path.exists();
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush().map_err(HarnessError::from)?;
        Ok(())
    }
}
