//! Target feed adapters.
//!
//! [`CsvTargetFeed`] tail-follows the CSV file the perception host
//! appends target rows to. Matching the ingestion contract, it never
//! raises an error into the mission loop: unreadable files and malformed
//! rows are counted and skipped, and the mission simply sees fewer
//! packets. [`StaticFeed`] is the in-memory equivalent for tests and
//! demos.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use heapless::Vec as BoundedVec;
use serde::Deserialize;

use spray_pilot_core::packet::RawTargetPacket;
use spray_pilot_core::traits::{TargetFeed, MAX_PACKETS_PER_POLL};

/// One CSV row as the perception host writes it.
///
/// Every column is optional text; the core validator owns all parsing
/// and range checking.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl CsvRow {
    fn into_packet(self) -> RawTargetPacket {
        let field = |text: Option<String>| text.as_deref().and_then(RawTargetPacket::field);
        RawTargetPacket {
            id: field(self.id),
            lat: field(self.lat),
            lon: field(self.lon),
            alt: field(self.alt),
            confidence: field(self.confidence),
            timestamp: field(self.timestamp),
        }
    }
}

/// Polls a CSV file for newly appended target rows.
///
/// The file is reopened on every poll and already-consumed rows are
/// skipped by index, so the writer can keep appending with no
/// coordination. The file not existing yet is normal (the perception
/// host may start later).
pub struct CsvTargetFeed {
    path: PathBuf,
    rows_consumed: usize,
    read_errors: u32,
}

impl CsvTargetFeed {
    /// Feed that consumes rows already present at startup.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rows_consumed: 0,
            read_errors: 0,
        }
    }

    /// Feed that only consumes rows appended after startup.
    pub fn ignore_existing(path: impl AsRef<Path>) -> Self {
        let mut feed = Self::new(path);
        feed.rows_consumed = feed.count_rows();
        feed
    }

    /// Rows that failed to read or parse at the CSV layer.
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    fn count_rows(&self) -> usize {
        match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader.into_records().count(),
            Err(_) => 0,
        }
    }
}

impl TargetFeed for CsvTargetFeed {
    fn poll(&mut self) -> BoundedVec<RawTargetPacket, MAX_PACKETS_PER_POLL> {
        let mut batch = BoundedVec::new();

        if !self.path.exists() {
            return batch;
        }
        let reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(_) => {
                self.read_errors += 1;
                return batch;
            }
        };

        for (index, row) in reader.into_deserialize::<CsvRow>().enumerate() {
            if index < self.rows_consumed {
                continue;
            }
            if batch.is_full() {
                // Leave the rest for the next poll
                break;
            }
            self.rows_consumed = index + 1;
            match row {
                Ok(row) => {
                    let _ = batch.push(row.into_packet());
                }
                Err(_) => {
                    self.read_errors += 1;
                }
            }
        }

        batch
    }
}

/// Pre-loaded in-memory feed.
#[derive(Default)]
pub struct StaticFeed {
    pending: VecDeque<RawTargetPacket>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: RawTargetPacket) {
        self.pending.push_back(packet);
    }

    /// Queue a well-formed packet from plain values.
    pub fn push_target(&mut self, id: u32, lat: f64, lon: f64, alt: f32, timestamp_s: f64) {
        self.push(packet_from_values(id, lat, lon, alt, 0.9, timestamp_s));
    }
}

impl TargetFeed for StaticFeed {
    fn poll(&mut self) -> BoundedVec<RawTargetPacket, MAX_PACKETS_PER_POLL> {
        let mut batch = BoundedVec::new();
        while !batch.is_full() {
            match self.pending.pop_front() {
                Some(packet) => {
                    let _ = batch.push(packet);
                }
                None => break,
            }
        }
        batch
    }
}

/// Build a raw packet from already-typed values (tests, demos).
pub fn packet_from_values(
    id: u32,
    lat: f64,
    lon: f64,
    alt: f32,
    confidence: f32,
    timestamp_s: f64,
) -> RawTargetPacket {
    RawTargetPacket {
        id: RawTargetPacket::field(&id.to_string()),
        lat: RawTargetPacket::field(&format!("{:.7}", lat)),
        lon: RawTargetPacket::field(&format!("{:.7}", lon)),
        alt: RawTargetPacket::field(&format!("{:.2}", alt)),
        confidence: RawTargetPacket::field(&format!("{:.3}", confidence)),
        timestamp: RawTargetPacket::field(&format!("{:.1}", timestamp_s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};

    static FILE_SEQ: AtomicU32 = AtomicU32::new(0);

    fn temp_csv(name: &str) -> PathBuf {
        let seq = FILE_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "spray_pilot_feed_{}_{}_{}.csv",
            name,
            std::process::id(),
            seq
        ))
    }

    fn write_file(path: &Path, contents: &str) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn append_file(path: &Path, contents: &str) {
        let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    const HEADER: &str = "id,lat,lon,alt,confidence,timestamp\n";

    #[test]
    fn reads_existing_rows_once() {
        let path = temp_csv("existing");
        write_file(
            &path,
            &format!("{}1,35.0,139.0,3.0,0.9,100.0\n2,35.1,139.1,3.0,0.8,101.0\n", HEADER),
        );

        let mut feed = CsvTargetFeed::new(&path);
        let batch = feed.poll();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id.as_deref(), Some("1"));
        assert_eq!(batch[1].lat.as_deref(), Some("35.1"));

        // Second poll: nothing new
        assert!(feed.poll().is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn picks_up_appended_rows() {
        let path = temp_csv("appended");
        write_file(&path, &format!("{}1,35.0,139.0,3.0,0.9,100.0\n", HEADER));

        let mut feed = CsvTargetFeed::new(&path);
        assert_eq!(feed.poll().len(), 1);

        append_file(&path, "2,35.1,139.1,3.0,0.8,101.0\n");
        let batch = feed.poll();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id.as_deref(), Some("2"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn ignore_existing_skips_startup_rows() {
        let path = temp_csv("skip");
        write_file(&path, &format!("{}1,35.0,139.0,3.0,0.9,100.0\n", HEADER));

        let mut feed = CsvTargetFeed::ignore_existing(&path);
        assert!(feed.poll().is_empty());

        append_file(&path, "2,35.1,139.1,3.0,0.8,101.0\n");
        let batch = feed.poll();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id.as_deref(), Some("2"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let mut feed = CsvTargetFeed::new(temp_csv("missing"));
        assert!(feed.poll().is_empty());
        assert_eq!(feed.read_errors(), 0);
    }

    #[test]
    fn short_row_is_counted_and_skipped() {
        let path = temp_csv("short");
        write_file(
            &path,
            &format!("{}1,35.0,139.0,3.0,0.9,100.0\nbogus,row\n2,35.1,139.1,3.0,0.8,101.0\n", HEADER),
        );

        let mut feed = CsvTargetFeed::new(&path);
        let batch = feed.poll();
        // The malformed middle row disappears; both good rows survive
        assert_eq!(batch.len(), 2);
        assert_eq!(feed.read_errors(), 1);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn large_backlog_is_spread_across_polls() {
        let path = temp_csv("backlog");
        let mut contents = String::from(HEADER);
        for i in 0..40 {
            contents.push_str(&format!("{},35.0,139.0,3.0,0.9,100.0\n", i));
        }
        write_file(&path, &contents);

        let mut feed = CsvTargetFeed::new(&path);
        assert_eq!(feed.poll().len(), MAX_PACKETS_PER_POLL);
        assert_eq!(feed.poll().len(), MAX_PACKETS_PER_POLL);
        assert_eq!(feed.poll().len(), 40 - 2 * MAX_PACKETS_PER_POLL);
        assert!(feed.poll().is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn static_feed_drains_in_order() {
        let mut feed = StaticFeed::new();
        feed.push_target(1, 35.0, 139.0, 3.0, 100.0);
        feed.push_target(2, 35.1, 139.0, 3.0, 100.0);

        let batch = feed.poll();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id.as_deref(), Some("1"));
        assert_eq!(batch[1].id.as_deref(), Some("2"));
        assert!(feed.poll().is_empty());
    }
}
