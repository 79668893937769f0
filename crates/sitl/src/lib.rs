//! spray_pilot_sitl - Host-side harness for the spray mission core.
//!
//! Everything the no_std core treats as an external collaborator gets a
//! software-in-the-loop implementation here:
//!
//! - [`vehicle::SimVehicle`]: kinematic point-mass vehicle with fault
//!   injection hooks
//! - [`vision::ScriptedVision`]: replayable vision sample source
//! - [`feed::CsvTargetFeed`]: tail-follows a CSV file of target rows
//! - [`feed::StaticFeed`]: in-memory feed for tests
//! - [`logger::SprayLogWriter`]: durable CSV sink for completion events
//! - [`time::HostTime`]: wall clock
//!
//! Wire these into `MissionController::step` and a complete mission runs
//! on a laptop; see `src/bin/spray_mission.rs` for the demo loop.

pub mod error;
pub mod feed;
pub mod logger;
pub mod time;
pub mod vehicle;
pub mod vision;

pub use error::HarnessError;
pub use feed::{CsvTargetFeed, StaticFeed};
pub use logger::SprayLogWriter;
pub use time::HostTime;
pub use vehicle::SimVehicle;
pub use vision::ScriptedVision;
