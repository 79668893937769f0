//! Scripted end-to-end spray mission on the host.
//!
//! Builds the whole stack — simulated vehicle, scripted vision, CSV
//! target feed, CSV spray log — and ticks the mission controller at a
//! simulated 10 Hz until it recovers. Prints the event stream as it
//! happens.
//!
//! Run with: `cargo run -p spray_pilot_sitl --bin spray_mission`

use std::fs;
use std::io::Write;

use spray_pilot_core::config::MissionConfig;
use spray_pilot_core::mission::{MissionController, MissionEvent, MissionState};
use spray_pilot_core::traits::{MockTime, TimeSource};
use spray_pilot_sitl::{CsvTargetFeed, ScriptedVision, SimVehicle, SprayLogWriter};

const TICK_MS: u64 = 100;
const EPOCH_BASE_S: f64 = 1_700_000_000.0;

fn write_targets_csv(path: &std::path::Path) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "id,lat,lon,alt,confidence,timestamp")?;
    writeln!(file, "1,35.0000000,139.0000000,3.0,0.92,{:.1}", EPOCH_BASE_S)?;
    writeln!(file, "2,35.0000300,139.0000000,3.0,0.81,{:.1}", EPOCH_BASE_S)?;
    writeln!(file, "3,35.0000300,139.0000400,3.0,0.77,{:.1}", EPOCH_BASE_S)?;
    // Duplicate id and an under-confidence row, both dropped in flight
    writeln!(file, "1,35.0001000,139.0001000,3.0,0.95,{:.1}", EPOCH_BASE_S)?;
    writeln!(file, "4,35.0001000,139.0001000,3.0,0.40,{:.1}", EPOCH_BASE_S)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir();
    let targets_path = dir.join(format!("spray_demo_targets_{}.csv", std::process::id()));
    let log_path = dir.join(format!("spray_demo_log_{}.csv", std::process::id()));
    let _ = fs::remove_file(&log_path);
    write_targets_csv(&targets_path)?;

    let time = MockTime::with_epoch_base(EPOCH_BASE_S);
    let config = MissionConfig::default();
    let mut controller = MissionController::new(config, time.clone());

    let mut vehicle = SimVehicle::parked_at(34.9999000, 139.0000000);
    let mut vision = ScriptedVision::locked_on();
    let mut feed = CsvTargetFeed::new(&targets_path);
    let mut sprayer = LoggingSprayer::default();
    let log = SprayLogWriter::new(&log_path);

    println!("=== spray_pilot SITL mission ===");
    println!("targets: {}", targets_path.display());
    println!("log:     {}", log_path.display());
    println!();

    let mut ticks = 0u32;
    loop {
        vehicle.step(TICK_MS as f32 / 1000.0);
        let events = controller.step(&mut vehicle, &mut sprayer, &mut feed, Some(&mut vision));

        for event in &events {
            match event {
                MissionEvent::StateChanged { from, to } => {
                    println!("[{:6.1}s] {} -> {}", sim_s(&time), from, to);
                }
                MissionEvent::TargetAccepted { id } => {
                    println!("[{:6.1}s] target {} accepted", sim_s(&time), id);
                }
                MissionEvent::TargetCompleted { id, status, .. } => {
                    println!("[{:6.1}s] target {} {}", sim_s(&time), id, status);
                    log.log_event(event, time.now_epoch_s())?;
                }
                MissionEvent::RecoverTriggered { reason } => {
                    println!("[{:6.1}s] recovery: {}", sim_s(&time), reason);
                }
            }
        }

        if controller.state() == MissionState::Recover {
            break;
        }

        time.advance_ms(TICK_MS);
        ticks += 1;
        if ticks > 100_000 {
            eprintln!("mission did not finish; aborting demo");
            break;
        }
    }

    let stats = controller.ingest_stats();
    println!();
    println!(
        "done after {:.1}s simulated: {} offered, {} accepted, {} invalid, {} duplicate",
        sim_s(&time),
        stats.offered,
        stats.accepted,
        stats.invalid,
        stats.duplicate
    );
    println!("spray log:");
    print!("{}", fs::read_to_string(&log_path)?);

    let _ = fs::remove_file(&targets_path);
    Ok(())
}

fn sim_s(time: &MockTime) -> f64 {
    time.now_ms() as f64 / 1000.0
}

/// Console sprayer: prints valve transitions.
#[derive(Default)]
struct LoggingSprayer {
    on: bool,
}

impl spray_pilot_core::traits::SprayActuator for LoggingSprayer {
    fn setup(&mut self) -> Result<(), &'static str> {
        self.on = false;
        println!("sprayer initialized (off)");
        Ok(())
    }
    fn set_on(&mut self) {
        if !self.on {
            println!("sprayer ON");
        }
        self.on = true;
    }
    fn set_off(&mut self) {
        if self.on {
            println!("sprayer OFF");
        }
        self.on = false;
    }
    fn is_on(&self) -> bool {
        self.on
    }
}
