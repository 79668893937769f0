//! Mission controller.
//!
//! The per-tick driver of a spray mission. Every tick:
//!
//! 1. Evaluate the safety gate — a violation forces `Recover`
//!    immediately, before any state handling, from any state.
//! 2. Drain newly arrived packets through the validator into the queue.
//! 3. Dispatch on the current state.
//!
//! The controller owns all mission state (state machine, queue, timers,
//! in-flight sub-sequences) and mutates it only inside [`step`]. External
//! collaborators are passed in per tick, never stored, so the borrow
//! story stays trivial and the same controller runs against hardware or
//! mocks.
//!
//! [`step`]: MissionController::step

#[cfg(feature = "defmt")]
use defmt::{info, warn};

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {{}};
}

use core::fmt;

use heapless::Vec;

use super::sequence::{SpraySequence, TakeoffSequence};
use super::state::{MissionState, StateMachine};
use crate::align::{AlignmentMonitor, AlignmentStatus};
use crate::config::MissionConfig;
use crate::nav::flat_distance_m;
use crate::packet::{PacketValidator, TargetStatus};
use crate::queue::{AcceptError, TargetQueue};
use crate::safety::{SafetyGate, SafetyViolation};
use crate::traits::{
    FlightMode, SprayActuator, TargetFeed, TimeSource, VehiclePlatform, VisionSample, VisionSensor,
};

/// Event list capacity per tick: a full ingest burst plus state traffic.
pub const MAX_EVENTS_PER_TICK: usize = 24;

/// Why the mission entered `Recover`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoverReason {
    /// A safety check failed (or its grace ran out)
    Safety(SafetyViolation),
    /// Queue empty past the hover window
    OutOfTargets,
    /// The alignment target stayed out of view past its timeout
    AlignmentLost,
    /// A subsystem failed to come up during `Init`
    InitFailure(&'static str),
}

impl fmt::Display for RecoverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoverReason::Safety(violation) => write!(f, "safety: {}", violation),
            RecoverReason::OutOfTargets => write!(f, "no more targets"),
            RecoverReason::AlignmentLost => write!(f, "alignment target lost"),
            RecoverReason::InitFailure(what) => write!(f, "init failed: {}", what),
        }
    }
}

/// Events emitted by one controller tick.
///
/// The host layer turns `TargetCompleted` into the durable spray log;
/// everything else is telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissionEvent {
    /// The state machine moved
    StateChanged {
        from: MissionState,
        to: MissionState,
    },
    /// A new target passed validation and deduplication
    TargetAccepted { id: u32 },
    /// A target reached a terminal status
    TargetCompleted {
        id: u32,
        lat: f64,
        lon: f64,
        alt_m: f32,
        spray_duration_s: f32,
        status: TargetStatus,
    },
    /// Recovery began
    RecoverTriggered { reason: RecoverReason },
}

/// Ingestion drop counters. Diagnostics only; drops are never retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Packets offered by the feed
    pub offered: u32,
    /// Packets accepted into the queue
    pub accepted: u32,
    /// Dropped by the validator
    pub invalid: u32,
    /// Dropped as id or position duplicates
    pub duplicate: u32,
    /// Dropped because a capacity bound was hit
    pub overflow: u32,
}

/// Finite-state mission driver.
pub struct MissionController<T: TimeSource> {
    config: MissionConfig,
    time: T,
    machine: StateMachine,
    queue: TargetQueue,
    validator: PacketValidator,
    gate: SafetyGate,
    monitor: AlignmentMonitor,
    stats: IngestStats,
    takeoff: Option<TakeoffSequence>,
    spray: Option<SpraySequence>,
    /// First tick on which the queue was found empty (no-target policy)
    no_target_since_ms: Option<u64>,
}

impl<T: TimeSource> MissionController<T> {
    pub fn new(config: MissionConfig, time: T) -> Self {
        let queue = TargetQueue::new(&config);
        let validator = PacketValidator::new(&config);
        let monitor = AlignmentMonitor::new(&config);
        Self {
            config,
            time,
            machine: StateMachine::new(),
            queue,
            validator,
            gate: SafetyGate::new(),
            monitor,
            stats: IngestStats::default(),
            takeoff: None,
            spray: None,
            no_target_since_ms: None,
        }
    }

    pub fn state(&self) -> MissionState {
        self.machine.state()
    }

    pub fn ingest_stats(&self) -> IngestStats {
        self.stats
    }

    pub fn queue(&self) -> &TargetQueue {
        &self.queue
    }

    /// Run one mission tick.
    ///
    /// Non-blocking: the longest anything waits in here is one telemetry
    /// read. The vision sensor is sampled once per tick when present —
    /// both to feed the alignment monitor and to keep the safety gate's
    /// heartbeat alive.
    pub fn step(
        &mut self,
        vehicle: &mut dyn VehiclePlatform,
        sprayer: &mut dyn SprayActuator,
        feed: &mut dyn TargetFeed,
        mut vision: Option<&mut dyn VisionSensor>,
    ) -> Vec<MissionEvent, MAX_EVENTS_PER_TICK> {
        let mut events = Vec::new();
        let now_ms = self.time.now_ms();

        // Pump the vision pipeline and heartbeat regardless of state, so
        // the heartbeat reflects pipeline liveness, not mission phase.
        let frame = match vision.as_mut() {
            Some(v) => v.sample(),
            None => None,
        };
        if frame.is_some() {
            self.gate.note_vision_heartbeat(now_ms);
        }

        // ---------- Safety first, from any state ----------
        if self.machine.state() != MissionState::Recover {
            let snapshot = vehicle.telemetry();
            if let Err(violation) = self.gate.evaluate(&snapshot, &self.config, now_ms) {
                self.enter_recover(RecoverReason::Safety(violation), sprayer, &mut events);
                return events;
            }
        }

        // ---------- Ingest new targets ----------
        self.drain_feed(feed, &mut events);

        // ---------- State dispatch ----------
        match self.machine.state() {
            MissionState::Init => self.tick_init(sprayer, vision, &mut events),
            MissionState::Idle => {
                if self.queue.ready_for_dispatch() {
                    self.transition(MissionState::ArmTakeoff, &mut events);
                }
            }
            MissionState::ArmTakeoff => {
                let climb = self.config.takeoff_climb_m;
                let sequence = self.takeoff.get_or_insert_with(|| TakeoffSequence::new(climb));
                if sequence.update(vehicle) {
                    self.takeoff = None;
                    self.transition(MissionState::Navigate, &mut events);
                }
            }
            MissionState::Navigate => {
                let align_active = self.config.alignment_enabled && vision.is_some();
                self.tick_navigate(vehicle, sprayer, align_active, now_ms, &mut events);
            }
            MissionState::Align => self.tick_align(frame, sprayer, now_ms, &mut events),
            MissionState::Spray => {
                let config = &self.config;
                let sequence = self
                    .spray
                    .get_or_insert_with(|| SpraySequence::start(config, now_ms));
                if sequence.update(sprayer, now_ms) {
                    self.spray = None;
                    self.transition(MissionState::PostSpray, &mut events);
                }
            }
            MissionState::PostSpray => self.tick_post_spray(now_ms, &mut events),
            MissionState::Recover => {
                vehicle.set_mode(FlightMode::Rtl);
                sprayer.set_off();
            }
        }

        events
    }

    /// External full reset: the only way out of `Recover`.
    ///
    /// Clears mission state, timers, and in-flight sequences. The queue
    /// survives — seen ids are permanent, and pending targets remain for
    /// the next attempt. An abandoned checkout is closed out as
    /// `Skipped` and returned for logging.
    pub fn reset(&mut self) -> Option<crate::packet::TargetRecord> {
        let abandoned = self.queue.complete_current(TargetStatus::Skipped).ok();
        self.machine.reset();
        self.gate.reset();
        self.monitor.reset();
        self.stats = IngestStats::default();
        self.takeoff = None;
        self.spray = None;
        self.no_target_since_ms = None;
        abandoned
    }

    // ------------------------------------------------------------------
    // Tick handlers
    // ------------------------------------------------------------------

    fn tick_init(
        &mut self,
        sprayer: &mut dyn SprayActuator,
        vision: Option<&mut dyn VisionSensor>,
        events: &mut Vec<MissionEvent, MAX_EVENTS_PER_TICK>,
    ) {
        if sprayer.setup().is_err() {
            self.enter_recover(RecoverReason::InitFailure("spray actuator"), sprayer, events);
            return;
        }
        if self.config.alignment_enabled {
            if let Some(v) = vision {
                if v.start().is_err() {
                    self.enter_recover(RecoverReason::InitFailure("vision"), sprayer, events);
                    return;
                }
            }
        }
        self.transition(MissionState::Idle, events);
    }

    fn tick_navigate(
        &mut self,
        vehicle: &mut dyn VehiclePlatform,
        sprayer: &mut dyn SprayActuator,
        align_active: bool,
        now_ms: u64,
        events: &mut Vec<MissionEvent, MAX_EVENTS_PER_TICK>,
    ) {
        if self.queue.current().is_none() {
            if self.queue.dequeue_next().is_none() {
                // Nothing to fly: hover under the no-target policy
                if self.no_target_hover_expired(now_ms) {
                    self.enter_recover(RecoverReason::OutOfTargets, sprayer, events);
                }
                return;
            }
            self.monitor.reset();
        }

        let target = match self.queue.current() {
            Some(t) => *t,
            None => return,
        };

        vehicle.set_groundspeed(self.config.travel_speed_ms);
        vehicle.goto_location(target.lat, target.lon, target.alt_m);

        let snapshot = vehicle.telemetry();
        let distance = flat_distance_m(snapshot.lat, snapshot.lon, target.lat, target.lon);
        if distance <= self.config.arrival_radius_m {
            if align_active {
                self.transition(MissionState::Align, events);
            } else {
                self.transition(MissionState::Spray, events);
            }
        }
    }

    fn tick_align(
        &mut self,
        frame: Option<VisionSample>,
        sprayer: &mut dyn SprayActuator,
        now_ms: u64,
        events: &mut Vec<MissionEvent, MAX_EVENTS_PER_TICK>,
    ) {
        let sample = match frame {
            Some(sample) => sample,
            // No frame this tick: the gate's heartbeat check is aging
            // toward recovery; nothing to feed the monitor.
            None => return,
        };
        match self.monitor.update(sample, now_ms) {
            AlignmentStatus::Aligned => self.transition(MissionState::Spray, events),
            AlignmentStatus::NotAligned => {}
            // The target left the camera's view and stayed gone: there
            // is no way to finish this alignment, so take the one
            // recovery path rather than hover here forever.
            AlignmentStatus::Lost => {
                self.enter_recover(RecoverReason::AlignmentLost, sprayer, events);
            }
        }
    }

    fn tick_post_spray(
        &mut self,
        now_ms: u64,
        events: &mut Vec<MissionEvent, MAX_EVENTS_PER_TICK>,
    ) {
        if let Ok(done) = self.queue.complete_current(TargetStatus::Sprayed) {
            let _ = events.push(MissionEvent::TargetCompleted {
                id: done.id,
                lat: done.lat,
                lon: done.lon,
                alt_m: done.alt_m,
                spray_duration_s: self.config.spray_duration_s,
                status: done.status,
            });
        }

        if self.queue.has_pending() {
            self.transition(MissionState::Navigate, events);
        } else if self.no_target_hover_expired(now_ms) {
            // Declared table edge: exhausted work after a spray
            self.transition(MissionState::Recover, events);
            let _ = events.push(MissionEvent::RecoverTriggered {
                reason: RecoverReason::OutOfTargets,
            });
        } else {
            self.transition(MissionState::Navigate, events);
        }
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    fn drain_feed(
        &mut self,
        feed: &mut dyn TargetFeed,
        events: &mut Vec<MissionEvent, MAX_EVENTS_PER_TICK>,
    ) {
        let was_empty = !self.queue.has_pending();
        let now_epoch_s = self.time.now_epoch_s();

        for raw in feed.poll() {
            self.stats.offered += 1;
            match self.validator.validate(&raw, now_epoch_s) {
                Ok(record) => match self.queue.accept(record) {
                    Ok(()) => {
                        self.stats.accepted += 1;
                        let _ = events.push(MissionEvent::TargetAccepted { id: record.id });
                    }
                    Err(AcceptError::DuplicateId) | Err(AcceptError::TooClose) => {
                        self.stats.duplicate += 1;
                    }
                    Err(AcceptError::QueueFull) | Err(AcceptError::SeenSetFull) => {
                        self.stats.overflow += 1;
                    }
                },
                Err(_) => {
                    self.stats.invalid += 1;
                }
            }
        }

        if was_empty && self.queue.has_pending() {
            self.no_target_since_ms = None;
        }
    }

    /// No-target hover policy. Starts the timer on first call with an
    /// empty queue; reports expiry once the hover window has passed.
    fn no_target_hover_expired(&mut self, now_ms: u64) -> bool {
        match self.no_target_since_ms {
            None => {
                self.no_target_since_ms = Some(now_ms);
                false
            }
            Some(since) => now_ms.saturating_sub(since) >= self.config.no_target_hover_ms(),
        }
    }

    fn transition(
        &mut self,
        next: MissionState,
        events: &mut Vec<MissionEvent, MAX_EVENTS_PER_TICK>,
    ) {
        let from = self.machine.state();
        match self.machine.set_state(next) {
            Ok(to) => {
                info!("mission state: {} -> {}", from.as_str(), to.as_str());
                let _ = events.push(MissionEvent::StateChanged { from, to });
            }
            Err(_) => {
                warn!(
                    "refused transition: {} -> {}",
                    from.as_str(),
                    next.as_str()
                );
            }
        }
    }

    /// Unconditional recovery override.
    fn enter_recover(
        &mut self,
        reason: RecoverReason,
        sprayer: &mut dyn SprayActuator,
        events: &mut Vec<MissionEvent, MAX_EVENTS_PER_TICK>,
    ) {
        if self.machine.state() == MissionState::Recover {
            return;
        }
        let from = self.machine.state();
        self.machine.force_recover();

        // Kill any in-flight sequence; the valve must not stay open
        if let Some(mut sequence) = self.spray.take() {
            sequence.abort(sprayer);
        } else {
            sprayer.set_off();
        }
        self.takeoff = None;

        info!("entering recovery");
        let _ = events.push(MissionEvent::StateChanged {
            from,
            to: MissionState::Recover,
        });
        let _ = events.push(MissionEvent::RecoverTriggered { reason });
    }
}
