//! Mission execution.
//!
//! Three layers, bottom up:
//!
//! - [`state`]: the `MissionState` enum and the transition-table state
//!   machine with its unconditional recovery override
//! - [`sequence`]: timed sub-state machines (arm/takeoff, spray cycle)
//!   advanced across ticks so the loop never blocks
//! - [`controller`]: the per-tick driver owning queue, safety gate,
//!   alignment monitor, timers, and the state machine
//!
//! The controller is the only mutation context for mission state; see
//! the crate docs for the single-tick ownership rule.

pub mod controller;
pub mod sequence;
pub mod state;

pub use controller::{
    IngestStats, MissionController, MissionEvent, RecoverReason, MAX_EVENTS_PER_TICK,
};
pub use sequence::{SprayPhase, SpraySequence, TakeoffPhase, TakeoffSequence};
pub use state::{MissionState, StateMachine, TransitionError};
