//! Mission state machine.
//!
//! A hand-maintained transition table with one deliberate escape hatch:
//! [`StateMachine::force_recover`] moves to [`MissionState::Recover`]
//! from anywhere, bypassing the table. The controller evaluates that
//! override before any normal state handling each tick, so recovery is
//! reachable no matter what the table says. `Recover` itself has no
//! outgoing edges; only [`StateMachine::reset`] leaves it.

use core::fmt;

/// Mission execution states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissionState {
    /// Subsystem bring-up (spray output, optional vision)
    #[default]
    Init,
    /// On the ground, waiting for a full batch of targets
    Idle,
    /// Arming and climbing to travel altitude
    ArmTakeoff,
    /// Traveling to the current target
    Navigate,
    /// Vision fine-alignment over the target
    Align,
    /// Timed spray sequence
    Spray,
    /// Bookkeeping after a spray: completion, next target
    PostSpray,
    /// Returning to launch; terminal for this mission attempt
    Recover,
}

impl MissionState {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionState::Init => "INIT",
            MissionState::Idle => "IDLE",
            MissionState::ArmTakeoff => "ARM_TAKEOFF",
            MissionState::Navigate => "NAVIGATE",
            MissionState::Align => "ALIGN",
            MissionState::Spray => "SPRAY",
            MissionState::PostSpray => "POST_SPRAY",
            MissionState::Recover => "RECOVER",
        }
    }
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transition the table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: MissionState,
    pub to: MissionState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transition: {} -> {}", self.from, self.to)
    }
}

/// Owns the current state and enforces the transition table.
pub struct StateMachine {
    state: MissionState,
}

impl StateMachine {
    pub const fn new() -> Self {
        Self {
            state: MissionState::Init,
        }
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    /// Whether the table allows `from -> to`.
    pub fn can_transition(from: MissionState, to: MissionState) -> bool {
        use MissionState::*;
        matches!(
            (from, to),
            (Init, Idle)
                | (Idle, ArmTakeoff)
                | (ArmTakeoff, Navigate)
                | (Navigate, Align)
                | (Navigate, Spray)
                | (Align, Spray)
                | (Spray, PostSpray)
                | (PostSpray, Navigate)
                | (PostSpray, Recover)
        )
    }

    /// Table-checked transition.
    pub fn set_state(&mut self, next: MissionState) -> Result<MissionState, TransitionError> {
        if Self::can_transition(self.state, next) {
            self.state = next;
            Ok(next)
        } else {
            Err(TransitionError {
                from: self.state,
                to: next,
            })
        }
    }

    /// Emergency override: enter `Recover` from any state.
    ///
    /// Deliberately not a table entry — the table can never be edited
    /// into a shape where recovery becomes unreachable.
    pub fn force_recover(&mut self) -> MissionState {
        self.state = MissionState::Recover;
        self.state
    }

    /// External full reset, the only way out of `Recover`.
    pub fn reset(&mut self) {
        self.state = MissionState::Init;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
