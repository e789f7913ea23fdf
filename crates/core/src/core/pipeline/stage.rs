//! Per-stage state.
//!
//! A `StageState` describes what one pipeline stage holds during one cycle. It is derived
//! each cycle from the `StageSignals` the engine reports for that stage.

use serde::{Deserialize, Serialize};

/// Annotation of why a stage is or is not doing normal work this cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageStatus {
    /// The stage is processing its instruction normally.
    None,
    /// The stage holds its instruction from the previous cycle.
    Stalled,
    /// The stage's instruction was squashed.
    Flushed,
    /// The stage is blocked by a structural hazard on a multi-way resource.
    WayHazard,
    /// No instruction has entered the stage.
    #[default]
    Unused,
}

/// Raw status signals the engine reports for one stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageSignals {
    /// An instruction is present in the stage.
    pub occupied: bool,
    /// The stage did not advance this cycle.
    pub stalled: bool,
    /// The stage's instruction was squashed.
    pub flushed: bool,
    /// The stage lost arbitration for a shared way.
    pub way_hazard: bool,
}

/// Occupancy and status of one pipeline stage for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageState {
    /// Program counter of the instruction occupying the stage.
    pub pc: u64,
    /// Whether an instruction occupies the stage.
    pub valid: bool,
    /// Status annotation.
    pub status: StageStatus,
}

impl StageState {
    /// The state of a stage no instruction has entered.
    pub const UNUSED: Self = Self {
        pc: 0,
        valid: false,
        status: StageStatus::Unused,
    };

    /// Derives a stage state from the engine's raw signals.
    ///
    /// A flush takes precedence over every other signal, and a flushed instruction is
    /// never valid. An unoccupied stage is `Unused`.
    pub fn from_signals(pc: u64, signals: StageSignals) -> Self {
        let status = if signals.flushed {
            StageStatus::Flushed
        } else if !signals.occupied {
            StageStatus::Unused
        } else if signals.stalled {
            StageStatus::Stalled
        } else if signals.way_hazard {
            StageStatus::WayHazard
        } else {
            StageStatus::None
        };
        Self {
            pc,
            valid: signals.occupied && !signals.flushed,
            status,
        }
    }

    /// True if the stage holds a live instruction.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.valid && self.status != StageStatus::Unused
    }
}
