//! Finalization (drain) state machine.
//!
//! Once fetch leaves the executable region, or the program performs an exit system call,
//! the processor stops fetching and lets in-flight instructions complete. This module
//! tracks that sequence:
//! 1. **Running:** Normal execution.
//! 2. **Draining:** No new fetches; waiting for the pipeline to empty. Cancellable.
//! 3. **Finished:** The pipeline is empty. Terminal until reset.

use crate::core::pipeline::StageTrack;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Bitmask of causes that started finalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinalizeReason(u8);

impl FinalizeReason {
    /// Not finalizing.
    pub const NONE: Self = Self(0);
    /// The next fetch address is outside the executable region.
    pub const EXITED_EXECUTABLE_REGION: Self = Self(0b01);
    /// The program performed an exit system call.
    pub const EXIT_SYSCALL: Self = Self(0b10);

    /// Builds a reason from its raw bitmask; unknown bits are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b11)
    }

    /// Raw bitmask.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if no cause is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every cause in `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FinalizeReason {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FinalizeReason {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Phase of the finalization sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizePhase {
    /// Normal execution.
    #[default]
    Running,
    /// Fetch stopped; in-flight instructions are completing.
    Draining,
    /// No instruction remains in the pipeline.
    Finished,
}

/// Tracks the finalization phase and the reasons it was entered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationTracker {
    phase: FinalizePhase,
    reason: FinalizeReason,
}

impl FinalizationTracker {
    /// Creates a tracker in the running phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> FinalizePhase {
        self.phase
    }

    /// Accumulated reasons; empty while running.
    #[inline]
    pub fn reason(&self) -> FinalizeReason {
        self.reason
    }

    /// True while fetch must be suppressed.
    #[inline]
    pub fn is_finalizing(&self) -> bool {
        self.phase != FinalizePhase::Running
    }

    /// True once the pipeline has drained.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase == FinalizePhase::Finished
    }

    /// Starts draining, or adds `reason` to an ongoing drain.
    ///
    /// Returns true on the transition out of `Running`. Ignored once finished and for an
    /// empty reason.
    pub fn begin_finalize(&mut self, reason: FinalizeReason) -> bool {
        if reason.is_empty() || self.is_finished() {
            return false;
        }
        self.reason |= reason;
        if self.phase == FinalizePhase::Running {
            self.phase = FinalizePhase::Draining;
            return true;
        }
        false
    }

    /// Returns a draining tracker to `Running` and clears the reason.
    ///
    /// Returns true if the tracker was draining.
    pub fn cancel_finalize(&mut self) -> bool {
        if self.phase != FinalizePhase::Draining {
            return false;
        }
        self.phase = FinalizePhase::Running;
        self.reason = FinalizeReason::NONE;
        true
    }

    /// Advances the drain: finishes once `track` holds no live instruction.
    ///
    /// Returns true on the transition to `Finished`.
    pub fn tick(&mut self, track: &StageTrack) -> bool {
        if self.phase == FinalizePhase::Draining && track.is_drained() {
            self.phase = FinalizePhase::Finished;
            return true;
        }
        false
    }

    /// Returns to `Running` with no reason.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
