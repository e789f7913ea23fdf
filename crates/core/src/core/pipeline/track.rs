//! Stage track.
//!
//! The stage track holds one `StageState` per pipeline stage for the current cycle.
//! It performs:
//! 1. **Per-cycle refresh:** The controller overwrites every stage after each clock.
//! 2. **Breakpoint matching:** Finds stages holding a given valid PC.
//! 3. **Drain detection:** Reports whether any live instruction remains.
//!
//! The stage count is fixed at construction.

use crate::common::{SimError, SimResult};
use crate::core::pipeline::stage::{StageState, StageStatus};
use serde::{Deserialize, Serialize};

/// Ordered per-stage state; index 0 is the earliest stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTrack {
    stages: Vec<StageState>,
}

impl StageTrack {
    /// Creates a track of `stage_count` unused stages.
    pub fn new(stage_count: usize) -> Self {
        Self {
            stages: vec![StageState::UNUSED; stage_count],
        }
    }

    /// Creates a track from per-stage states, index 0 first.
    pub const fn from_states(stages: Vec<StageState>) -> Self {
        Self { stages }
    }

    /// Number of stages.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True for a processor without stages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// All stage states in stage order.
    #[inline]
    pub fn stages(&self) -> &[StageState] {
        &self.stages
    }

    /// Replaces the state of one stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfRange`] if `stage >= self.len()`.
    pub fn update(&mut self, stage: usize, state: StageState) -> SimResult<()> {
        let count = self.stages.len();
        let slot = self
            .stages
            .get_mut(stage)
            .ok_or(SimError::OutOfRange { index: stage, count })?;
        *slot = state;
        Ok(())
    }

    /// Returns the state of one stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfRange`] if `stage >= self.len()`.
    pub fn state_of(&self, stage: usize) -> SimResult<StageState> {
        self.stages
            .get(stage)
            .copied()
            .ok_or(SimError::OutOfRange {
                index: stage,
                count: self.stages.len(),
            })
    }

    /// Returns every stage currently holding `pc` as a valid instruction, in ascending
    /// stage order.
    ///
    /// This reports presence, not entry: a stalled stage keeps matching for as long as
    /// the instruction stays resident. Use [`StageTrack::entered_stages`] to fire once
    /// per passage.
    pub fn breakpoint_triggering_stages(&self, pc: u64) -> Vec<usize> {
        self.stages
            .iter()
            .enumerate()
            .filter(|(_, s)| s.valid && s.pc == pc)
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns the stages `pc` entered this cycle, given the track of the previous cycle.
    ///
    /// A stage holding `pc` as a valid instruction counts as entered unless it is stalled
    /// on the same valid `pc` it held in `previous`. A fresh instance of the same address
    /// arriving on consecutive cycles (a self-loop) enters every time.
    pub fn entered_stages(&self, previous: &Self, pc: u64) -> Vec<usize> {
        self.breakpoint_triggering_stages(pc)
            .into_iter()
            .filter(|&i| {
                let held = previous
                    .stages
                    .get(i)
                    .is_some_and(|prev| prev.valid && prev.pc == pc);
                !(held && self.stages[i].status == StageStatus::Stalled)
            })
            .collect()
    }

    /// True when every stage is either unused or holds no valid instruction.
    pub fn is_drained(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status == StageStatus::Unused || !s.valid)
    }

    /// Number of stages with the given status.
    pub fn count_status(&self, status: StageStatus) -> usize {
        self.stages.iter().filter(|s| s.status == status).count()
    }

    /// Marks every stage unused.
    pub fn reset(&mut self) {
        self.stages.fill(StageState::UNUSED);
    }
}
