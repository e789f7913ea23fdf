//! Simulation statistics collection and reporting.
//!
//! This module tracks the counters the controller exposes outward. It provides:
//! 1. **Cycle and retirement:** Total cycles and retired instructions, plus CPI.
//! 2. **Stage occupancy:** Stalled and flushed stage-cycles.
//! 3. **Reversal:** The number of cycles undone since reset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters maintained by the controller.
///
/// Everything except `reversals` is part of the recorded cycle state and is restored
/// when a cycle is reversed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    /// Clock cycles executed since reset.
    pub cycles: u64,
    /// Instructions that left the final pipeline stage.
    pub instructions_retired: u64,
    /// Sum over cycles of the number of stalled stages.
    pub stalled_stage_cycles: u64,
    /// Sum over cycles of the number of flushed stages.
    pub flushed_stage_cycles: u64,
    /// Cycles undone since reset.
    pub reversals: u64,
}

impl SimStats {
    /// Cycles per retired instruction, or `None` before the first retirement.
    pub fn cpi(&self) -> Option<f64> {
        if self.instructions_retired == 0 {
            None
        } else {
            Some(self.cycles as f64 / self.instructions_retired as f64)
        }
    }

    /// Copies every counter except `reversals` from `recorded`.
    pub(crate) fn restore_from(&mut self, recorded: &Self) {
        let reversals = self.reversals;
        *self = *recorded;
        self.reversals = reversals;
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cycles               {}", self.cycles)?;
        writeln!(f, "instructions retired {}", self.instructions_retired)?;
        match self.cpi() {
            Some(cpi) => writeln!(f, "cpi                  {cpi:.3}")?,
            None => writeln!(f, "cpi                  n/a")?,
        }
        writeln!(f, "stalled stage-cycles {}", self.stalled_stage_cycles)?;
        writeln!(f, "flushed stage-cycles {}", self.flushed_stage_cycles)?;
        write!(f, "reversals            {}", self.reversals)
    }
}
