//! Pipeline stage tracking and the execution engine boundary.
//!
//! This module provides:
//! 1. **Stage State:** The per-cycle occupancy snapshot of one stage.
//! 2. **Stage Track:** The ordered set of stage states, refreshed every cycle.
//! 3. **Engine:** The trait implemented by concrete processor models.

/// Execution engine trait and capability flags.
pub mod engine;

/// Per-stage state and the raw signals it is derived from.
pub mod stage;

/// Ordered per-stage state for the current cycle.
pub mod track;

pub use engine::{Capabilities, Capability, CycleEvents, ExecutionEngine};
pub use stage::{StageSignals, StageState, StageStatus};
pub use track::StageTrack;
