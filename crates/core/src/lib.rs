//! Pipeline simulation controller library.
//!
//! This crate drives a multi-stage pipelined processor model one clock at a time for
//! instructional visualization. It provides the following:
//! 1. **Stage tracking:** Per-cycle occupancy and status of every pipeline stage.
//! 2. **Reversible execution:** A bounded history of cycle records that undoes clocks.
//! 3. **Finalization:** The drain state machine run once fetch leaves the program.
//! 4. **Breakpoints:** Stage-entry detection for breakpoint addresses.
//! 5. **Engine boundary:** The `ExecutionEngine` trait that a concrete processor model implements.
//!
//! The controller never decodes or executes instructions itself; that is the engine's job.

/// Common types (errors, register file identifiers).
pub mod common;
/// Controller configuration (defaults, history depth, breakpoint stages).
pub mod config;
/// Controller core (pipeline tracking, history, finalization, memory, controller).
pub mod core;
/// Cycle and retirement statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main controller type; owns stage tracking, history and finalization state.
pub use crate::core::ProcessorController;
/// Error type returned by controller operations.
pub use crate::common::{EngineFault, SimError, SimResult};
