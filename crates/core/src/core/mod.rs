//! Controller core.
//!
//! This module holds everything between the embedding environment and the execution
//! engine:
//! 1. **Pipeline:** Stage states, the stage track and the engine trait.
//! 2. **Memory:** The journaling address space engines expose.
//! 3. **History:** The bounded log of recorded cycles.
//! 4. **Finalization:** The drain state machine.
//! 5. **Controller:** Clock, reverse and reset orchestration, hooks and notifications.

/// Breakpoint registration and hit reporting.
pub mod breakpoint;

/// Clock, reverse and reset orchestration.
pub mod controller;

/// Finalization (drain) state machine.
pub mod finalize;

/// Bounded history of recorded cycles.
pub mod history;

/// Hooks injected by the embedding environment.
pub mod hooks;

/// Journaling byte-addressable memory.
pub mod memory;

/// Observer notifications.
pub mod notify;

/// Pipeline stage tracking and the execution engine interface.
pub mod pipeline;

pub use controller::{ControllerState, ProcessorController};
