//! Controller errors and engine faults.
//!
//! This module defines the error taxonomy of the controller. It provides:
//! 1. **Controller Errors:** Capability, history and index failures reported to the caller.
//! 2. **Engine Faults:** Failures raised by the external execution engine, propagated verbatim.
//!
//! Nothing is retried and nothing is swallowed: every error reaches the direct caller
//! of the failing operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias for results of controller operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors returned by controller operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    /// The operation requires a capability the processor does not declare.
    ///
    /// The associated value names the rejected operation.
    #[error("operation `{0}` requires the reversible capability")]
    UnsupportedOperation(&'static str),

    /// No recorded cycle remains to reverse.
    ///
    /// Either nothing has been clocked since reset, or the history horizon was exceeded.
    #[error("no reversible cycles remain in the history log")]
    ReversalExhausted,

    /// A stage index outside `[0, count)`.
    #[error("stage index {index} out of range (stage count {count})")]
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// The number of stages.
        count: usize,
    },

    /// The processor has finished; it must be reset before clocking again.
    #[error("processor has finished executing; reset before clocking")]
    Finished,

    /// A failure raised by the execution engine.
    #[error("engine fault: {0}")]
    EngineFault(#[from] EngineFault),
}

/// Failures originating in the execution engine or in the system call handler.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineFault {
    /// An instruction encoding the engine cannot execute.
    #[error("illegal instruction {word:#010x} at {pc:#x}")]
    IllegalInstruction {
        /// Address of the faulting instruction.
        pc: u64,
        /// Raw instruction word.
        word: u32,
    },

    /// A memory access violating the engine's alignment rules.
    #[error("misaligned access at {addr:#x}")]
    MisalignedAccess {
        /// Faulting address.
        addr: u64,
    },

    /// A memory access outside any valid region.
    #[error("access fault at {addr:#x}")]
    AccessFault {
        /// Faulting address.
        addr: u64,
    },

    /// The system call handler rejected the request.
    #[error("system call failed: {0}")]
    Syscall(String),

    /// Any other engine-specific failure.
    #[error("{0}")]
    Other(String),
}
