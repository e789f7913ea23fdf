//! Hooks injected by the embedding environment.
//!
//! The controller queries the environment through two callbacks supplied at construction:
//! 1. **Executable region:** Whether an address holds code that may be fetched.
//! 2. **System calls:** Servicing a system call the engine has reached.
//!
//! Neither has a default; an embedder that never services system calls must say so.

use crate::common::{EngineFault, RegisterFileType};
use crate::core::memory::Memory;
use crate::core::pipeline::ExecutionEngine;
use std::fmt;

/// Predicate deciding whether an address may be fetched.
pub type ExecutablePredicate = Box<dyn Fn(u64) -> bool>;

/// Handler servicing one system call.
pub type SyscallHandler =
    Box<dyn FnMut(&mut SyscallContext<'_>) -> Result<SyscallOutcome, EngineFault>>;

/// Result of servicing a system call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyscallOutcome {
    /// Execution continues.
    Continue,
    /// The program requested termination; the controller starts finalizing.
    Exit,
}

/// Architectural state reachable from a system call handler.
pub trait ArchState {
    /// Reads a register.
    fn read_register(&self, file: RegisterFileType, index: usize) -> u64;
    /// Writes a register.
    fn write_register(&mut self, file: RegisterFileType, index: usize, value: u64);
    /// The address space.
    fn arch_memory(&self) -> &Memory;
    /// Mutable access to the address space.
    fn arch_memory_mut(&mut self) -> &mut Memory;
}

impl<E: ExecutionEngine> ArchState for E {
    fn read_register(&self, file: RegisterFileType, index: usize) -> u64 {
        ExecutionEngine::register_value(self, file, index)
    }

    fn write_register(&mut self, file: RegisterFileType, index: usize, value: u64) {
        ExecutionEngine::set_register(self, file, index, value);
    }

    fn arch_memory(&self) -> &Memory {
        ExecutionEngine::memory(self)
    }

    fn arch_memory_mut(&mut self) -> &mut Memory {
        ExecutionEngine::memory_mut(self)
    }
}

/// View of the processor handed to a system call handler.
///
/// Register and memory writes made through the context belong to the cycle being clocked
/// and are undone with it.
pub struct SyscallContext<'a> {
    state: &'a mut dyn ArchState,
    cycle: u64,
}

impl<'a> SyscallContext<'a> {
    pub(crate) fn new(state: &'a mut dyn ArchState, cycle: u64) -> Self {
        Self { state, cycle }
    }

    /// Cycle during which the system call was raised (1-based).
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Reads a register.
    pub fn register(&self, file: RegisterFileType, index: usize) -> u64 {
        self.state.read_register(file, index)
    }

    /// Writes a register.
    pub fn set_register(&mut self, file: RegisterFileType, index: usize, value: u64) {
        self.state.write_register(file, index, value);
    }

    /// The address space.
    pub fn memory(&self) -> &Memory {
        self.state.arch_memory()
    }

    /// Mutable access to the address space.
    pub fn memory_mut(&mut self) -> &mut Memory {
        self.state.arch_memory_mut()
    }
}

impl fmt::Debug for SyscallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyscallContext")
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

/// Callbacks into the embedding environment.
pub struct Hooks {
    pub(crate) is_executable_address: ExecutablePredicate,
    pub(crate) syscall: SyscallHandler,
}

impl Hooks {
    /// Bundles the executable-region predicate and the system call handler.
    pub fn new<P, H>(is_executable_address: P, syscall: H) -> Self
    where
        P: Fn(u64) -> bool + 'static,
        H: FnMut(&mut SyscallContext<'_>) -> Result<SyscallOutcome, EngineFault> + 'static,
    {
        Self {
            is_executable_address: Box::new(is_executable_address),
            syscall: Box::new(syscall),
        }
    }

    /// Hooks for a program occupying `[start, end)` whose system calls all request exit.
    pub fn with_text_range(start: u64, end: u64) -> Self {
        Self::new(
            move |addr| (start..end).contains(&addr),
            |_: &mut SyscallContext<'_>| Ok(SyscallOutcome::Exit),
        )
    }

    /// Queries the executable-region predicate.
    pub fn is_executable_address(&self, addr: u64) -> bool {
        (self.is_executable_address)(addr)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
