//! Execution engine trait and capability flags.
//!
//! This module defines the boundary between the controller and a concrete processor
//! model:
//! 1. **Capabilities:** Optional features a processor declares.
//! 2. **Cycle Events:** What happened during one engine cycle that the controller must act on.
//! 3. **Engine:** The narrow interface the controller drives.
//!
//! The engine computes next-state values; the controller only observes, records and
//! restores them.

use crate::common::{EngineFault, RegisterFileType};
use crate::core::memory::Memory;
use crate::core::pipeline::stage::StageSignals;
use std::fmt;

/// Optional processor features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Capability {
    /// Clock cycles can be undone.
    Reversible = 0b001,
    /// The processor exposes an instruction cache interface.
    ICacheInterface = 0b010,
    /// The processor exposes a data cache interface.
    DCacheInterface = 0b100,
}

/// Set of capabilities declared by a processor.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No optional features.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns this set with `capability` added.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability as u8)
    }

    /// Returns this set with `capability` removed.
    #[must_use]
    pub const fn without(self, capability: Capability) -> Self {
        Self(self.0 & !(capability as u8))
    }

    /// True if `capability` is declared.
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability as u8 != 0
    }

    /// Raw bitmask.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for cap in [
            Capability::Reversible,
            Capability::ICacheInterface,
            Capability::DCacheInterface,
        ] {
            if self.contains(cap) {
                let _ = set.entry(&cap);
            }
        }
        set.finish()
    }
}

/// Events raised by the engine during one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleEvents {
    /// The engine reached a system call that the environment must service.
    pub syscall_requested: bool,
}

/// The execution engine driven by the controller.
///
/// Implementations own their architectural and microarchitectural state. The controller
/// reads per-stage signals after each cycle and, for reversible processors, captures
/// everything needed to undo that cycle: register values through `register_value`, memory
/// writes through the [`Memory`] journal, and everything else through `Snapshot`.
pub trait ExecutionEngine {
    /// Microarchitectural state not visible through registers or memory: the program
    /// counter, inter-stage latches, fetch gating.
    type Snapshot: Clone;

    /// Optional features this processor implements.
    fn capabilities(&self) -> Capabilities;

    /// Number of pipeline stages. Must not change over the engine's lifetime.
    fn stage_count(&self) -> usize;

    /// Display name of a stage.
    fn stage_name(&self, stage: usize) -> &str;

    /// Program counter of the instruction currently in `stage`.
    fn pc_for_stage(&self, stage: usize) -> u64;

    /// Raw status signals of `stage` for the current cycle.
    fn stage_signals(&self, stage: usize) -> StageSignals;

    /// Address that will be fetched in the next cycle.
    fn next_fetch_address(&self) -> u64;

    /// Register files exposed by this processor.
    fn register_files(&self) -> Vec<RegisterFileType>;

    /// Number of registers in `file`.
    fn register_count(&self, file: RegisterFileType) -> usize;

    /// Current value of register `index` in `file`.
    fn register_value(&self, file: RegisterFileType, index: usize) -> u64;

    /// Overwrites register `index` in `file`.
    fn set_register(&mut self, file: RegisterFileType, index: usize, value: u64);

    /// The processor's address space.
    fn memory(&self) -> &Memory;

    /// Mutable access to the processor's address space.
    fn memory_mut(&mut self) -> &mut Memory;

    /// Performs the state transition of one clock cycle.
    ///
    /// # Errors
    ///
    /// Returns the fault that prevented the cycle from completing. The controller restores
    /// the pre-cycle state afterwards, so implementations need not undo partial work.
    fn advance_one_cycle(&mut self) -> Result<CycleEvents, EngineFault>;

    /// Captures the microarchitectural state.
    fn snapshot(&self) -> Self::Snapshot;

    /// Restores state captured by [`ExecutionEngine::snapshot`].
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Returns the processor to its power-on state.
    fn reset(&mut self);

    /// Sets the program counter.
    fn set_program_counter(&mut self, address: u64);

    /// Enables or disables instruction fetch. Disabled while the pipeline drains.
    fn set_fetch_enabled(&mut self, enabled: bool);
}
