//! Processor controller.
//!
//! The controller sits between the embedding environment and an `ExecutionEngine`. It
//! performs:
//! 1. **Clocking:** Advances the engine one cycle, refreshes the stage track, updates
//!    counters, drives finalization and breakpoint detection, and records the cycle.
//! 2. **Reversing:** Pops the newest recorded cycle and restores registers, memory, engine
//!    state, stage track, finalization state and counters from it.
//! 3. **Resetting:** Returns engine and controller to their initial state.
//! 4. **Notification:** Informs observers synchronously after each of the above.
//!
//! A clock is atomic: if the engine or the system call handler fails, every piece of
//! state is rolled back to its pre-clock value and nothing is recorded.

use crate::common::{EngineFault, RegisterFileType, RegisterWrite, SimError, SimResult};
use crate::config::Config;
use crate::core::breakpoint::{BreakpointHit, BreakpointSet};
use crate::core::finalize::{FinalizationTracker, FinalizePhase, FinalizeReason};
use crate::core::history::{CycleRecord, HistoryLog};
use crate::core::hooks::{Hooks, SyscallContext, SyscallOutcome};
use crate::core::memory::Memory;
use crate::core::notify::{Notification, ObserverId, Observers};
use crate::core::pipeline::{
    Capabilities, Capability, ExecutionEngine, StageState, StageStatus, StageTrack,
};
use crate::stats::SimStats;
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Externally visible controller state.
///
/// `Clocking` and `Reversing` are held only while the corresponding operation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    /// Ready to clock.
    Idle,
    /// A forward clock is in progress.
    Clocking,
    /// A reversal is in progress.
    Reversing,
    /// Fetch is stopped and the pipeline is draining.
    Finalizing,
    /// The pipeline has drained. Only reverse and reset are accepted.
    Finished,
}

/// Why a call to [`ProcessorController::run`] stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The pipeline drained after finalization.
    Finished,
    /// One or more breakpoints fired during the last clock.
    Breakpoint(Vec<BreakpointHit>),
    /// The cycle budget ran out.
    CycleLimit,
}

/// Register values captured before a clock, per register file.
type RegisterSnapshot = Vec<(RegisterFileType, Vec<u64>)>;

/// Drives an execution engine one clock at a time.
///
/// The controller owns the stage track, the history log, the finalization tracker and the
/// counters. The engine is borrowed for the controller's lifetime.
pub struct ProcessorController<'e, E: ExecutionEngine> {
    engine: &'e mut E,
    config: Config,
    capabilities: Capabilities,
    state: ControllerState,
    track: StageTrack,
    history: Option<HistoryLog<E::Snapshot>>,
    finalization: FinalizationTracker,
    stats: SimStats,
    breakpoints: BreakpointSet,
    breakpoint_hits: Vec<BreakpointHit>,
    hooks: Hooks,
    observers: Observers,
}

impl<'e, E: ExecutionEngine> ProcessorController<'e, E> {
    /// Creates a controller for `engine` and resets both to their initial state.
    ///
    /// Capabilities are read from the engine once, here. The history log exists only if
    /// the engine declares [`Capability::Reversible`].
    pub fn new(engine: &'e mut E, config: Config, hooks: Hooks) -> Self {
        let capabilities = engine.capabilities();
        let track = StageTrack::new(engine.stage_count());
        let history = capabilities
            .contains(Capability::Reversible)
            .then(|| HistoryLog::new(config.history.max_reverse_cycles));
        let breakpoints = BreakpointSet::new(config.breakpoints.trigger_stages.clone());

        let mut controller = Self {
            engine,
            config,
            capabilities,
            state: ControllerState::Idle,
            track,
            history,
            finalization: FinalizationTracker::new(),
            stats: SimStats::default(),
            breakpoints,
            breakpoint_hits: Vec::new(),
            hooks,
            observers: Observers::default(),
        };
        controller.reset_state();
        debug!(
            stages = controller.track.len(),
            capabilities = ?controller.capabilities,
            "controller created"
        );
        controller
    }

    // ══════════════════════════════════════════════════════════
    // Clock / reverse / reset
    // ══════════════════════════════════════════════════════════

    /// Advances the processor by one clock cycle.
    ///
    /// # Errors
    ///
    /// * [`SimError::Finished`] if the pipeline has already drained.
    /// * [`SimError::EngineFault`] if the engine or the system call handler failed. All
    ///   state is rolled back to its value before the call.
    pub fn clock(&mut self) -> SimResult<()> {
        if self.state == ControllerState::Finished {
            return Err(SimError::Finished);
        }
        let resume = self.state;
        self.state = ControllerState::Clocking;
        let cycle = self.stats.cycles + 1;

        let engine_before = self.engine.snapshot();
        let registers_before = capture_registers(&*self.engine);
        self.engine.memory_mut().begin_journal();

        let outcome = self.advance_engine(cycle);
        let memory = self.engine.memory_mut().take_journal();
        let exit_requested = match outcome {
            Ok(exit) => exit,
            Err(fault) => {
                warn!(cycle, %fault, "engine fault, rolling back cycle");
                self.engine.memory_mut().rollback(&memory);
                let touched = register_diff(&*self.engine, &registers_before);
                restore_registers(&mut *self.engine, &touched);
                self.engine.restore(engine_before);
                self.state = resume;
                return Err(fault.into());
            }
        };
        let registers = register_diff(&*self.engine, &registers_before);

        let refreshed = self.read_track();
        let track_before = std::mem::replace(&mut self.track, refreshed);
        let finalization_before = self.finalization;
        let stats_before = self.stats;
        let hits_before = std::mem::take(&mut self.breakpoint_hits);

        self.count_cycle();
        let finished_now = self.advance_finalization(exit_requested);
        self.breakpoint_hits = self.breakpoints.hits(&track_before, &self.track);

        if let Some(history) = self.history.as_mut() {
            history.record(CycleRecord {
                engine: engine_before,
                track: track_before,
                registers,
                memory,
                finalization: finalization_before,
                stats: stats_before,
                breakpoint_hits: hits_before,
            });
        }
        self.state = self.settled_state();

        trace!(
            cycle,
            retired = self.stats.instructions_retired,
            phase = ?self.finalization.phase(),
            "clocked"
        );
        self.notify(Notification::Clocked { cycle });
        for hit in self.breakpoint_hits.clone() {
            self.notify(Notification::BreakpointHit(hit));
        }
        if finished_now {
            self.notify(Notification::Finished { cycle });
        }
        Ok(())
    }

    /// Undoes the most recent clock cycle.
    ///
    /// # Errors
    ///
    /// * [`SimError::UnsupportedOperation`] if the processor is not reversible.
    /// * [`SimError::ReversalExhausted`] if no recorded cycle remains.
    ///
    /// State is untouched in both cases.
    pub fn reverse(&mut self) -> SimResult<()> {
        let history = self
            .history
            .as_mut()
            .ok_or(SimError::UnsupportedOperation("reverse"))?;
        let record = history.pop()?;
        self.state = ControllerState::Reversing;

        self.engine.memory_mut().rollback(&record.memory);
        restore_registers(&mut *self.engine, &record.registers);
        self.engine.restore(record.engine);
        self.track = record.track;
        self.finalization = record.finalization;
        self.stats.restore_from(&record.stats);
        self.stats.reversals += 1;
        self.breakpoint_hits = record.breakpoint_hits;
        self.engine
            .set_fetch_enabled(!self.finalization.is_finalizing());
        self.state = self.settled_state();

        let cycle = self.stats.cycles;
        trace!(cycle, "reversed");
        self.notify(Notification::Reversed { cycle });
        Ok(())
    }

    /// Resets engine and controller. Valid from any state; idempotent.
    pub fn reset(&mut self) {
        self.reset_state();
        debug!(initial_pc = self.config.general.initial_pc, "reset");
        self.notify(Notification::Reset);
    }

    /// Clocks until the pipeline finishes, a breakpoint fires, or `max_cycles` clocks ran.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by [`ProcessorController::clock`].
    pub fn run(&mut self, max_cycles: u64) -> SimResult<RunOutcome> {
        for _ in 0..max_cycles {
            if self.is_finished() {
                return Ok(RunOutcome::Finished);
            }
            self.clock()?;
            if !self.breakpoint_hits.is_empty() {
                return Ok(RunOutcome::Breakpoint(self.breakpoint_hits.clone()));
            }
        }
        if self.is_finished() {
            Ok(RunOutcome::Finished)
        } else {
            Ok(RunOutcome::CycleLimit)
        }
    }

    /// Starts (non-empty `reason`) or cancels (empty `reason`) finalization on request of
    /// the embedding environment.
    ///
    /// The request is not a clock and is not recorded; reversing a cycle restores the
    /// finalization state recorded with that cycle.
    pub fn finalize(&mut self, reason: FinalizeReason) {
        if reason.is_empty() {
            if self.finalization.cancel_finalize() {
                info!("finalization cancelled by request");
            }
        } else if self.finalization.begin_finalize(reason) {
            info!(reason = reason.bits(), "finalization requested");
        }
        let finished_now = self.finalization.tick(&self.track);
        self.engine
            .set_fetch_enabled(!self.finalization.is_finalizing());
        self.state = self.settled_state();
        if finished_now {
            self.notify(Notification::Finished {
                cycle: self.stats.cycles,
            });
        }
    }

    /// Changes how many cycles can be reversed. Shrinking drops the oldest records.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedOperation`] if the processor is not reversible.
    pub fn set_max_reverse_cycles(&mut self, cycles: usize) -> SimResult<()> {
        let history = self
            .history
            .as_mut()
            .ok_or(SimError::UnsupportedOperation("set_max_reverse_cycles"))?;
        history.set_max_depth(cycles);
        self.config.history.max_reverse_cycles = cycles;
        debug!(cycles, "max reverse cycles changed");
        Ok(())
    }

    /// Replaces the history log, e.g. with one re-imported from JSON.
    ///
    /// The log must have been recorded from the controller's current state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedOperation`] if the processor is not reversible.
    pub fn replace_history(&mut self, log: HistoryLog<E::Snapshot>) -> SimResult<()> {
        let history = self
            .history
            .as_mut()
            .ok_or(SimError::UnsupportedOperation("replace_history"))?;
        self.config.history.max_reverse_cycles = log.max_depth();
        *history = log;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Clock internals
    // ══════════════════════════════════════════════════════════

    /// Runs the engine for one cycle and services a requested system call.
    ///
    /// Returns true if the system call handler requested exit.
    fn advance_engine(&mut self, cycle: u64) -> Result<bool, EngineFault> {
        let events = self.engine.advance_one_cycle()?;
        if !events.syscall_requested {
            return Ok(false);
        }
        let mut ctx = SyscallContext::new(&mut *self.engine, cycle);
        let outcome = (self.hooks.syscall)(&mut ctx)?;
        trace!(cycle, ?outcome, "system call serviced");
        Ok(outcome == SyscallOutcome::Exit)
    }

    fn read_track(&self) -> StageTrack {
        StageTrack::from_states(
            (0..self.track.len())
                .map(|stage| {
                    StageState::from_signals(
                        self.engine.pc_for_stage(stage),
                        self.engine.stage_signals(stage),
                    )
                })
                .collect(),
        )
    }

    fn count_cycle(&mut self) {
        self.stats.cycles += 1;
        let retired = self
            .track
            .stages()
            .last()
            .is_some_and(|last| last.valid && last.status == StageStatus::None);
        if retired {
            self.stats.instructions_retired += 1;
        }
        self.stats.stalled_stage_cycles += self.track.count_status(StageStatus::Stalled) as u64;
        self.stats.flushed_stage_cycles += self.track.count_status(StageStatus::Flushed) as u64;
    }

    /// Applies the per-clock finalization policy. Returns true on the transition to
    /// `Finished`.
    fn advance_finalization(&mut self, exit_requested: bool) -> bool {
        let next_fetch = self.engine.next_fetch_address();
        if !self.hooks.is_executable_address(next_fetch) {
            if self
                .finalization
                .begin_finalize(FinalizeReason::EXITED_EXECUTABLE_REGION)
            {
                info!(
                    cycle = self.stats.cycles,
                    next_fetch,
                    "fetch left executable region, draining"
                );
            }
        } else if self.finalization.phase() == FinalizePhase::Draining
            && !self
                .finalization
                .reason()
                .contains(FinalizeReason::EXIT_SYSCALL)
            && self.finalization.cancel_finalize()
        {
            info!(
                cycle = self.stats.cycles,
                next_fetch,
                "fetch returned to executable region, finalization cancelled"
            );
        }
        if exit_requested && self.finalization.begin_finalize(FinalizeReason::EXIT_SYSCALL) {
            info!(cycle = self.stats.cycles, "exit system call, draining");
        }

        let finished_now = self.finalization.tick(&self.track);
        if finished_now {
            info!(
                cycle = self.stats.cycles,
                retired = self.stats.instructions_retired,
                "pipeline drained, finished"
            );
        }
        self.engine
            .set_fetch_enabled(!self.finalization.is_finalizing());
        finished_now
    }

    fn settled_state(&self) -> ControllerState {
        match self.finalization.phase() {
            FinalizePhase::Running => ControllerState::Idle,
            FinalizePhase::Draining => ControllerState::Finalizing,
            FinalizePhase::Finished => ControllerState::Finished,
        }
    }

    fn reset_state(&mut self) {
        self.engine.reset();
        self.engine
            .set_program_counter(self.config.general.initial_pc);
        self.engine.set_fetch_enabled(true);
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
        self.track.reset();
        self.finalization.reset();
        self.stats = SimStats::default();
        self.breakpoint_hits.clear();
        self.state = ControllerState::Idle;
    }

    fn notify(&mut self, notification: Notification) {
        if self.config.general.emit_notifications {
            self.observers.notify(&notification);
        }
    }

    // ══════════════════════════════════════════════════════════
    // Observers and breakpoints
    // ══════════════════════════════════════════════════════════

    /// Subscribes an observer to controller notifications.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&Notification) + 'static,
    ) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Removes an observer. Returns false for an unknown id.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Enables or disables notifications.
    pub fn set_emit_notifications(&mut self, emit: bool) {
        self.config.general.emit_notifications = emit;
    }

    /// Registers a breakpoint address. Returns false if already registered.
    pub fn add_breakpoint(&mut self, pc: u64) -> bool {
        self.breakpoints.add(pc)
    }

    /// Unregisters a breakpoint address. Returns false if it was not registered.
    pub fn remove_breakpoint(&mut self, pc: u64) -> bool {
        self.breakpoints.remove(pc)
    }

    /// Unregisters every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Registered breakpoints.
    pub fn breakpoints(&self) -> &BreakpointSet {
        &self.breakpoints
    }

    /// Breakpoint hits of the latest clock.
    pub fn breakpoint_hits(&self) -> &[BreakpointHit] {
        &self.breakpoint_hits
    }

    /// Stages currently holding `pc` as a valid instruction.
    pub fn breakpoint_triggering_stages(&self, pc: u64) -> Vec<usize> {
        self.track.breakpoint_triggering_stages(pc)
    }

    // ══════════════════════════════════════════════════════════
    // Observable state
    // ══════════════════════════════════════════════════════════

    /// Current controller state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Capabilities declared by the engine.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// True if clock cycles can be reversed.
    pub fn is_reversible(&self) -> bool {
        self.history.is_some()
    }

    /// Number of pipeline stages.
    pub fn stage_count(&self) -> usize {
        self.track.len()
    }

    /// Display name of a stage.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfRange`] for an invalid stage index.
    pub fn stage_name(&self, stage: usize) -> SimResult<&str> {
        if stage >= self.track.len() {
            return Err(SimError::OutOfRange {
                index: stage,
                count: self.track.len(),
            });
        }
        Ok(self.engine.stage_name(stage))
    }

    /// State of one stage for the current cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::OutOfRange`] for an invalid stage index.
    pub fn stage_state(&self, stage: usize) -> SimResult<StageState> {
        self.track.state_of(stage)
    }

    /// Stage track for the current cycle.
    pub fn stage_track(&self) -> &StageTrack {
        &self.track
    }

    /// Clock cycles since reset.
    pub fn cycle_count(&self) -> u64 {
        self.stats.cycles
    }

    /// Instructions retired since reset.
    pub fn instructions_retired(&self) -> u64 {
        self.stats.instructions_retired
    }

    /// All counters.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// True once the pipeline drained after finalization began.
    pub fn is_finished(&self) -> bool {
        self.finalization.is_finished()
    }

    /// Reasons finalization is in progress; empty while running.
    pub fn finalize_reason(&self) -> FinalizeReason {
        self.finalization.reason()
    }

    /// Finalization tracker.
    pub fn finalization(&self) -> &FinalizationTracker {
        &self.finalization
    }

    /// Maximum reversible depth, or `None` if the processor is not reversible.
    pub fn max_reverse_cycles(&self) -> Option<usize> {
        self.history.as_ref().map(HistoryLog::max_depth)
    }

    /// Number of cycles that can currently be reversed.
    pub fn reversible_cycles(&self) -> usize {
        self.history.as_ref().map_or(0, HistoryLog::len)
    }

    /// The history log, if the processor is reversible.
    pub fn history(&self) -> Option<&HistoryLog<E::Snapshot>> {
        self.history.as_ref()
    }

    /// Current value of a register.
    pub fn register_value(&self, file: RegisterFileType, index: usize) -> u64 {
        self.engine.register_value(file, index)
    }

    /// The processor's address space.
    pub fn memory(&self) -> &Memory {
        self.engine.memory()
    }

    /// Address fetched by the next clock.
    pub fn next_fetch_address(&self) -> u64 {
        self.engine.next_fetch_address()
    }

    /// The controlled engine.
    pub fn engine(&self) -> &E {
        &*self.engine
    }

    /// Mutable access to the engine. Changes made through it are not recorded in the
    /// history and are not undone by [`ProcessorController::reverse`].
    pub fn engine_mut(&mut self) -> &mut E {
        &mut *self.engine
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<E: ExecutionEngine> fmt::Debug for ProcessorController<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorController")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .field("track", &self.track)
            .field("finalization", &self.finalization)
            .field("stats", &self.stats)
            .field("reversible_cycles", &self.reversible_cycles())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

fn capture_registers<E: ExecutionEngine>(engine: &E) -> RegisterSnapshot {
    engine
        .register_files()
        .into_iter()
        .map(|file| {
            let values = (0..engine.register_count(file))
                .map(|i| engine.register_value(file, i))
                .collect();
            (file, values)
        })
        .collect()
}

/// Registers whose value differs from `before`, paired with their old value.
fn register_diff<E: ExecutionEngine>(engine: &E, before: &RegisterSnapshot) -> Vec<RegisterWrite> {
    before
        .iter()
        .flat_map(|(file, values)| {
            values
                .iter()
                .enumerate()
                .filter(|&(index, &old)| engine.register_value(*file, index) != old)
                .map(|(index, &old)| RegisterWrite {
                    file: *file,
                    index,
                    old,
                })
        })
        .collect()
}

fn restore_registers<E: ExecutionEngine>(engine: &mut E, writes: &[RegisterWrite]) {
    for write in writes {
        engine.set_register(write.file, write.index, write.old);
    }
}
