//! Reversible execution history.
//!
//! The history log is a bounded FIFO of `CycleRecord`s, one per forward clock. It
//! provides:
//! 1. **Recording:** Appends the state needed to undo the latest clock.
//! 2. **Eviction:** Drops the oldest record once the configured depth is reached.
//! 3. **Reversal:** Pops the newest record for the controller to apply.
//! 4. **Export:** JSON round-trip of the whole log for debugging.
//!
//! Reversal is lossy past the configured horizon: evicted records are gone.

use crate::common::{RegisterWrite, SimError, SimResult};
use crate::core::breakpoint::BreakpointHit;
use crate::core::finalize::FinalizationTracker;
use crate::core::memory::MemoryWrite;
use crate::core::pipeline::StageTrack;
use crate::stats::SimStats;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Everything needed to undo one forward clock.
///
/// Registers and memory are stored as diffs (previous values of what the cycle changed).
/// The stage track, finalization state and counters are stored whole. `S` is the engine's
/// microarchitectural snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord<S> {
    /// Engine state before the clock.
    pub engine: S,
    /// Stage track before the clock.
    pub track: StageTrack,
    /// Registers modified by the clock, with their previous values.
    pub registers: Vec<RegisterWrite>,
    /// Bytes written by the clock, with their previous values, in write order.
    pub memory: Vec<MemoryWrite>,
    /// Finalization state before the clock.
    pub finalization: FinalizationTracker,
    /// Counters before the clock.
    pub stats: SimStats,
    /// Breakpoint hits reported by the previous clock.
    pub breakpoint_hits: Vec<BreakpointHit>,
}

/// Bounded circular log of cycle records.
///
/// Storage grows with the number of records held, not with `max_depth`.
#[derive(Clone, Debug)]
pub struct HistoryLog<S> {
    /// Records, oldest first.
    entries: VecDeque<CycleRecord<S>>,
    /// Maximum number of records kept.
    max_depth: usize,
}

impl<S> HistoryLog<S> {
    /// Creates an empty log holding at most `max_depth` records.
    pub const fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_depth,
        }
    }

    /// Maximum number of records.
    #[inline]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of stored records.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing can be reversed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a record, evicting the oldest one if the log is full.
    ///
    /// With a depth of zero the record is dropped.
    pub fn record(&mut self, record: CycleRecord<S>) {
        if self.max_depth == 0 {
            return;
        }
        if self.entries.len() >= self.max_depth {
            let _ = self.entries.pop_front();
            debug!(depth = self.max_depth, "history full, evicted oldest cycle");
        }
        self.entries.push_back(record);
    }

    /// Removes and returns the newest record.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ReversalExhausted`] if the log is empty.
    pub fn pop(&mut self) -> SimResult<CycleRecord<S>> {
        self.entries.pop_back().ok_or(SimError::ReversalExhausted)
    }

    /// Returns the newest record without removing it.
    pub fn peek(&self) -> Option<&CycleRecord<S>> {
        self.entries.back()
    }

    /// Changes the maximum depth. Shrinking drops the oldest records immediately.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        if self.entries.len() > max_depth {
            let dropped = self.entries.len() - max_depth;
            let _ = self.entries.drain(..dropped);
            debug!(dropped, max_depth, "history truncated");
        }
        self.max_depth = max_depth;
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates records from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CycleRecord<S>> + '_ {
        self.entries.iter()
    }
}

/// Serialized form of a history log.
#[derive(Serialize, Deserialize)]
struct HistoryExport<S> {
    max_depth: usize,
    records: Vec<CycleRecord<S>>,
}

impl<S: Serialize + Clone> HistoryLog<S> {
    /// Serializes the log, oldest record first.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the engine snapshot fails to serialize.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let export = HistoryExport {
            max_depth: self.max_depth(),
            records: self.iter().cloned().collect(),
        };
        serde_json::to_string(&export)
    }
}

impl<S: DeserializeOwned> HistoryLog<S> {
    /// Rebuilds a log serialized by [`HistoryLog::to_json`].
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let export: HistoryExport<S> = serde_json::from_str(json)?;
        let mut log = Self::new(export.max_depth);
        for record in export.records {
            log.record(record);
        }
        Ok(log)
    }
}
