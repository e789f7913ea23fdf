//! Breakpoint registration and hit detection.
//!
//! A breakpoint fires when its address *enters* a stage, not for every cycle the address
//! stays resident there. Hits are computed by comparing the stage track before and after
//! a clock.

use crate::core::pipeline::StageTrack;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One breakpoint firing: `pc` entered `stage` during the latest clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BreakpointHit {
    /// Breakpoint address.
    pub pc: u64,
    /// Stage the address entered.
    pub stage: usize,
}

/// Registered breakpoint addresses and the stages allowed to report them.
#[derive(Clone, Debug, Default)]
pub struct BreakpointSet {
    addrs: BTreeSet<u64>,
    trigger_stages: Vec<usize>,
}

impl BreakpointSet {
    /// Creates an empty set reporting from `trigger_stages` (every stage when empty).
    pub fn new(trigger_stages: Vec<usize>) -> Self {
        Self {
            addrs: BTreeSet::new(),
            trigger_stages,
        }
    }

    /// Registers `pc`. Returns false if it was already registered.
    pub fn add(&mut self, pc: u64) -> bool {
        self.addrs.insert(pc)
    }

    /// Unregisters `pc`. Returns false if it was not registered.
    pub fn remove(&mut self, pc: u64) -> bool {
        self.addrs.remove(&pc)
    }

    /// True if `pc` is registered.
    pub fn contains(&self, pc: u64) -> bool {
        self.addrs.contains(&pc)
    }

    /// Unregisters every address.
    pub fn clear(&mut self) {
        self.addrs.clear();
    }

    /// Registered addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.addrs.iter().copied()
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// True if no address is registered.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Stages allowed to report hits; empty means every stage.
    pub fn trigger_stages(&self) -> &[usize] {
        &self.trigger_stages
    }

    /// Hits for the transition from `previous` to `current`, ordered by address then stage.
    pub fn hits(&self, previous: &StageTrack, current: &StageTrack) -> Vec<BreakpointHit> {
        self.addrs
            .iter()
            .flat_map(|&pc| {
                current
                    .entered_stages(previous, pc)
                    .into_iter()
                    .map(move |stage| BreakpointHit { pc, stage })
            })
            .filter(|hit| self.trigger_stages.is_empty() || self.trigger_stages.contains(&hit.stage))
            .collect()
    }
}
