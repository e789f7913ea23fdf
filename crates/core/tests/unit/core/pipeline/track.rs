//! # Stage Track Tests
//!
//! Tests for stage track updates, bounds checking, breakpoint matching and the drain
//! condition.

use pipeview_core::SimError;
use pipeview_core::core::pipeline::{StageState, StageStatus, StageTrack};
use pretty_assertions::assert_eq;

fn live(pc: u64) -> StageState {
    StageState {
        pc,
        valid: true,
        status: StageStatus::None,
    }
}

fn stalled(pc: u64) -> StageState {
    StageState {
        pc,
        valid: true,
        status: StageStatus::Stalled,
    }
}

fn flushed(pc: u64) -> StageState {
    StageState {
        pc,
        valid: false,
        status: StageStatus::Flushed,
    }
}

fn track_of(states: &[StageState]) -> StageTrack {
    StageTrack::from_states(states.to_vec())
}

#[test]
fn test_new_track_is_unused() {
    let track = StageTrack::new(5);
    assert_eq!(track.len(), 5);
    assert!(!track.is_empty());
    assert!(track.stages().iter().all(|s| *s == StageState::UNUSED));
    assert!(track.is_drained());
}

#[test]
fn test_zero_stage_track() {
    let track = StageTrack::new(0);
    assert!(track.is_empty());
    assert!(track.is_drained());
    assert!(track.breakpoint_triggering_stages(0).is_empty());
}

#[test]
fn test_update_and_state_of() {
    let mut track = StageTrack::new(3);
    track.update(1, live(0x1004)).unwrap();
    assert_eq!(track.state_of(1).unwrap(), live(0x1004));
    assert_eq!(track.state_of(0).unwrap(), StageState::UNUSED);
}

#[test]
fn test_update_out_of_range() {
    let mut track = StageTrack::new(3);
    assert_eq!(
        track.update(3, live(0)),
        Err(SimError::OutOfRange { index: 3, count: 3 })
    );
}

#[test]
fn test_state_of_out_of_range() {
    let track = StageTrack::new(5);
    assert_eq!(
        track.state_of(7),
        Err(SimError::OutOfRange { index: 7, count: 5 })
    );
}

#[test]
fn test_breakpoint_triggering_stages() {
    let track = track_of(&[live(0x10), live(0x0C), live(0x08), live(0x04), live(0x00)]);
    assert_eq!(track.breakpoint_triggering_stages(0x08), vec![2]);
    assert!(track.breakpoint_triggering_stages(0x20).is_empty());
}

#[test]
fn test_flushed_stage_does_not_trigger() {
    let track = track_of(&[flushed(0x08), live(0x08)]);
    assert_eq!(track.breakpoint_triggering_stages(0x08), vec![1]);
}

#[test]
fn test_from_states_matches_updates() {
    let states = [live(0x08), stalled(0x04), flushed(0x00)];
    let mut updated = StageTrack::new(states.len());
    for (i, state) in states.iter().enumerate() {
        updated.update(i, *state).unwrap();
    }
    let built = StageTrack::from_states(states.to_vec());
    assert_eq!(built, updated);
    assert_eq!(built.state_of(1).unwrap(), stalled(0x04));
}

#[test]
fn test_same_pc_in_several_stages() {
    // A tight loop can hold the same address in more than one stage.
    let track = track_of(&[live(0x08), live(0x04), live(0x08)]);
    assert_eq!(track.breakpoint_triggering_stages(0x08), vec![0, 2]);
}

#[test]
fn test_entered_stages_ignores_resident_instruction() {
    let before = track_of(&[live(0x0C), stalled(0x08), live(0x04)]);
    let after = track_of(&[live(0x0C), stalled(0x08), StageState::UNUSED]);
    assert!(after.entered_stages(&before, 0x08).is_empty());
}

#[test]
fn test_entered_stages_reports_new_arrival() {
    let before = track_of(&[live(0x08), live(0x04), live(0x00)]);
    let after = track_of(&[live(0x0C), live(0x08), live(0x04)]);
    assert_eq!(after.entered_stages(&before, 0x08), vec![1]);
    assert_eq!(after.entered_stages(&before, 0x0C), vec![0]);
}

#[test]
fn test_entered_stages_reports_back_to_back_instances() {
    let before = track_of(&[live(0x00)]);
    let after = track_of(&[live(0x00)]);
    assert_eq!(after.entered_stages(&before, 0x00), vec![0]);
}

#[test]
fn test_entered_stages_reports_arrival_after_stall_clears() {
    let before = track_of(&[stalled(0x08), stalled(0x04)]);
    let after = track_of(&[live(0x08), live(0x04)]);
    assert_eq!(after.entered_stages(&before, 0x08), vec![0]);
}

#[test]
fn test_drained_ignores_flushed_stages() {
    let track = track_of(&[flushed(0x08), StageState::UNUSED]);
    assert!(track.is_drained());
    let busy = track_of(&[StageState::UNUSED, stalled(0x04)]);
    assert!(!busy.is_drained());
}

#[test]
fn test_count_status() {
    let track = track_of(&[stalled(0x10), stalled(0x0C), flushed(0x08), live(0x04)]);
    assert_eq!(track.count_status(StageStatus::Stalled), 2);
    assert_eq!(track.count_status(StageStatus::Flushed), 1);
    assert_eq!(track.count_status(StageStatus::Unused), 0);
}

#[test]
fn test_reset() {
    let mut track = track_of(&[live(0x04), live(0x00)]);
    track.reset();
    assert_eq!(track, StageTrack::new(2));
}
