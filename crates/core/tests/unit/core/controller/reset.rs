//! # Reset Tests
//!
//! Reset is valid from every controller state and idempotent.

use crate::common::harness::{Observed, clock_n, config_with_depth, exiting_hooks, nops};
use crate::common::mocks::pipeline::{ToyOp, ToyPipeline};
use pipeview_core::common::RegisterFileType;
use pipeview_core::core::ControllerState;
use pipeview_core::core::pipeline::StageState;
use pipeview_core::{Config, ProcessorController};
use pretty_assertions::assert_eq;

fn assert_initial(controller: &ProcessorController<'_, ToyPipeline>) {
    assert_eq!(controller.state(), ControllerState::Idle);
    assert_eq!(controller.cycle_count(), 0);
    assert_eq!(controller.instructions_retired(), 0);
    assert_eq!(controller.stats().reversals, 0);
    assert_eq!(controller.reversible_cycles(), 0);
    assert!(controller.finalize_reason().is_empty());
    assert!(!controller.is_finished());
    assert!(controller.breakpoint_hits().is_empty());
    assert!(controller.stage_track().stages().iter().all(|s| *s == StageState::UNUSED));
    assert!(controller.engine().fetch_enabled());
}

#[test]
fn test_reset_while_running() {
    let ops = [ToyOp::AddImm { rd: 3, imm: 1 }, ToyOp::Nop, ToyOp::Nop, ToyOp::Nop];
    let mut engine = ToyPipeline::new(3, &ops);
    let mut controller = ProcessorController::new(&mut engine, Config::default(), exiting_hooks(&ops));

    clock_n(&mut controller, 3);
    controller.reset();
    assert_initial(&controller);
    assert_eq!(controller.register_value(RegisterFileType::Gpr, 3), 0);
    assert_eq!(controller.next_fetch_address(), 0);
}

#[test]
fn test_reset_while_finalizing() {
    let ops = nops(4);
    let mut engine = ToyPipeline::new(3, &ops);
    let mut controller = ProcessorController::new(&mut engine, Config::default(), exiting_hooks(&ops));

    clock_n(&mut controller, 5);
    assert_eq!(controller.state(), ControllerState::Finalizing);
    controller.reset();
    assert_initial(&controller);
}

#[test]
fn test_reset_from_finished_allows_clocking() {
    let ops = nops(4);
    let mut engine = ToyPipeline::new(3, &ops);
    let mut controller = ProcessorController::new(&mut engine, Config::default(), exiting_hooks(&ops));

    clock_n(&mut controller, 7);
    assert!(controller.is_finished());
    controller.reset();
    assert_initial(&controller);
    controller.clock().unwrap();
    assert_eq!(controller.cycle_count(), 1);
}

#[test]
fn test_reset_clears_reversal_counter() {
    let ops = nops(8);
    let mut engine = ToyPipeline::new(3, &ops);
    let mut controller = ProcessorController::new(&mut engine, config_with_depth(4), exiting_hooks(&ops));

    clock_n(&mut controller, 3);
    controller.reverse().unwrap();
    assert_eq!(controller.stats().reversals, 1);
    controller.reset();
    assert_initial(&controller);
}

#[test]
fn test_reset_is_idempotent() {
    let ops = [
        ToyOp::AddImm { rd: 1, imm: 4 },
        ToyOp::Wait { cycles: 1 },
        ToyOp::Nop,
        ToyOp::Nop,
    ];
    let mut engine = ToyPipeline::five_stage(&ops);
    let mut controller = ProcessorController::new(&mut engine, Config::default(), exiting_hooks(&ops));

    clock_n(&mut controller, 4);
    controller.reset();
    let once = Observed::capture(&controller);
    controller.reset();
    assert_eq!(Observed::capture(&controller), once);
    assert_initial(&controller);
}

#[test]
fn test_reset_keeps_breakpoints() {
    let ops = nops(4);
    let mut engine = ToyPipeline::new(3, &ops);
    let mut controller = ProcessorController::new(&mut engine, Config::default(), exiting_hooks(&ops));

    assert!(controller.add_breakpoint(0x08));
    controller.reset();
    assert!(controller.breakpoints().contains(0x08));
}
