//! # History Export Tests
//!
//! The history log survives a JSON round trip through a file and can be installed into
//! a controller that has reached the same state.

use crate::common::harness::{Observed, clock_n, config_with_depth, continuing_hooks};
use crate::common::mocks::pipeline::{ToySnapshot, ToyOp, ToyPipeline};
use pipeview_core::core::history::HistoryLog;
use pipeview_core::{ProcessorController, SimError};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::NamedTempFile;

fn program() -> Vec<ToyOp> {
    vec![
        ToyOp::AddImm { rd: 7, imm: 3 },
        ToyOp::Ecall,
        ToyOp::Store { rs: 7, addr: 0x1100 },
        ToyOp::Wait { cycles: 1 },
        ToyOp::Nop,
        ToyOp::Nop,
        ToyOp::Nop,
        ToyOp::Nop,
    ]
}

#[test]
fn test_export_to_file_and_replay() {
    let ops = program();
    let file = NamedTempFile::new().unwrap();

    let mut engine = ToyPipeline::new(3, &ops);
    let mut controller = ProcessorController::new(&mut engine, config_with_depth(16), continuing_hooks(&ops));
    clock_n(&mut controller, 6);
    let json = controller.history().unwrap().to_json().unwrap();
    fs::write(file.path(), &json).unwrap();

    let mut replica_engine = ToyPipeline::new(3, &ops);
    let mut replica = ProcessorController::new(&mut replica_engine, config_with_depth(4), continuing_hooks(&ops));
    let initial = Observed::capture(&replica);
    clock_n(&mut replica, 6);
    assert_eq!(replica.reversible_cycles(), 4);

    let text = fs::read_to_string(file.path()).unwrap();
    let imported = HistoryLog::<ToySnapshot>::from_json(&text).unwrap();
    assert_eq!(imported.len(), 6);
    replica.replace_history(imported).unwrap();
    assert_eq!(replica.max_reverse_cycles(), Some(16));
    assert_eq!(replica.config().history.max_reverse_cycles, 16);

    for _ in 0..6 {
        replica.reverse().unwrap();
    }
    assert_eq!(Observed::capture(&replica), initial);
    assert_eq!(replica.reverse(), Err(SimError::ReversalExhausted));
}

#[test]
fn test_exported_records_are_oldest_first() {
    let ops = program();
    let mut engine = ToyPipeline::new(3, &ops);
    let mut controller = ProcessorController::new(&mut engine, config_with_depth(16), continuing_hooks(&ops));
    clock_n(&mut controller, 3);

    let json = controller.history().unwrap().to_json().unwrap();
    let imported = HistoryLog::<ToySnapshot>::from_json(&json).unwrap();
    let cycles: Vec<u64> = imported.iter().map(|r| r.stats.cycles).collect();
    assert_eq!(cycles, vec![0, 1, 2]);
}
