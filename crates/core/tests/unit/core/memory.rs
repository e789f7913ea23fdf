//! # Memory Tests
//!
//! Tests for the sparse address space and its write journal as the controller uses
//! them: one journal per cycle, rolled back as a unit.

use pipeview_core::core::memory::{Memory, MemoryWrite};
use pretty_assertions::assert_eq;

#[test]
fn test_half_and_double_words() {
    let mut mem = Memory::new();
    mem.write_u16(0x100, 0xBEEF);
    mem.write_u64(0x200, 0x0102_0304_0506_0708);
    assert_eq!(mem.read_u16(0x100), 0xBEEF);
    assert_eq!(mem.read_u8(0x200), 0x08);
    assert_eq!(mem.read_u64(0x200), 0x0102_0304_0506_0708);
}

#[test]
fn test_bytes() {
    let mut mem = Memory::new();
    mem.write_bytes(0x40, b"pipe");
    assert_eq!(mem.read_bytes(0x40, 5), b"pipe\0".to_vec());
}

#[test]
fn test_journal_records_old_values_in_order() {
    let mut mem = Memory::new();
    mem.write_u8(0x10, 0xAA);
    mem.begin_journal();
    assert!(mem.is_journaling());
    mem.write_u8(0x10, 0xBB);
    mem.write_u8(0x10, 0xCC);
    let journal = mem.take_journal();
    assert!(!mem.is_journaling());
    assert_eq!(
        journal,
        vec![
            MemoryWrite { addr: 0x10, old: 0xAA },
            MemoryWrite { addr: 0x10, old: 0xBB },
        ]
    );
}

#[test]
fn test_rollback_of_repeated_writes() {
    let mut mem = Memory::new();
    mem.write_u32(0x80, 0x1111_1111);
    let before = mem.clone();
    mem.begin_journal();
    mem.write_u32(0x80, 0x2222_2222);
    mem.write_u16(0x82, 0x3333);
    let journal = mem.take_journal();
    mem.rollback(&journal);
    assert_eq!(mem, before);
    assert_eq!(mem.read_u32(0x80), 0x1111_1111);
}

#[test]
fn test_rollback_of_consecutive_cycles() {
    let mut mem = Memory::new();
    let mut journals = Vec::new();
    let mut states = vec![mem.clone()];
    for cycle in 1..=3u64 {
        mem.begin_journal();
        mem.write_u64(0x1000, cycle);
        mem.write_u8(0x2000 + cycle, cycle as u8);
        journals.push(mem.take_journal());
        states.push(mem.clone());
    }
    while let Some(journal) = journals.pop() {
        let _ = states.pop();
        mem.rollback(&journal);
        assert_eq!(Some(&mem), states.last());
    }
}

#[test]
fn test_take_without_journal_is_empty() {
    let mut mem = Memory::new();
    mem.write_u8(0, 1);
    assert!(mem.take_journal().is_empty());
}

#[test]
fn test_clear() {
    let mut mem = Memory::new();
    mem.write_u64(0x8000_0000, u64::MAX);
    mem.begin_journal();
    mem.clear();
    assert!(!mem.is_journaling());
    assert_eq!(mem.read_u64(0x8000_0000), 0);
    assert_eq!(mem, Memory::new());
}
