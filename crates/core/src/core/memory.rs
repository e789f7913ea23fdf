//! Journaling memory.
//!
//! This module provides the byte-addressable address space that engines expose to the
//! controller. It provides:
//! 1. **Sparse storage:** 4 KiB pages allocated on first write; unmapped bytes read as zero.
//! 2. **Little-endian access:** Byte, half, word and double-word reads and writes.
//! 3. **Write journaling:** While a journal is open, every written byte's previous value is
//!    recorded so the controller can undo a cycle's memory effects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PAGE_SHIFT: u64 = 12;
const PAGE_SIZE: usize = 1 << PAGE_SHIFT;
const PAGE_MASK: u64 = (1 << PAGE_SHIFT) - 1;

/// Previous value of one byte overwritten while a journal was open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWrite {
    /// Byte address.
    pub addr: u64,
    /// Value held before the write.
    pub old: u8,
}

/// Sparse, little-endian, byte-addressable memory with an optional write journal.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    pages: HashMap<u64, Box<[u8; PAGE_SIZE]>>,
    journal: Option<Vec<MemoryWrite>>,
}

impl PartialEq for Memory {
    /// Compares contents only; an all-zero page equals an unmapped one.
    fn eq(&self, other: &Self) -> bool {
        let covers = |a: &Self, b: &Self| {
            a.pages.iter().all(|(base, page)| match b.pages.get(base) {
                Some(other) => page == other,
                None => page.iter().all(|&byte| byte == 0),
            })
        };
        covers(self, other) && covers(other, self)
    }
}

impl Eq for Memory {}

impl Memory {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one byte.
    pub fn read_u8(&self, addr: u64) -> u8 {
        self.pages
            .get(&(addr >> PAGE_SHIFT))
            .map_or(0, |page| page[(addr & PAGE_MASK) as usize])
    }

    /// Writes one byte, journaling the previous value if a journal is open.
    pub fn write_u8(&mut self, addr: u64, val: u8) {
        let page = self
            .pages
            .entry(addr >> PAGE_SHIFT)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]));
        let slot = &mut page[(addr & PAGE_MASK) as usize];
        if let Some(journal) = self.journal.as_mut() {
            journal.push(MemoryWrite { addr, old: *slot });
        }
        *slot = val;
    }

    /// Reads `len` bytes starting at `addr`.
    pub fn read_bytes(&self, addr: u64, len: usize) -> Vec<u8> {
        (0..len as u64)
            .map(|i| self.read_u8(addr.wrapping_add(i)))
            .collect()
    }

    /// Writes `data` starting at `addr`.
    pub fn write_bytes(&mut self, addr: u64, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u64), byte);
        }
    }

    /// Reads a little-endian half-word.
    pub fn read_u16(&self, addr: u64) -> u16 {
        u16::from_le_bytes(self.read_array(addr))
    }

    /// Reads a little-endian word.
    pub fn read_u32(&self, addr: u64) -> u32 {
        u32::from_le_bytes(self.read_array(addr))
    }

    /// Reads a little-endian double-word.
    pub fn read_u64(&self, addr: u64) -> u64 {
        u64::from_le_bytes(self.read_array(addr))
    }

    /// Writes a little-endian half-word.
    pub fn write_u16(&mut self, addr: u64, val: u16) {
        self.write_bytes(addr, &val.to_le_bytes());
    }

    /// Writes a little-endian word.
    pub fn write_u32(&mut self, addr: u64, val: u32) {
        self.write_bytes(addr, &val.to_le_bytes());
    }

    /// Writes a little-endian double-word.
    pub fn write_u64(&mut self, addr: u64, val: u64) {
        self.write_bytes(addr, &val.to_le_bytes());
    }

    fn read_array<const N: usize>(&self, addr: u64) -> [u8; N] {
        let mut out = [0; N];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.read_u8(addr.wrapping_add(i as u64));
        }
        out
    }

    /// Opens a fresh journal, discarding any open one.
    pub fn begin_journal(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Closes the journal and returns the recorded writes in write order.
    pub fn take_journal(&mut self) -> Vec<MemoryWrite> {
        self.journal.take().unwrap_or_default()
    }

    /// True while a journal is open.
    pub fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    /// Undoes `writes`, newest first. Rollback writes are never journaled.
    pub fn rollback(&mut self, writes: &[MemoryWrite]) {
        let journal = self.journal.take();
        for write in writes.iter().rev() {
            self.write_u8(write.addr, write.old);
        }
        self.journal = journal;
    }

    /// Removes every page and closes the journal.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.journal = None;
    }
}
