//! Register file identifiers.
//!
//! The controller never interprets register contents. It only needs to name register
//! files so it can snapshot them before a clock and write back old values on reverse.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Register files a processor may expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegisterFileType {
    /// General-purpose integer registers.
    Gpr,
    /// Floating-point registers.
    Fpr,
    /// Control and status registers.
    Csr,
}

impl fmt::Display for RegisterFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpr => write!(f, "gpr"),
            Self::Fpr => write!(f, "fpr"),
            Self::Csr => write!(f, "csr"),
        }
    }
}

/// Value of one register before a cycle modified it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterWrite {
    /// Register file of the modified register.
    pub file: RegisterFileType,
    /// Index within the register file.
    pub index: usize,
    /// Value held before the cycle.
    pub old: u64,
}
