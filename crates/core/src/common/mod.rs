//! Common types shared across the controller.
//!
//! This module provides:
//! 1. **Error Handling:** Controller errors and engine faults.
//! 2. **Register Identification:** Register file identifiers and recorded register writes.

/// Error types for controller operations and engine faults.
pub mod error;

/// Register file identifiers.
pub mod reg;

pub use error::{EngineFault, SimError, SimResult};
pub use reg::{RegisterFileType, RegisterWrite};
