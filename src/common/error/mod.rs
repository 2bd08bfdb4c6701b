//! Unified error types for officeart.
//!
//! Picture registration, drawing construction and the workbook codec all
//! report through one error enum so callers can match on a single type.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
