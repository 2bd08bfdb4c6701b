//! Unified error type for the picture store, drawing layer and workbook codec.
use thiserror::Error;

/// Main error type for officeart operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A picture could not be registered (empty payload, unknown type)
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// A picture index does not resolve in the workbook's picture store
    #[error("Unknown picture index: {0}")]
    UnknownResource(u32),

    /// The serialized workbook stream is malformed
    #[error("Codec failure: {0}")]
    Codec(String),

    /// No worksheet with the given name or position
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Worksheet name rejected (empty, too long, reserved characters, duplicate)
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// A drawing has no child shape at the given position
    #[error("Shape not found at position {0}")]
    ShapeNotFound(usize),
}

/// Result type for officeart operations.
pub type Result<T> = std::result::Result<T, Error>;
