//! Legacy Excel (.xls) workbook drawing layer
//!
//! This module models the pictures and drawings of a BIFF8 workbook and
//! encodes them to, and decodes them from, a workbook stream.
//!
//! Pictures live in a per-workbook store and are placed on a sheet through
//! that sheet's drawing patriarch:
//!
//! ```rust
//! use officeart::ole::xls::{ClientAnchor, Workbook};
//! use officeart::images::PictureType;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.create_sheet("Sheet1")?;
//! let index = workbook.add_picture(vec![1, 2, 3], PictureType::Jpeg)?;
//! workbook
//!     .create_drawing_patriarch(sheet)?
//!     .create_picture(ClientAnchor::cells(1, 1, 4, 8), index)?;
//!
//! let loaded = Workbook::from_bytes(&workbook.to_bytes()?)?;
//! let patriarch = loaded.drawing_patriarch(sheet).unwrap();
//! assert_eq!(patriarch.children().len(), 1);
//! # Ok::<(), officeart::Error>(())
//! ```

/// BIFF8 record plumbing
pub mod biff;

/// Codec configuration
mod config;

/// Sheet drawings and shapes
pub mod drawing;

/// Workbook stream reader
mod reader;

/// The in-memory workbook
mod workbook;

/// Worksheet names
mod worksheet;

/// Workbook stream writer
mod writer;


pub use config::CodecOptions;
pub use drawing::{
    AnchorType, ClientAnchor, Drawing, DrawingRegistry, Patriarch, Picture, Shape, SheetId,
};
pub use reader::XlsReader;
pub use workbook::Workbook;
pub use worksheet::{Worksheet, validate_name};
pub use writer::XlsWriter;
