//! Officeart - picture store and OfficeArt drawing layer for legacy binary
//! Excel workbooks
//!
//! This library keeps the pictures embedded in a workbook in a single
//! per-workbook store, places them on sheets through each sheet's drawing
//! patriarch, and writes and reads the whole arrangement as a BIFF8 workbook
//! stream carrying OfficeArt (Escher) records.
//!
//! # Features
//!
//! - **Picture store**: 1-based, stable picture indices that survive save/load
//!   cycles
//! - **Drawings**: one lazily created patriarch per sheet, picture shapes
//!   anchored to cells
//! - **Codec**: MSODRAWINGGROUP / MSODRAWING records with CONTINUE splitting,
//!   BLIP store entries and zlib-compressed metafiles
//!
//! # Example
//!
//! ```
//! use officeart::{ClientAnchor, PictureType, Workbook};
//!
//! # fn main() -> officeart::Result<()> {
//! let mut workbook = Workbook::new();
//! let sheet = workbook.create_sheet("Sheet1")?;
//!
//! let first = workbook.add_picture(vec![1, 2, 3], PictureType::Jpeg)?;
//! let second = workbook.add_picture(vec![4, 5, 6], PictureType::Jpeg)?;
//! assert_eq!((first.get(), second.get()), (1, 2));
//!
//! let mut drawing = workbook.create_drawing_patriarch(sheet)?;
//! drawing.create_picture(ClientAnchor::default(), first)?;
//! drawing.create_picture(ClientAnchor::default(), second)?;
//!
//! // Write the workbook stream and read it back
//! let mut loaded = Workbook::from_bytes(&workbook.to_bytes()?)?;
//! assert_eq!(loaded.all_pictures().len(), 2);
//!
//! // New pictures continue after the ones that were loaded
//! let third = loaded.add_picture(vec![7, 8, 9], PictureType::Jpeg)?;
//! assert_eq!(third.get(), 3);
//! # Ok(())
//! # }
//! ```

/// Common types and utilities
pub mod common;

/// Picture types, BLIP records and the picture store
pub mod images;

/// OLE-era binary formats: Escher records and the workbook drawing layer
pub mod ole;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use images::{ImageInfo, PictureData, PictureId, PictureStore, PictureType};
pub use ole::xls::{
    AnchorType, ClientAnchor, CodecOptions, Drawing, DrawingRegistry, Patriarch, Picture, Shape,
    SheetId, Workbook, Worksheet,
};
