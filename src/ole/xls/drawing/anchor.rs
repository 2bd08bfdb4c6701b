//! Cell-relative shape anchors.
//!
//! A workbook shape is positioned by the cell its top-left corner sits in and
//! the cell its bottom-right corner sits in, each with an offset inside the
//! cell. Offsets are in 1/1024 of the column width and 1/256 of the row
//! height.

use crate::common::error::{Error, Result};
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::*;

/// Default column width in pixels (8.43 characters of the default font).
pub const DEFAULT_COLUMN_WIDTH_PX: f64 = 64.0;
/// Default row height in pixels: 0x00FF twips (12.75 points) at 96 DPI.
pub const DEFAULT_ROW_HEIGHT_PX: f64 = 17.0;

const DX_PER_COLUMN: f64 = 1024.0;
const DY_PER_ROW: f64 = 256.0;

/// How a shape follows the cells under it when they are resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorType {
    /// Move and size with cells
    MoveAndResize,
    /// Move but don't size with cells
    MoveDontResize,
    /// Don't move or size with cells
    DontMoveAndResize,
}

impl AnchorType {
    /// Decode the low bits of the anchor flags.
    pub fn from_flags(flags: u16) -> Self {
        match flags & 0x0003 {
            2 => Self::MoveDontResize,
            3 => Self::DontMoveAndResize,
            _ => Self::MoveAndResize,
        }
    }

    /// Encode as anchor flags.
    pub const fn flags(self) -> u16 {
        match self {
            Self::MoveAndResize => 0,
            Self::MoveDontResize => 2,
            Self::DontMoveAndResize => 3,
        }
    }
}

/// OfficeArtClientAnchorSheet body (18 bytes), [MS-XLS] 2.5.193.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ClientAnchor {
    /// Anchor flags; see [`AnchorType`]
    pub flags: u16,
    /// Column of the top-left corner
    pub col1: u16,
    /// Offset inside `col1`, in 1/1024 of the column width
    pub dx1: u16,
    /// Row of the top-left corner
    pub row1: u16,
    /// Offset inside `row1`, in 1/256 of the row height
    pub dy1: u16,
    /// Column of the bottom-right corner
    pub col2: u16,
    /// Offset inside `col2`
    pub dx2: u16,
    /// Row of the bottom-right corner
    pub row2: u16,
    /// Offset inside `row2`
    pub dy2: u16,
}

impl ClientAnchor {
    /// Size of the encoded anchor.
    pub const SIZE: usize = 18;

    /// Create an anchor from cell offsets and corners.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        dx1: u16,
        dy1: u16,
        dx2: u16,
        dy2: u16,
        col1: u16,
        row1: u16,
        col2: u16,
        row2: u16,
    ) -> Self {
        Self {
            flags: 0,
            col1,
            dx1,
            row1,
            dy1,
            col2,
            dx2,
            row2,
            dy2,
        }
    }

    /// Anchor covering whole cells from `(col1, row1)` up to, not including,
    /// `(col2, row2)`.
    pub const fn cells(col1: u16, row1: u16, col2: u16, row2: u16) -> Self {
        Self::new(0, 0, 0, 0, col1, row1, col2, row2)
    }

    /// Set the anchor type.
    pub fn with_anchor_type(mut self, anchor_type: AnchorType) -> Self {
        self.flags = (self.flags & !0x0003) | anchor_type.flags();
        self
    }

    /// The anchor type.
    pub fn anchor_type(&self) -> AnchorType {
        AnchorType::from_flags(self.flags)
    }

    /// Decode an anchor from a ClientAnchor record body.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read_from_bytes(data).map_err(|_| {
            Error::Codec(format!(
                "Client anchor must be {} bytes, found {}",
                Self::SIZE,
                data.len()
            ))
        })
    }

    /// Encoded record body.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// A copy of this anchor whose bottom-right corner is moved so the shape
    /// spans `width_px` x `height_px` from its top-left corner, assuming
    /// default column widths and row heights.
    pub fn resized(&self, width_px: f64, height_px: f64) -> Self {
        let (col2, dx2) = extend(
            self.col1,
            self.dx1,
            width_px,
            DEFAULT_COLUMN_WIDTH_PX,
            DX_PER_COLUMN,
        );
        let (row2, dy2) = extend(
            self.row1,
            self.dy1,
            height_px,
            DEFAULT_ROW_HEIGHT_PX,
            DY_PER_ROW,
        );
        Self {
            col2,
            dx2,
            row2,
            dy2,
            ..*self
        }
    }
}

/// Walk `length_px` cells forward from `(start, offset)`.
fn extend(start: u16, offset: u16, length_px: f64, cell_px: f64, units: f64) -> (u16, u16) {
    let mut remaining = length_px.max(0.0) + offset as f64 / units * cell_px;
    let mut cell = start;
    while remaining >= cell_px && cell < u16::MAX {
        remaining -= cell_px;
        cell += 1;
    }
    let delta = (remaining / cell_px * units).round().min(units - 1.0) as u16;
    (cell, delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let anchor = ClientAnchor::new(0, 0, 848, 240, 0, 0, 1, 9);
        let bytes = anchor.to_bytes();
        assert_eq!(bytes.len(), 18);
        // flags, col1, dx1, row1, dy1, col2, dx2, row2, dy2
        assert_eq!(u16::from_le_bytes([bytes[10], bytes[11]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), 848);
        assert_eq!(u16::from_le_bytes([bytes[14], bytes[15]]), 9);
        assert_eq!(u16::from_le_bytes([bytes[16], bytes[17]]), 240);
        assert_eq!(ClientAnchor::parse(&bytes).unwrap(), anchor);
    }

    #[test]
    fn test_parse_wrong_size() {
        assert!(matches!(ClientAnchor::parse(&[0; 8]), Err(Error::Codec(_))));
    }

    #[test]
    fn test_anchor_type() {
        let anchor = ClientAnchor::default().with_anchor_type(AnchorType::DontMoveAndResize);
        assert_eq!(anchor.flags, 3);
        assert_eq!(anchor.anchor_type(), AnchorType::DontMoveAndResize);
        assert_eq!(ClientAnchor::default().anchor_type(), AnchorType::MoveAndResize);
    }

    #[test]
    fn test_resized_whole_cells() {
        let anchor = ClientAnchor::cells(2, 3, 2, 3).resized(128.0, 34.0);
        assert_eq!((anchor.col2, anchor.dx2), (4, 0));
        assert_eq!((anchor.row2, anchor.dy2), (5, 0));
        assert_eq!((anchor.col1, anchor.row1), (2, 3));
    }

    #[test]
    fn test_resized_partial_cells() {
        // Start half way into the first column: 32px + 64px = 1.5 columns.
        let anchor = ClientAnchor::new(512, 0, 0, 0, 0, 0, 0, 0).resized(64.0, 8.5);
        assert_eq!((anchor.col2, anchor.dx2), (1, 512));
        assert_eq!((anchor.row2, anchor.dy2), (0, 128));
    }

    #[test]
    fn test_resized_uses_default_row_height() {
        // 40px spans two 17px rows with 6px left over: 6/17 of 256
        let anchor = ClientAnchor::cells(0, 0, 0, 0).resized(0.0, 40.0);
        assert_eq!((anchor.row2, anchor.dy2), (2, 90));
    }

    #[test]
    fn test_resized_zero_size() {
        let anchor = ClientAnchor::cells(1, 1, 5, 5).resized(0.0, 0.0);
        assert_eq!((anchor.col2, anchor.dx2, anchor.row2, anchor.dy2), (1, 0, 1, 0));
    }
}
