//! Shapes placed on a sheet's drawing.

use super::anchor::ClientAnchor;
use super::registry::SheetId;
use crate::images::PictureId;

/// A picture frame: a picture from the workbook store placed at an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    anchor: ClientAnchor,
    picture_index: PictureId,
    sheet: SheetId,
}

impl Picture {
    pub(crate) fn new(anchor: ClientAnchor, picture_index: PictureId, sheet: SheetId) -> Self {
        Self {
            anchor,
            picture_index,
            sheet,
        }
    }

    /// Where the picture sits on the sheet.
    #[inline]
    pub fn anchor(&self) -> &ClientAnchor {
        &self.anchor
    }

    /// Index of the displayed picture in the workbook store.
    #[inline]
    pub fn picture_index(&self) -> PictureId {
        self.picture_index
    }

    /// Sheet whose drawing owns the picture.
    #[inline]
    pub fn sheet(&self) -> SheetId {
        self.sheet
    }

    pub(crate) fn set_anchor(&mut self, anchor: ClientAnchor) {
        self.anchor = anchor;
    }
}

/// A shape owned by a drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Shape {
    /// Picture frame
    Picture(Picture),
}

impl Shape {
    /// The picture, if this shape is a picture frame.
    pub fn as_picture(&self) -> Option<&Picture> {
        match self {
            Shape::Picture(picture) => Some(picture),
        }
    }

    pub(crate) fn as_picture_mut(&mut self) -> Option<&mut Picture> {
        match self {
            Shape::Picture(picture) => Some(picture),
        }
    }

    /// Where the shape sits on the sheet.
    pub fn anchor(&self) -> &ClientAnchor {
        match self {
            Shape::Picture(picture) => picture.anchor(),
        }
    }

    /// Sheet whose drawing owns the shape.
    pub fn sheet(&self) -> SheetId {
        match self {
            Shape::Picture(picture) => picture.sheet(),
        }
    }
}
