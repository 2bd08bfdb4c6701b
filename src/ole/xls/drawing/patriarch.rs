//! The top-level shape container of a sheet's drawing.

use super::anchor::ClientAnchor;
use super::registry::SheetId;
use super::shape::{Picture, Shape};
use crate::common::error::{Error, Result};
use crate::images::{PictureData, PictureId, PictureStore};
use tracing::debug;

/// The root shape group of one sheet's drawing.
///
/// Children keep their creation order, which is also the order they are
/// written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patriarch {
    sheet: SheetId,
    children: Vec<Shape>,
}

impl Patriarch {
    pub(crate) fn new(sheet: SheetId) -> Self {
        Self {
            sheet,
            children: Vec::new(),
        }
    }

    /// Sheet this drawing belongs to.
    #[inline]
    pub fn sheet(&self) -> SheetId {
        self.sheet
    }

    /// Shapes in creation order.
    #[inline]
    pub fn children(&self) -> &[Shape] {
        &self.children
    }

    /// Picture frames in creation order.
    pub fn pictures(&self) -> impl Iterator<Item = &Picture> {
        self.children.iter().filter_map(Shape::as_picture)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Place picture `index` from `store` at `anchor`.
    ///
    /// Fails with [`Error::UnknownResource`] when the store has no such
    /// picture, in which case the children are left untouched.
    pub fn create_picture(
        &mut self,
        store: &PictureStore,
        anchor: ClientAnchor,
        index: PictureId,
    ) -> Result<&Picture> {
        store.resolve(index)?;
        debug!(sheet = %self.sheet, picture = index.get(), "created picture shape");
        let position = self.children.len();
        self.push_picture(Picture::new(anchor, index, self.sheet));
        self.picture(position)
    }

    /// Append a picture already checked against the store.
    pub(crate) fn push_picture(&mut self, picture: Picture) {
        self.children.push(Shape::Picture(picture));
    }

    /// Picture frame at `position`.
    pub fn picture(&self, position: usize) -> Result<&Picture> {
        self.children
            .get(position)
            .and_then(Shape::as_picture)
            .ok_or(Error::ShapeNotFound(position))
    }

    /// Stored picture displayed by the frame at `position`.
    pub fn picture_data<'s>(&self, store: &'s PictureStore, position: usize) -> Result<&'s PictureData> {
        store.resolve(self.picture(position)?.picture_index())
    }

    /// Move the bottom-right corner of the frame at `position` so the picture
    /// shows at `scale` times its natural size.
    ///
    /// The natural size comes from the image header; an image declaring no
    /// resolution, or a resolution of zero, is taken to be 96 DPI.
    pub fn resize_picture(
        &mut self,
        store: &PictureStore,
        position: usize,
        scale: f64,
    ) -> Result<&Picture> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidContent(format!(
                "resize scale must be positive, got {}",
                scale
            )));
        }

        let data = self.picture_data(store, position)?;
        let info = data.image_info().ok_or_else(|| {
            Error::InvalidContent(format!(
                "size of {:?} picture {} cannot be determined",
                data.picture_type(),
                data.index()
            ))
        })?;
        let (width, height) = info.screen_size();

        let picture = self
            .children
            .get_mut(position)
            .and_then(Shape::as_picture_mut)
            .ok_or(Error::ShapeNotFound(position))?;
        let anchor = picture.anchor().resized(width * scale, height * scale);
        picture.set_anchor(anchor);
        Ok(picture)
    }
}

/// Mutable access to one sheet's drawing together with the picture store its
/// shapes refer to.
///
/// Obtained from [`Workbook::create_drawing_patriarch`](crate::ole::xls::Workbook::create_drawing_patriarch).
#[derive(Debug)]
pub struct Drawing<'a> {
    store: &'a PictureStore,
    patriarch: &'a mut Patriarch,
}

impl<'a> Drawing<'a> {
    pub(crate) fn new(store: &'a PictureStore, patriarch: &'a mut Patriarch) -> Self {
        Self { store, patriarch }
    }

    /// Sheet this drawing belongs to.
    pub fn sheet(&self) -> SheetId {
        self.patriarch.sheet()
    }

    /// The underlying patriarch.
    pub fn patriarch(&self) -> &Patriarch {
        self.patriarch
    }

    /// Place picture `index` at `anchor`. See [`Patriarch::create_picture`].
    pub fn create_picture(&mut self, anchor: ClientAnchor, index: PictureId) -> Result<&Picture> {
        self.patriarch.create_picture(self.store, anchor, index)
    }

    /// Shapes in creation order.
    pub fn children(&self) -> &[Shape] {
        self.patriarch.children()
    }

    /// Stored picture displayed by the frame at `position`.
    pub fn picture_data(&self, position: usize) -> Result<&'a PictureData> {
        self.patriarch.picture_data(self.store, position)
    }

    /// Resize the frame at `position`. See [`Patriarch::resize_picture`].
    pub fn resize_picture(&mut self, position: usize, scale: f64) -> Result<&Picture> {
        self.patriarch.resize_picture(self.store, position, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::PictureType;
    use crate::images::info::tests::png_header;

    fn store_with(payloads: &[&[u8]]) -> PictureStore {
        let mut store = PictureStore::new();
        for payload in payloads {
            store.register(payload.to_vec(), PictureType::Jpeg).unwrap();
        }
        store
    }

    #[test]
    fn test_create_picture() {
        let store = store_with(&[&[1, 2, 3], &[4, 5, 6]]);
        let mut patriarch = Patriarch::new(SheetId::new(0));

        let anchor = ClientAnchor::cells(0, 0, 1, 1);
        let second = PictureId::new(2).unwrap();
        let picture = patriarch.create_picture(&store, anchor, second).unwrap();
        assert_eq!(picture.picture_index(), second);
        assert_eq!(picture.anchor(), &anchor);
        assert_eq!(picture.sheet(), SheetId::new(0));

        assert_eq!(patriarch.len(), 1);
        assert_eq!(patriarch.picture_data(&store, 0).unwrap().data(), &[4, 5, 6]);
    }

    #[test]
    fn test_unknown_picture_leaves_children_unchanged() {
        let store = store_with(&[&[1]]);
        let mut patriarch = Patriarch::new(SheetId::new(0));
        patriarch
            .create_picture(&store, ClientAnchor::default(), PictureId::new(1).unwrap())
            .unwrap();

        let err = patriarch
            .create_picture(&store, ClientAnchor::default(), PictureId::new(7).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownResource(7)));
        assert_eq!(patriarch.len(), 1);
    }

    #[test]
    fn test_same_picture_twice() {
        let store = store_with(&[&[1]]);
        let mut patriarch = Patriarch::new(SheetId::new(3));
        let index = PictureId::new(1).unwrap();
        patriarch.create_picture(&store, ClientAnchor::cells(0, 0, 1, 1), index).unwrap();
        patriarch.create_picture(&store, ClientAnchor::cells(2, 2, 3, 3), index).unwrap();

        let indices: Vec<u32> = patriarch.pictures().map(|p| p.picture_index().get()).collect();
        assert_eq!(indices, vec![1, 1]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_shape() {
        let store = store_with(&[&[1]]);
        let patriarch = Patriarch::new(SheetId::new(0));
        assert!(matches!(patriarch.picture_data(&store, 0), Err(Error::ShapeNotFound(0))));
    }

    #[test]
    fn test_resize_zero_dpi_png() {
        let mut store = PictureStore::new();
        let index = store
            .register(png_header(128, 40, Some((0, 0))), PictureType::Png)
            .unwrap();
        let mut patriarch = Patriarch::new(SheetId::new(0));
        patriarch
            .create_picture(&store, ClientAnchor::cells(1, 1, 1, 1), index)
            .unwrap();

        let picture = patriarch.resize_picture(&store, 0, 1.0).unwrap();
        let anchor = picture.anchor();
        assert_eq!((anchor.col2, anchor.dx2), (3, 0));
        assert_eq!((anchor.row2, anchor.dy2), (3, 90));
    }

    #[test]
    fn test_resize_rejects_bad_scale_and_unknown_size() {
        let store = store_with(&[&[1, 2, 3]]);
        let mut patriarch = Patriarch::new(SheetId::new(0));
        patriarch
            .create_picture(&store, ClientAnchor::default(), PictureId::new(1).unwrap())
            .unwrap();

        assert!(patriarch.resize_picture(&store, 0, 0.0).is_err());
        assert!(patriarch.resize_picture(&store, 0, f64::NAN).is_err());
        assert!(matches!(
            patriarch.resize_picture(&store, 0, 1.0),
            Err(Error::InvalidContent(_))
        ));
        assert!(matches!(
            patriarch.resize_picture(&store, 5, 1.0),
            Err(Error::ShapeNotFound(5))
        ));
    }

    #[test]
    fn test_drawing_handle() {
        let store = store_with(&[&[9, 9]]);
        let mut patriarch = Patriarch::new(SheetId::new(1));
        let mut drawing = Drawing::new(&store, &mut patriarch);

        drawing
            .create_picture(ClientAnchor::default(), PictureId::new(1).unwrap())
            .unwrap();
        assert_eq!(drawing.sheet(), SheetId::new(1));
        assert_eq!(drawing.children().len(), 1);
        assert_eq!(drawing.picture_data(0).unwrap().data(), &[9, 9]);
    }
}
