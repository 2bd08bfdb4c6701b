//! The in-memory workbook: sheets, pictures and drawings.

use super::config::CodecOptions;
use super::drawing::{Drawing, DrawingRegistry, Patriarch, SheetId};
use super::reader::XlsReader;
use super::worksheet::Worksheet;
use super::writer::XlsWriter;
use crate::common::error::{Error, Result};
use crate::images::{PictureData, PictureId, PictureStore, PictureType};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A workbook with its picture store and per-sheet drawings.
///
/// # Examples
///
/// ```rust
/// use officeart::ole::xls::{ClientAnchor, Workbook};
/// use officeart::images::PictureType;
///
/// let mut workbook = Workbook::new();
/// let sheet = workbook.create_sheet("Sheet1")?;
/// let index = workbook.add_picture(vec![0xFF, 0xD8, 0xFF, 0xD9], PictureType::Jpeg)?;
///
/// let mut drawing = workbook.create_drawing_patriarch(sheet)?;
/// drawing.create_picture(ClientAnchor::cells(0, 0, 2, 5), index)?;
///
/// let bytes = workbook.to_bytes()?;
/// let loaded = Workbook::from_bytes(&bytes)?;
/// assert_eq!(loaded.all_pictures().len(), 1);
/// # Ok::<(), officeart::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    pictures: PictureStore,
    drawings: DrawingRegistry,
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        sheets: Vec<Worksheet>,
        pictures: PictureStore,
        drawings: DrawingRegistry,
    ) -> Self {
        Self {
            sheets,
            pictures,
            drawings,
        }
    }

    // ---------------------------------------------------------------------
    // Sheets
    // ---------------------------------------------------------------------

    /// Append a worksheet.
    ///
    /// Names must be 1-31 characters and unique within the workbook,
    /// ignoring case.
    pub fn create_sheet(&mut self, name: &str) -> Result<SheetId> {
        let sheet = Worksheet::new(name)?;
        if self.sheets.iter().any(|existing| existing.has_name(name)) {
            return Err(Error::InvalidSheetName(format!(
                "Worksheet '{}' already exists",
                name
            )));
        }

        let id = SheetId::new(self.sheets.len());
        self.sheets.push(sheet);
        debug!(%id, name, "created worksheet");
        Ok(id)
    }

    /// Find a sheet by name, ignoring case.
    pub fn sheet_id(&self, name: &str) -> Result<SheetId> {
        self.sheets
            .iter()
            .position(|sheet| sheet.has_name(name))
            .map(SheetId::new)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Sheet at `id`, if present.
    pub fn sheet(&self, id: SheetId) -> Option<&Worksheet> {
        self.sheets.get(id.index())
    }

    /// All sheets in workbook order.
    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    // ---------------------------------------------------------------------
    // Pictures
    // ---------------------------------------------------------------------

    /// Register a picture with the workbook store and return its index.
    pub fn add_picture(&mut self, data: Vec<u8>, picture_type: PictureType) -> Result<PictureId> {
        self.pictures.register(data, picture_type)
    }

    /// Register a picture given a raw MSOBLIPTYPE code.
    pub fn add_picture_code(&mut self, data: Vec<u8>, code: u32) -> Result<PictureId> {
        self.pictures.register_code(data, code)
    }

    /// Register a picture whose format is detected from its content.
    pub fn add_picture_detected(&mut self, data: Vec<u8>) -> Result<PictureId> {
        self.pictures.register_detected(data)
    }

    /// All registered pictures, ordered by index.
    pub fn all_pictures(&self) -> &[PictureData] {
        self.pictures.all()
    }

    /// Picture at `index`.
    pub fn picture(&self, index: PictureId) -> Result<&PictureData> {
        self.pictures.resolve(index)
    }

    /// The workbook's picture store.
    pub fn pictures(&self) -> &PictureStore {
        &self.pictures
    }

    // ---------------------------------------------------------------------
    // Drawings
    // ---------------------------------------------------------------------

    /// The drawing of `sheet`, created empty on first request.
    ///
    /// Calling this again for the same sheet returns the same drawing, with
    /// the shapes added so far.
    pub fn create_drawing_patriarch(&mut self, sheet: SheetId) -> Result<Drawing<'_>> {
        if self.sheet(sheet).is_none() {
            return Err(Error::SheetNotFound(sheet.to_string()));
        }
        let patriarch = self.drawings.get_or_create(sheet);
        Ok(Drawing::new(&self.pictures, patriarch))
    }

    /// The drawing of `sheet`, if one exists.
    pub fn drawing_patriarch(&self, sheet: SheetId) -> Option<&Patriarch> {
        self.drawings.get(sheet)
    }

    /// All drawings, in sheet order.
    pub fn drawings(&self) -> &DrawingRegistry {
        &self.drawings
    }

    // ---------------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------------

    /// Encode the workbook stream with default options.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(CodecOptions::default())
    }

    /// Encode the workbook stream.
    pub fn to_bytes_with(&self, options: CodecOptions) -> Result<Vec<u8>> {
        XlsWriter::with_options(self, options).to_bytes()
    }

    /// Decode a workbook stream. Malformed input fails as a whole.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        XlsReader::new(data).read()
    }

    /// Write the workbook stream to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a workbook stream from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::xls::ClientAnchor;

    #[test]
    fn test_create_sheet() {
        let mut workbook = Workbook::new();
        assert_eq!(workbook.create_sheet("Sheet1").unwrap(), SheetId::new(0));
        assert_eq!(workbook.create_sheet("Sheet2").unwrap(), SheetId::new(1));
        assert_eq!(workbook.sheet_count(), 2);
        assert_eq!(workbook.sheet(SheetId::new(1)).unwrap().name(), "Sheet2");
    }

    #[test]
    fn test_duplicate_sheet_name() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("Data").unwrap();
        assert!(matches!(
            workbook.create_sheet("DATA"),
            Err(Error::InvalidSheetName(_))
        ));
        assert_eq!(workbook.sheet_count(), 1);
    }

    #[test]
    fn test_sheet_lookup() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("First").unwrap();
        workbook.create_sheet("Second").unwrap();
        assert_eq!(workbook.sheet_id("second").unwrap(), SheetId::new(1));
        assert!(matches!(
            workbook.sheet_id("Third"),
            Err(Error::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_drawing_for_missing_sheet() {
        let mut workbook = Workbook::new();
        assert!(matches!(
            workbook.create_drawing_patriarch(SheetId::new(0)),
            Err(Error::SheetNotFound(_))
        ));
        assert!(workbook.drawings().is_empty());
    }

    #[test]
    fn test_workbook_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Workbook>();
    }

    #[test]
    fn test_patriarch_is_reused() {
        let mut workbook = Workbook::new();
        let sheet = workbook.create_sheet("Sheet1").unwrap();
        let index = workbook.add_picture(vec![1, 2, 3], PictureType::Jpeg).unwrap();

        workbook
            .create_drawing_patriarch(sheet)
            .unwrap()
            .create_picture(ClientAnchor::default(), index)
            .unwrap();
        let drawing = workbook.create_drawing_patriarch(sheet).unwrap();
        assert_eq!(drawing.children().len(), 1);
        assert_eq!(workbook.drawings().len(), 1);
    }
}
