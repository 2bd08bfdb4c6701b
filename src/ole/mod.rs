/// Escher (OfficeArt) drawing records
///
/// The record layer shared by the workbook drawing group and sheet drawings.
pub mod escher;

/// Legacy Excel workbook (.xls) drawing layer
///
/// Workbook, picture placement and the BIFF8 stream codec.
pub mod xls;
