//! Workbook stream reader.
//!
//! Rebuilds a [`Workbook`] from a BIFF8 workbook stream: sheet names from the
//! BOUNDSHEET records, the picture store from the BLIP store of the drawing
//! group, and each sheet's drawing from its MSODRAWING records.
//!
//! Reading is all or nothing. Any malformed record, dangling picture
//! reference or truncated container fails the whole read with
//! [`Error::Codec`]; no partially rebuilt workbook is ever returned.

use super::biff::{self, BoundSheetRecord, RecordIter, record_type as biff_record, substream};
use super::drawing::{ClientAnchor, DrawingRegistry, Patriarch, Picture, SheetId};
use super::workbook::Workbook;
use super::worksheet::Worksheet;
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};
use crate::images::bse::read_bse;
use crate::images::{PictureData, PictureId, PictureStore};
use crate::ole::escher::{
    EscherContainer, EscherRecord, EscherRecordType, ShapeFlags, prop_id, shape_type,
};
use tracing::{debug, trace, warn};

/// Records of one substream between its BOF and EOF, CONTINUE data joined.
struct Substream {
    kind: u16,
    records: Vec<(u16, Vec<u8>)>,
}

/// Reads a [`Workbook`] from a BIFF8 workbook stream.
pub struct XlsReader<'a> {
    data: &'a [u8],
}

impl<'a> XlsReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Decode the stream.
    pub fn read(self) -> Result<Workbook> {
        let globals = self.substream(0)?;
        if globals.kind != substream::GLOBALS {
            return Err(Error::Codec(format!(
                "Stream starts with substream 0x{:04X}, expected workbook globals",
                globals.kind
            )));
        }

        let mut bound_sheets = Vec::new();
        let mut group = Vec::new();
        for (kind, payload) in &globals.records {
            match *kind {
                biff_record::BOUNDSHEET => bound_sheets.push(BoundSheetRecord::parse(payload)?),
                biff_record::MSODRAWINGGROUP => group.extend_from_slice(payload),
                _ => {},
            }
        }

        let pictures = if group.is_empty() {
            PictureStore::new()
        } else {
            read_drawing_group(&group)?
        };

        let mut sheets: Vec<Worksheet> = Vec::with_capacity(bound_sheets.len());
        let mut drawings = DrawingRegistry::new();
        for (index, bound_sheet) in bound_sheets.iter().enumerate() {
            let sheet = Worksheet::new(&bound_sheet.name).map_err(|e| Error::Codec(e.to_string()))?;
            if sheets.iter().any(|existing| existing.has_name(sheet.name())) {
                return Err(Error::Codec(format!(
                    "Duplicate sheet name '{}'",
                    bound_sheet.name
                )));
            }

            let id = SheetId::new(index);
            let sheet_stream = self.substream(bound_sheet.position as usize)?;
            if sheet_stream.kind != substream::WORKSHEET {
                warn!(
                    sheet = %bound_sheet.name,
                    kind = sheet_stream.kind,
                    "sheet substream is not a worksheet"
                );
            }

            let drawing: Vec<u8> = sheet_stream
                .records
                .iter()
                .filter(|(kind, _)| *kind == biff_record::MSODRAWING)
                .flat_map(|(_, payload)| payload.iter().copied())
                .collect();
            if !drawing.is_empty() {
                drawings.insert(read_drawing(&drawing, id, &pictures)?);
            }

            sheets.push(sheet);
        }

        debug!(
            sheets = sheets.len(),
            pictures = pictures.len(),
            drawings = drawings.len(),
            "read workbook stream"
        );
        Ok(Workbook::from_parts(sheets, pictures, drawings))
    }

    /// Read the substream starting with the BOF record at `offset`.
    fn substream(&self, offset: usize) -> Result<Substream> {
        let mut records = RecordIter::at(self.data, offset);
        let bof = records.expect_next()?;
        if bof.record_type != biff_record::BOF {
            return Err(Error::Codec(format!(
                "Expected BOF at offset {}, found record 0x{:04X}",
                offset, bof.record_type
            )));
        }
        let kind = biff::parse_bof(bof.data)?;

        let mut collected = Vec::new();
        loop {
            let (record_type, payload) = records
                .next_joined()
                .unwrap_or_else(|| Err(Error::Codec("Substream is missing its EOF".into())))?;
            match record_type {
                biff_record::EOF => break,
                biff_record::BOF => {
                    return Err(Error::Codec(format!(
                        "Nested BOF in substream starting at offset {}",
                        offset
                    )));
                },
                _ => collected.push((record_type, payload)),
            }
        }

        Ok(Substream {
            kind,
            records: collected,
        })
    }
}

/// Rebuild the picture store from an OfficeArtDggContainer.
fn read_drawing_group(data: &[u8]) -> Result<PictureStore> {
    let dgg = EscherContainer::parse_as(data, EscherRecordType::DggContainer)?;
    dgg.find_child(EscherRecordType::Dgg)?
        .ok_or_else(|| Error::Codec("Drawing group has no Dgg atom".into()))?;

    let mut pictures = Vec::new();
    if let Some(bstore) = dgg.find_child(EscherRecordType::BStoreContainer)? {
        let bstore = EscherContainer::new(bstore)?;
        for (position, entry) in bstore.children().enumerate() {
            let entry = entry?;
            let (_, blip) = read_bse(&entry)?;
            let index = u32::try_from(position + 1)
                .ok()
                .and_then(PictureId::new)
                .ok_or_else(|| Error::Codec("Too many pictures".into()))?;
            trace!(index = index.get(), picture_type = ?blip.picture_type, "read picture");
            pictures.push(PictureData::with_uid(
                index,
                blip.picture_type,
                blip.uid,
                blip.data,
            ));
        }
    }

    PictureStore::from_pictures(pictures)
}

/// Rebuild one sheet's patriarch from its OfficeArtDgContainer.
fn read_drawing(data: &[u8], sheet: SheetId, store: &PictureStore) -> Result<Patriarch> {
    let dg = EscherContainer::parse_as(data, EscherRecordType::DgContainer)?;
    dg.find_child(EscherRecordType::Dg)?
        .ok_or_else(|| Error::Codec("Drawing has no Dg atom".into()))?;
    let group = dg
        .find_child(EscherRecordType::SpgrContainer)?
        .ok_or_else(|| Error::Codec("Drawing has no shape group".into()))?;
    let group = EscherContainer::new(group)?;

    let mut patriarch = Patriarch::new(sheet);
    let mut saw_patriarch = false;
    for child in group.children() {
        let child = child?;
        match child.record_type {
            EscherRecordType::SpContainer => {
                let shape = EscherContainer::new(child)?;
                let (kind, flags) = read_sp(&shape)?;

                if flags.contains(ShapeFlags::PATRIARCH) {
                    if saw_patriarch {
                        return Err(Error::Codec("Drawing has two patriarch shapes".into()));
                    }
                    saw_patriarch = true;
                } else if kind == shape_type::PICTURE_FRAME {
                    patriarch.push_picture(read_picture(&shape, sheet, store)?);
                } else {
                    warn!(%sheet, shape_type = kind, "skipping unsupported shape");
                }
            },
            EscherRecordType::SpgrContainer => {
                warn!(%sheet, "skipping nested shape group");
            },
            _ => {
                warn!(%sheet, record_type = child.record_type_raw, "skipping unknown drawing record");
            },
        }
    }

    if !saw_patriarch {
        return Err(Error::Codec("Drawing has no patriarch shape".into()));
    }
    debug!(%sheet, shapes = patriarch.len(), "read drawing");
    Ok(patriarch)
}

/// Shape type and flags from the Sp atom of a shape container.
fn read_sp(shape: &EscherContainer<'_>) -> Result<(u16, ShapeFlags)> {
    let sp = shape
        .find_child(EscherRecordType::Sp)?
        .ok_or_else(|| Error::Codec("Shape container has no Sp atom".into()))?;
    let flags = read_u32_le(sp.data, 4)?;
    Ok((sp.instance, ShapeFlags::from_bits_retain(flags)))
}

fn read_picture(shape: &EscherContainer<'_>, sheet: SheetId, store: &PictureStore) -> Result<Picture> {
    let opt = shape
        .find_child(EscherRecordType::Opt)?
        .ok_or_else(|| Error::Codec("Picture frame has no properties".into()))?;
    let raw_index = read_blip_property(&opt)?
        .ok_or_else(|| Error::Codec("Picture frame has no picture reference".into()))?;
    let index = PictureId::new(raw_index)
        .filter(|&index| store.contains(index))
        .ok_or_else(|| {
            Error::Codec(format!(
                "Picture frame references missing picture {}",
                raw_index
            ))
        })?;

    let anchor = shape
        .find_child(EscherRecordType::ClientAnchor)?
        .ok_or_else(|| Error::Codec("Picture frame has no anchor".into()))?;
    let anchor = ClientAnchor::parse(anchor.data)?;

    Ok(Picture::new(anchor, index, sheet))
}

/// Value of the `pib` property in an Opt record, if present.
///
/// Simple properties (6 bytes each) come first; complex data, if any,
/// trails them and is skipped.
fn read_blip_property(opt: &EscherRecord<'_>) -> Result<Option<u32>> {
    for n in 0..opt.instance as usize {
        let offset = n * 6;
        let id = read_u16_le(opt.data, offset)?;
        let value = read_u32_le(opt.data, offset + 2)?;
        if id & prop_id::ID_MASK == prop_id::BLIP_TO_DISPLAY {
            return Ok(Some(value));
        }
    }
    Ok(None)
}
