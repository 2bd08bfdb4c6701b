// BlipStoreEntry (BSE) records
//
// BSE records are the children of the Blip Store Container (BStoreContainer)
// in the drawing group. Each one describes a picture (type, UID, size,
// reference count) and, in a workbook stream, embeds the BLIP record itself.
// The 1-based position of a BSE inside the container is the picture index
// that shapes reference through their `pib` property.
//
// References:
// - [MS-ODRAW] 2.2.20: OfficeArtBStoreContainer
// - [MS-ODRAW] 2.2.32: OfficeArtFBSE

use super::blip::{self, BlipUid, DecodedBlip, PictureType};
use crate::common::error::{Error, Result};
use crate::ole::escher::{EscherRecord, EscherRecordType, record_type, write_record_header};
use std::io::Write;
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::*;

/// BLIP store entry (FBSE) - MS-ODRAW 2.2.32
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BlipStoreEntry {
    /// BLIP type (win32)
    pub bt_win32: u8,
    /// BLIP type (mac)
    pub bt_mac: u8,
    /// UID of the BLIP data
    pub uid: BlipUid,
    /// Tag
    pub tag: u16,
    /// Size of the BLIP record, header included
    pub size: u32,
    /// Number of shapes referencing this picture
    pub ref_count: u32,
    /// Offset in delay stream (0 if embedded)
    pub delay_offset: u32,
    /// Usage (0=default)
    pub usage: u8,
    /// Length of name (0 for unnamed)
    pub name_len: u8,
    /// Unused bytes
    pub unused: [u8; 2],
}

impl BlipStoreEntry {
    /// Size of FBSE structure
    pub const SIZE: usize = 36;

    /// Create a new BLIP store entry
    pub fn new(picture_type: PictureType, uid: BlipUid, blip_size: u32, ref_count: u32) -> Self {
        Self {
            bt_win32: picture_type.code(),
            bt_mac: mac_blip_type(picture_type),
            uid,
            tag: 0xFF,
            size: blip_size,
            ref_count,
            delay_offset: 0,
            usage: 0,
            name_len: 0,
            unused: [0; 2],
        }
    }
}

/// Mac-side BLIP type: PICT for metafiles, the same type for bitmaps.
const fn mac_blip_type(picture_type: PictureType) -> u8 {
    if picture_type.is_metafile() {
        PictureType::Pict.code()
    } else {
        picture_type.code()
    }
}

/// Write a BSE record with its BLIP embedded.
pub fn write_bse<W: Write>(
    writer: &mut W,
    picture_type: PictureType,
    uid: &BlipUid,
    data: &[u8],
    ref_count: u32,
    compress_metafile: bool,
) -> Result<()> {
    let mut blip_record = Vec::with_capacity(blip::encoded_len(picture_type, data.len()));
    blip::write_blip(&mut blip_record, picture_type, uid, data, compress_metafile)?;

    let entry = BlipStoreEntry::new(picture_type, *uid, blip_record.len() as u32, ref_count);
    let length = BlipStoreEntry::SIZE + blip_record.len();
    write_record_header(
        writer,
        0x02,
        picture_type.code() as u16,
        record_type::BSE,
        length as u32,
    )?;
    writer.write_all(entry.as_bytes())?;
    writer.write_all(&blip_record)?;
    Ok(())
}

/// Parse a BSE record and decode its embedded BLIP.
///
/// Entries whose BLIP lives in a delay stream (or that are empty
/// placeholders) cannot be rebuilt from a workbook stream and are rejected.
pub fn read_bse(record: &EscherRecord<'_>) -> Result<(BlipStoreEntry, DecodedBlip)> {
    if record.record_type != EscherRecordType::BSE {
        return Err(Error::Codec(format!(
            "Expected BSE record, found 0x{:04X}",
            record.record_type_raw
        )));
    }

    let (entry, rest) = BlipStoreEntry::read_from_prefix(record.data)
        .map_err(|_| Error::Codec("Insufficient data for BSE record".into()))?;

    if entry.size == 0 || entry.delay_offset != 0 {
        return Err(Error::Codec(
            "BSE entry does not embed its picture data".into(),
        ));
    }

    // The optional name precedes the embedded BLIP.
    let blip_start = entry.name_len as usize;
    let (blip_record, _) = EscherRecord::parse(rest, blip_start)?;
    let decoded = blip::read_blip(&blip_record)?;

    let bt_win32 = entry.bt_win32;
    if decoded.picture_type.code() != bt_win32 {
        return Err(Error::Codec(format!(
            "BSE type 0x{:02X} does not match embedded {:?} BLIP",
            bt_win32, decoded.picture_type
        )));
    }

    Ok((entry, decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_size() {
        assert_eq!(std::mem::size_of::<BlipStoreEntry>(), BlipStoreEntry::SIZE);
    }

    #[test]
    fn test_write_and_read_bse() {
        let mut buf = Vec::new();
        write_bse(&mut buf, PictureType::Jpeg, &[3u8; 16], &[4, 5, 6], 2, true).unwrap();

        let (record, consumed) = EscherRecord::parse(&buf, 0).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(record.instance, PictureType::Jpeg.code() as u16);

        let (entry, blip) = read_bse(&record).unwrap();
        let ref_count = entry.ref_count;
        let size = entry.size;
        assert_eq!(ref_count, 2);
        assert_eq!(size as usize, blip::encoded_len(PictureType::Jpeg, 3));
        assert_eq!(blip.picture_type, PictureType::Jpeg);
        assert_eq!(blip.data, vec![4, 5, 6]);
    }

    #[test]
    fn test_metafile_entry_uses_pict_on_mac() {
        let entry = BlipStoreEntry::new(PictureType::Emf, [0; 16], 10, 1);
        let (win32, mac) = (entry.bt_win32, entry.bt_mac);
        assert_eq!(win32, 0x02);
        assert_eq!(mac, 0x04);
    }

    #[test]
    fn test_delay_loaded_entry_is_rejected() {
        let mut entry = BlipStoreEntry::new(PictureType::Png, [0; 16], 25, 1);
        entry.delay_offset = 128;
        let mut buf = Vec::new();
        write_record_header(&mut buf, 2, 6, record_type::BSE, 36).unwrap();
        buf.extend_from_slice(entry.as_bytes());

        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        assert!(matches!(read_bse(&record), Err(Error::Codec(_))));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let mut blip_record = Vec::new();
        blip::write_blip(&mut blip_record, PictureType::Png, &[0; 16], &[1], false).unwrap();
        let entry = BlipStoreEntry::new(PictureType::Jpeg, [0; 16], blip_record.len() as u32, 1);

        let mut buf = Vec::new();
        write_record_header(
            &mut buf,
            2,
            5,
            record_type::BSE,
            (BlipStoreEntry::SIZE + blip_record.len()) as u32,
        )
        .unwrap();
        buf.extend_from_slice(entry.as_bytes());
        buf.extend_from_slice(&blip_record);

        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        assert!(read_bse(&record).is_err());
    }
}
