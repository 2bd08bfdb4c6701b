// BLIP (Binary Large Image or Picture) types and record encoding
//
// Pictures registered with a workbook are written as OfficeArtBlip records
// inside the drawing group's BStoreContainer. Bitmap formats (JPEG, PNG, DIB,
// TIFF) are stored verbatim behind a UID and a tag byte; metafile formats
// (EMF, WMF, PICT) carry a 34-byte header and are usually deflate-compressed.
//
// References:
// - [MS-ODRAW] 2.2.23: OfficeArtBlip records
// - [MS-ODRAW] 2.4.1: MSOBLIPTYPE

use crate::common::binary::{read_bytes, read_u8, read_u32_le};
use crate::common::error::{Error, Result};
use crate::ole::escher::{EscherRecord, write_record_header};
use std::io::{Read, Write};

/// UID for BLIP records (16 bytes)
pub type BlipUid = [u8; 16];

/// Tag byte written after the UID of bitmap BLIPs
const BITMAP_TAG: u8 = 0xFF;
/// Metafile compression: deflate
const COMPRESSION_DEFLATE: u8 = 0x00;
/// Metafile compression: none / filter: none
const COMPRESSION_NONE: u8 = 0xFE;
/// Size of the metafile header that follows the UID(s)
const METAFILE_HEADER_SIZE: usize = 34;
/// Upper bound on the buffer reserved from an untrusted size field
const MAX_PREALLOCATION: usize = 1 << 20;
/// Instance of CMYK JPEG BLIPs (single UID)
const JPEG_CMYK_INSTANCE: u16 = 0x6E2;

/// Picture formats a workbook can store.
///
/// Discriminants are the MSOBLIPTYPE values written into BSE records, which
/// are also the picture-type codes accepted by [`PictureType::from_code`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureType {
    /// Enhanced Metafile (EMF)
    Emf = 0x02,
    /// Windows Metafile (WMF)
    Wmf = 0x03,
    /// Macintosh PICT
    Pict = 0x04,
    /// JPEG image
    Jpeg = 0x05,
    /// PNG image
    Png = 0x06,
    /// Device Independent Bitmap (DIB)
    Dib = 0x07,
    /// TIFF image
    Tiff = 0x11,
}

impl PictureType {
    /// All supported picture types.
    pub const ALL: [PictureType; 7] = [
        Self::Emf,
        Self::Wmf,
        Self::Pict,
        Self::Jpeg,
        Self::Png,
        Self::Dib,
        Self::Tiff,
    ];

    /// Map a picture-type code (MSOBLIPTYPE) to a supported type.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| *t as u32 == code)
    }

    /// The MSOBLIPTYPE code of this type.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parse the type from a BLIP record type id.
    pub fn from_record_id(record_id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.escher_type() == record_id)
    }

    /// Get the Escher record type for this BLIP
    pub const fn escher_type(self) -> u16 {
        match self {
            Self::Emf => 0xF01A,
            Self::Wmf => 0xF01B,
            Self::Pict => 0xF01C,
            Self::Jpeg => 0xF01D,
            Self::Png => 0xF01E,
            Self::Dib => 0xF01F,
            Self::Tiff => 0xF029,
        }
    }

    /// Get the instance value for the BLIP record header (single UID)
    pub const fn instance(self) -> u16 {
        match self {
            Self::Emf => 0x3D4,
            Self::Wmf => 0x216,
            Self::Pict => 0x542,
            Self::Jpeg => 0x46A,
            Self::Png => 0x6E0,
            Self::Dib => 0x7A8,
            Self::Tiff => 0x6E4,
        }
    }

    /// Whether a BLIP record with `instance` carries a second UID, or `None`
    /// if the instance does not belong to this type.
    ///
    /// JPEG also has a CMYK variant at 0x6E2/0x6E3.
    fn has_secondary_uid(self, instance: u16) -> Option<bool> {
        let base = if self == Self::Jpeg && instance & !1 == JPEG_CMYK_INSTANCE {
            JPEG_CMYK_INSTANCE
        } else {
            self.instance()
        };
        match instance ^ base {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    /// Check if this is a metafile format (EMF, WMF, PICT)
    pub const fn is_metafile(self) -> bool {
        matches!(self, Self::Emf | Self::Wmf | Self::Pict)
    }

    /// Get the file extension for this type
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Emf => "emf",
            Self::Wmf => "wmf",
            Self::Pict => "pict",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Dib => "dib",
            Self::Tiff => "tiff",
        }
    }

    /// Get the MIME type for this type
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Emf => "image/x-emf",
            Self::Wmf => "image/x-wmf",
            Self::Pict => "image/x-pict",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Dib => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }

    /// Detect the type from image magic bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // BMP file header or a bare BITMAPINFOHEADER
        if data.starts_with(b"BM") || data.starts_with(&[0x28, 0x00, 0x00, 0x00]) {
            return Some(Self::Dib);
        }

        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(Self::Tiff);
        }

        // EMR_HEADER record with the " EMF" signature at offset 40
        if data.len() >= 44 && data.starts_with(&[0x01, 0x00, 0x00, 0x00]) && data[40..44] == *b" EMF"
        {
            return Some(Self::Emf);
        }

        // Placeable or standard WMF header
        if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) || data.starts_with(&[0x01, 0x00, 0x09, 0x00])
        {
            return Some(Self::Wmf);
        }

        None
    }
}

/// A BLIP decoded back into its picture payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlip {
    pub picture_type: PictureType,
    pub uid: BlipUid,
    pub data: Vec<u8>,
}

/// Size of the encoded BLIP record for `payload`, header included.
pub fn encoded_len(picture_type: PictureType, payload_len: usize) -> usize {
    let body = if picture_type.is_metafile() {
        16 + METAFILE_HEADER_SIZE
    } else {
        16 + 1
    };
    8 + body + payload_len
}

/// Write a BLIP record.
///
/// Bitmaps are written verbatim. Metafiles are zlib-compressed when
/// `compress_metafile` is set and compression actually shrinks them.
pub fn write_blip<W: Write>(
    writer: &mut W,
    picture_type: PictureType,
    uid: &BlipUid,
    data: &[u8],
    compress_metafile: bool,
) -> Result<()> {
    let record_type = picture_type.escher_type();
    let instance = picture_type.instance();

    if !picture_type.is_metafile() {
        let length = 16 + 1 + data.len();
        write_record_header(writer, 0x00, instance, record_type, length as u32)?;
        writer.write_all(uid)?;
        writer.write_all(&[BITMAP_TAG])?;
        writer.write_all(data)?;
        return Ok(());
    }

    let compressed = if compress_metafile {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        Some(encoder.finish()?).filter(|c| c.len() < data.len())
    } else {
        None
    };
    let (stored, compression) = match &compressed {
        Some(c) => (c.as_slice(), COMPRESSION_DEFLATE),
        None => (data, COMPRESSION_NONE),
    };

    let length = 16 + METAFILE_HEADER_SIZE + stored.len();
    write_record_header(writer, 0x00, instance, record_type, length as u32)?;
    writer.write_all(uid)?;
    // cbSize: uncompressed size
    writer.write_all(&(data.len() as u32).to_le_bytes())?;
    // rcBounds: unknown, left empty
    writer.write_all(&[0u8; 16])?;
    // ptSize: unknown, left empty
    writer.write_all(&[0u8; 8])?;
    // cbSave: stored size
    writer.write_all(&(stored.len() as u32).to_le_bytes())?;
    writer.write_all(&[compression, COMPRESSION_NONE])?;
    writer.write_all(stored)?;
    Ok(())
}

/// Decode a BLIP record into its picture payload.
pub fn read_blip(record: &EscherRecord<'_>) -> Result<DecodedBlip> {
    let picture_type = PictureType::from_record_id(record.record_type_raw).ok_or_else(|| {
        Error::Codec(format!(
            "Unknown BLIP record type: 0x{:04X}",
            record.record_type_raw
        ))
    })?;

    let data = record.data;
    let mut uid = [0u8; 16];
    uid.copy_from_slice(read_bytes(data, 0, 16)?);
    let mut offset = 16;

    let secondary = picture_type
        .has_secondary_uid(record.instance)
        .ok_or_else(|| {
            Error::Codec(format!(
                "Unexpected instance 0x{:03X} for {:?} BLIP",
                record.instance, picture_type
            ))
        })?;
    if secondary {
        offset += 16;
    }

    if !picture_type.is_metafile() {
        let _tag = read_u8(data, offset)?;
        offset += 1;
        return Ok(DecodedBlip {
            picture_type,
            uid,
            data: data[offset..].to_vec(),
        });
    }

    let uncompressed_size = read_u32_le(data, offset)? as usize;
    let stored_size = read_u32_le(data, offset + 28)? as usize;
    let compression = read_u8(data, offset + 32)?;
    offset += METAFILE_HEADER_SIZE;
    let stored = read_bytes(data, offset, stored_size)?;

    let payload = if compression == COMPRESSION_DEFLATE {
        inflate(stored, uncompressed_size)?
    } else {
        stored.to_vec()
    };

    if payload.len() != uncompressed_size {
        return Err(Error::Codec(format!(
            "Metafile BLIP size mismatch: header says {}, got {}",
            uncompressed_size,
            payload.len()
        )));
    }

    Ok(DecodedBlip {
        picture_type,
        uid,
        data: payload,
    })
}

/// Inflate at most `expected + 1` bytes, so an oversized stream shows up as a
/// size mismatch without being decompressed in full.
fn inflate(stored: &[u8], expected: usize) -> Result<Vec<u8>> {
    // MS-ODRAW specifies DEFLATE with a ZLIB wrapper; accept raw streams too.
    let mut out = Vec::with_capacity(expected.min(MAX_PREALLOCATION));
    let limit = expected as u64 + 1;
    let result = if stored.first() == Some(&0x78) {
        flate2::read::ZlibDecoder::new(stored)
            .take(limit)
            .read_to_end(&mut out)
    } else {
        flate2::read::DeflateDecoder::new(stored)
            .take(limit)
            .read_to_end(&mut out)
    };
    result.map_err(|e| Error::Codec(format!("Metafile decompression failed: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(picture_type: PictureType, data: &[u8], compress: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        write_blip(&mut buf, picture_type, &[7u8; 16], data, compress).unwrap();
        buf
    }

    #[test]
    fn test_picture_type_codes() {
        assert_eq!(PictureType::from_code(5), Some(PictureType::Jpeg));
        assert_eq!(PictureType::from_code(6), Some(PictureType::Png));
        assert_eq!(PictureType::from_code(0x11), Some(PictureType::Tiff));
        assert_eq!(PictureType::from_code(0), None);
        assert_eq!(PictureType::from_code(1), None);
        assert_eq!(PictureType::from_code(99), None);
        assert_eq!(PictureType::from_record_id(0xF01E), Some(PictureType::Png));
        assert_eq!(PictureType::from_record_id(0xF018), None);
    }

    #[test]
    fn test_picture_type_metadata() {
        assert!(PictureType::Emf.is_metafile());
        assert!(!PictureType::Jpeg.is_metafile());
        assert_eq!(PictureType::Png.extension(), "png");
        assert_eq!(PictureType::Jpeg.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_detect() {
        assert_eq!(
            PictureType::detect(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]),
            Some(PictureType::Jpeg)
        );
        assert_eq!(
            PictureType::detect(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some(PictureType::Png)
        );
        assert_eq!(PictureType::detect(b"BM\0\0"), Some(PictureType::Dib));
        assert_eq!(
            PictureType::detect(&[0xD7, 0xCD, 0xC6, 0x9A, 0, 0]),
            Some(PictureType::Wmf)
        );
        assert_eq!(PictureType::detect(&[1, 2, 3]), None);
    }

    #[test]
    fn test_bitmap_blip_layout() {
        let buf = encode(PictureType::Png, &[1, 2, 3], true);
        assert_eq!(buf.len(), encoded_len(PictureType::Png, 3));
        assert_eq!(u16::from_le_bytes([buf[2], buf[3]]), 0xF01E);
        assert_eq!(u16::from_le_bytes([buf[0], buf[1]]) >> 4, 0x6E0);
        assert_eq!(buf[24], 0xFF);
        assert_eq!(&buf[25..], &[1, 2, 3]);

        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        let decoded = read_blip(&record).unwrap();
        assert_eq!(decoded.picture_type, PictureType::Png);
        assert_eq!(decoded.uid, [7u8; 16]);
        assert_eq!(decoded.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_metafile_blip_is_compressed() {
        let payload = vec![0x42u8; 4096];
        let buf = encode(PictureType::Emf, &payload, true);
        assert!(buf.len() < payload.len());

        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        let decoded = read_blip(&record).unwrap();
        assert_eq!(decoded.picture_type, PictureType::Emf);
        assert_eq!(decoded.data, payload);
    }

    #[test]
    fn test_metafile_blip_uncompressed() {
        let payload = vec![1u8, 2, 3, 4];
        let buf = encode(PictureType::Wmf, &payload, false);
        assert_eq!(buf.len(), encoded_len(PictureType::Wmf, payload.len()));
        // compression byte sits after header(8) + uid(16) + 32 bytes
        assert_eq!(buf[8 + 16 + 32], COMPRESSION_NONE);

        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        assert_eq!(read_blip(&record).unwrap().data, payload);
    }

    #[test]
    fn test_secondary_uid_is_skipped() {
        let mut buf = Vec::new();
        write_record_header(&mut buf, 0, 0x46B, 0xF01D, 16 + 16 + 1 + 2).unwrap();
        buf.extend_from_slice(&[1u8; 16]);
        buf.extend_from_slice(&[2u8; 16]);
        buf.push(0xFF);
        buf.extend_from_slice(&[9, 9]);

        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        let decoded = read_blip(&record).unwrap();
        assert_eq!(decoded.uid, [1u8; 16]);
        assert_eq!(decoded.data, vec![9, 9]);
    }

    #[test]
    fn test_cmyk_jpeg_instances() {
        for (instance, data_offset) in [(0x6E2u16, 16usize), (0x6E3, 32)] {
            let mut buf = Vec::new();
            write_record_header(&mut buf, 0, instance, 0xF01D, data_offset as u32 + 3).unwrap();
            buf.extend_from_slice(&[4u8; 32][..data_offset]);
            buf.extend_from_slice(&[0xFF, 1, 2]);

            let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
            let decoded = read_blip(&record).unwrap();
            assert_eq!(decoded.picture_type, PictureType::Jpeg);
            assert_eq!(decoded.data, vec![1, 2]);
        }
    }

    #[test]
    fn test_unexpected_instance() {
        let mut buf = Vec::new();
        write_record_header(&mut buf, 0, 0x6E2, 0xF01E, 17).unwrap();
        buf.extend_from_slice(&[0u8; 17]);
        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        assert!(matches!(read_blip(&record), Err(Error::Codec(_))));
    }

    #[test]
    fn test_metafile_larger_than_declared() {
        let payload = vec![0u8; 1 << 16];
        let mut buf = encode(PictureType::Emf, &payload, true);
        // cbSize follows header(8) + uid(16)
        buf[24..28].copy_from_slice(&10u32.to_le_bytes());

        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        match read_blip(&record) {
            Err(Error::Codec(msg)) => assert!(msg.contains("got 11"), "{}", msg),
            other => panic!("expected a size mismatch, got {:?}", other.map(|b| b.data.len())),
        }
    }

    #[test]
    fn test_unknown_blip_record() {
        let mut buf = Vec::new();
        write_record_header(&mut buf, 0, 0, 0xF018, 0).unwrap();
        let (record, _) = EscherRecord::parse(&buf, 0).unwrap();
        assert!(matches!(read_blip(&record), Err(Error::Codec(_))));
    }
}
