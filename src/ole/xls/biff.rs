//! BIFF8 record plumbing.
//!
//! Each BIFF record consists of:
//! - Record type (2 bytes)
//! - Record length (2 bytes), at most [`MAX_RECORD_DATA`]
//! - Record data
//!
//! Payloads longer than one record are split across the leading record and
//! any number of CONTINUE records. Readers join them back before parsing.
//!
//! # References
//!
//! - [MS-XLS] 2.1.4: Record
//! - [MS-XLS] 2.4.21: BOF, 2.4.28: BoundSheet8, 2.4.58: Continue

use crate::common::binary::{self, read_u8, read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};
use std::io::Write;
use tracing::trace;

/// Largest data length a single BIFF8 record may carry.
pub const MAX_RECORD_DATA: usize = 8224;

/// Size of a BIFF record header.
pub const RECORD_HEADER_SIZE: usize = 4;

/// BIFF record types used by the drawing layer.
pub mod record_type {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const BOUNDSHEET: u16 = 0x0085;
    pub const CONTINUE: u16 = 0x003C;
    pub const MSODRAWINGGROUP: u16 = 0x00EB;
    pub const MSODRAWING: u16 = 0x00EC;
}

/// Substream kinds carried in the BOF `dt` field.
pub mod substream {
    pub const GLOBALS: u16 = 0x0005;
    pub const WORKSHEET: u16 = 0x0010;
}

const BIFF8_VERSION: u16 = 0x0600;
const BUILD_ID: u16 = 0x0DBB;
const BUILD_YEAR: u16 = 0x07CC;
const BOF_DATA_SIZE: usize = 16;

/// Maximum sheet name length in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

// =============================================================================
// Writing
// =============================================================================

/// Write a BIFF record header.
#[inline]
pub fn write_record_header<W: Write>(writer: &mut W, record_type: u16, data_len: u16) -> Result<()> {
    writer.write_all(&record_type.to_le_bytes())?;
    writer.write_all(&data_len.to_le_bytes())?;
    Ok(())
}

/// Write a record that fits in a single BIFF record.
pub fn write_record<W: Write>(writer: &mut W, record_type: u16, data: &[u8]) -> Result<()> {
    let len = u16::try_from(data.len())
        .ok()
        .filter(|&len| len as usize <= MAX_RECORD_DATA)
        .ok_or_else(|| {
            Error::Codec(format!(
                "Record 0x{:04X} data of {} bytes does not fit in one record",
                record_type,
                data.len()
            ))
        })?;
    write_record_header(writer, record_type, len)?;
    writer.write_all(data)?;
    Ok(())
}

/// Write `data` as one `record_type` record followed by as many CONTINUE
/// records as needed, each carrying at most `max_chunk` bytes.
///
/// An empty payload still produces a single, empty leading record.
pub fn write_continued<W: Write>(
    writer: &mut W,
    record_type: u16,
    data: &[u8],
    max_chunk: usize,
) -> Result<()> {
    let max_chunk = max_chunk.clamp(1, MAX_RECORD_DATA);
    let mut chunks = data.chunks(max_chunk);
    write_record(writer, record_type, chunks.next().unwrap_or(&[]))?;
    for chunk in chunks {
        write_record(writer, record_type::CONTINUE, chunk)?;
    }
    Ok(())
}

/// Write a BIFF8 BOF record for the given substream kind.
pub fn write_bof<W: Write>(writer: &mut W, substream_type: u16) -> Result<()> {
    let mut data = Vec::with_capacity(BOF_DATA_SIZE);
    data.extend_from_slice(&BIFF8_VERSION.to_le_bytes());
    data.extend_from_slice(&substream_type.to_le_bytes());
    data.extend_from_slice(&BUILD_ID.to_le_bytes());
    data.extend_from_slice(&BUILD_YEAR.to_le_bytes());
    // file history flags
    data.extend_from_slice(&0u32.to_le_bytes());
    // lowest BIFF version able to read the file
    data.extend_from_slice(&(BIFF8_VERSION as u32).to_le_bytes());
    write_record(writer, record_type::BOF, &data)
}

/// Write an EOF record.
pub fn write_eof<W: Write>(writer: &mut W) -> Result<()> {
    write_record(writer, record_type::EOF, &[])
}

fn has_multibyte_char(s: &str) -> bool {
    s.chars().any(|c| c as u32 > 0xFF)
}

/// Encode a ShortXLUnicodeString: `cch` (u8), `fHighByte` (u8), characters.
fn short_unicode_string(value: &str) -> Result<Vec<u8>> {
    let is_16bit = has_multibyte_char(value);
    let units: Vec<u16> = value.encode_utf16().collect();
    let cch = u8::try_from(units.len())
        .map_err(|_| Error::Codec(format!("String too long for a short string: {}", value)))?;

    let mut out = Vec::with_capacity(2 + units.len() * 2);
    out.push(cch);
    out.push(if is_16bit { 0x01 } else { 0x00 });
    if is_16bit {
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    } else {
        out.extend(value.chars().map(|c| c as u8));
    }
    Ok(out)
}

fn parse_short_unicode_string(data: &[u8], offset: usize) -> Result<String> {
    let cch = read_u8(data, offset)? as usize;
    let flags = read_u8(data, offset + 1)?;
    let name = if flags & 0x01 != 0 {
        binary::parse_utf16le_string_len(data, offset + 2, cch)?
    } else {
        binary::parse_latin1_string_len(data, offset + 2, cch)?
    };
    Ok(name)
}

/// BoundSheet8 record: where a sheet substream starts and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSheetRecord {
    /// Absolute stream offset of the sheet's BOF record
    pub position: u32,
    /// Visibility (`hsState`); 0 is visible
    pub visibility: u8,
    /// Sheet type (`dt`); 0 is a worksheet
    pub sheet_type: u8,
    /// Sheet name
    pub name: String,
}

impl BoundSheetRecord {
    /// A visible worksheet entry.
    pub fn worksheet(position: u32, name: impl Into<String>) -> Self {
        Self {
            position,
            visibility: 0,
            sheet_type: 0,
            name: name.into(),
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(8 + self.name.len() * 2);
        data.extend_from_slice(&self.position.to_le_bytes());
        data.push(self.visibility);
        data.push(self.sheet_type);
        data.extend_from_slice(&short_unicode_string(&self.name)?);
        Ok(data)
    }

    /// Write the record.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_record(writer, record_type::BOUNDSHEET, &self.encode()?)
    }

    /// Parse the record body.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self {
            position: read_u32_le(data, 0)?,
            visibility: read_u8(data, 4)? & 0x03,
            sheet_type: read_u8(data, 5)?,
            name: parse_short_unicode_string(data, 6)?,
        })
    }
}

/// Parse a BOF record body and return its substream kind.
pub fn parse_bof(data: &[u8]) -> Result<u16> {
    let version = read_u16_le(data, 0)?;
    if version != BIFF8_VERSION {
        return Err(Error::Codec(format!(
            "Unsupported BIFF version 0x{:04X}",
            version
        )));
    }
    Ok(read_u16_le(data, 2)?)
}

// =============================================================================
// Reading
// =============================================================================

/// A BIFF record borrowed from the stream.
#[derive(Debug, Clone, Copy)]
pub struct Record<'data> {
    /// Stream offset of the record header
    pub offset: usize,
    /// Record type
    pub record_type: u16,
    /// Record data
    pub data: &'data [u8],
}

/// Iterator over the BIFF records of an in-memory stream.
///
/// Yields an error (and then stops) when a record header or body runs past
/// the end of the stream.
pub struct RecordIter<'data> {
    data: &'data [u8],
    offset: usize,
    failed: bool,
}

impl<'data> RecordIter<'data> {
    /// Iterate from the start of the stream.
    pub fn new(data: &'data [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Iterate from an absolute offset.
    pub fn at(data: &'data [u8], offset: usize) -> Self {
        Self {
            data,
            offset,
            failed: false,
        }
    }

    /// Next record, failing at end of stream.
    pub fn expect_next(&mut self) -> Result<Record<'data>> {
        self.next()
            .unwrap_or_else(|| Err(Error::Codec("Unexpected end of stream".into())))
    }

    /// Read the record at the current position and, if it is followed by
    /// CONTINUE records, append their data. Returns the leading record type
    /// and the joined payload.
    pub fn next_joined(&mut self) -> Option<Result<(u16, Vec<u8>)>> {
        let first = match self.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };
        let mut payload = first.data.to_vec();
        while self.peek_type() == Some(record_type::CONTINUE) {
            match self.next() {
                Some(Ok(record)) => payload.extend_from_slice(record.data),
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }
        Some(Ok((first.record_type, payload)))
    }

    fn peek_type(&self) -> Option<u16> {
        read_u16_le(self.data, self.offset).ok()
    }

    fn read_record(&mut self) -> Result<Record<'data>> {
        let offset = self.offset;
        let record_type = read_u16_le(self.data, offset)?;
        let len = read_u16_le(self.data, offset + 2)? as usize;
        let data = binary::read_bytes(self.data, offset + RECORD_HEADER_SIZE, len)?;
        trace!(offset, record_type, len, "read BIFF record");
        self.offset = offset + RECORD_HEADER_SIZE + len;
        Ok(Record {
            offset,
            record_type,
            data,
        })
    }
}

impl<'data> Iterator for RecordIter<'data> {
    type Item = Result<Record<'data>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        let result = self.read_record();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_record_header() {
        let mut buf = Vec::new();
        write_record_header(&mut buf, record_type::BOF, 16).unwrap();
        assert_eq!(buf, vec![0x09, 0x08, 0x10, 0x00]);
    }

    #[test]
    fn test_bof_round_trip() {
        let mut buf = Vec::new();
        write_bof(&mut buf, substream::WORKSHEET).unwrap();
        assert_eq!(buf.len(), RECORD_HEADER_SIZE + 16);

        let record = RecordIter::new(&buf).next().unwrap().unwrap();
        assert_eq!(record.record_type, record_type::BOF);
        assert_eq!(parse_bof(record.data).unwrap(), substream::WORKSHEET);
    }

    #[test]
    fn test_bof_rejects_old_versions() {
        let data = [0x00, 0x05, 0x05, 0x00];
        assert!(matches!(parse_bof(&data), Err(Error::Codec(_))));
    }

    #[test]
    fn test_boundsheet_latin1() {
        let record = BoundSheetRecord::worksheet(1234, "Données");
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        // 8 fixed bytes + 7 single-byte characters
        assert_eq!(buf.len(), RECORD_HEADER_SIZE + 8 + 7);

        let parsed = BoundSheetRecord::parse(&buf[RECORD_HEADER_SIZE..]).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_boundsheet_utf16() {
        let record = BoundSheetRecord::worksheet(42, "表格一");
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        assert_eq!(buf[RECORD_HEADER_SIZE + 6], 3);
        assert_eq!(buf[RECORD_HEADER_SIZE + 7], 0x01);

        let parsed = BoundSheetRecord::parse(&buf[RECORD_HEADER_SIZE..]).unwrap();
        assert_eq!(parsed.name, "表格一");
        assert_eq!(parsed.position, 42);
    }

    #[test]
    fn test_continue_split_and_join() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut buf = Vec::new();
        write_continued(&mut buf, record_type::MSODRAWING, &payload, 300).unwrap();
        write_eof(&mut buf).unwrap();
        // four records of at most 300 bytes, then EOF
        assert_eq!(buf.len(), 4 * RECORD_HEADER_SIZE + 1000 + RECORD_HEADER_SIZE);

        let types: Vec<u16> = RecordIter::new(&buf)
            .map(|r| r.unwrap().record_type)
            .collect();
        assert_eq!(
            types,
            vec![
                record_type::MSODRAWING,
                record_type::CONTINUE,
                record_type::CONTINUE,
                record_type::CONTINUE,
                record_type::EOF
            ]
        );

        let mut iter = RecordIter::new(&buf);
        let (kind, joined) = iter.next_joined().unwrap().unwrap();
        assert_eq!(kind, record_type::MSODRAWING);
        assert_eq!(joined, payload);
        assert_eq!(iter.next().unwrap().unwrap().record_type, record_type::EOF);
    }

    #[test]
    fn test_empty_payload_writes_one_record() {
        let mut buf = Vec::new();
        write_continued(&mut buf, record_type::MSODRAWING, &[], MAX_RECORD_DATA).unwrap();
        assert_eq!(buf.len(), RECORD_HEADER_SIZE);
    }

    #[test]
    fn test_oversized_record_is_rejected() {
        let mut buf = Vec::new();
        let data = vec![0u8; MAX_RECORD_DATA + 1];
        assert!(write_record(&mut buf, record_type::MSODRAWING, &data).is_err());
    }

    #[test]
    fn test_truncated_record() {
        let buf = [0x09, 0x08, 0x10, 0x00, 0x00, 0x06];
        let mut iter = RecordIter::new(&buf);
        assert!(matches!(iter.next(), Some(Err(Error::Codec(_)))));
        assert!(iter.next().is_none());
    }
}
