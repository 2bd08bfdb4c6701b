//! Binary data parsing utilities shared by the BIFF and Escher codecs.
//!
//! This module provides bounds-checked little-endian readers and the two string
//! encodings used by BIFF8 record payloads (compressed Latin-1 and UTF-16LE).

use zerocopy::{FromBytes, I32, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    ParseError(String),
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data: expected {}, got {}",
                    expected, available
                )
            },
            BinaryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn check_len(data: &[u8], offset: usize, size: usize) -> BinaryResult<()> {
    match offset.checked_add(size) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(BinaryError::InsufficientData {
            expected: offset.saturating_add(size),
            available: data.len(),
        }),
    }
}

/// Read a single byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> BinaryResult<u8> {
    check_len(data, offset, 1)?;
    Ok(data[offset])
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use officeart::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    check_len(data, offset, 2)?;
    U16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use officeart::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    check_len(data, offset, 4)?;
    U32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

/// Read a little-endian i32 from a byte slice at the given offset.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    check_len(data, offset, 4)?;
    I32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i32".to_string()))
}

/// Borrow `len` bytes starting at `offset`.
#[inline]
pub fn read_bytes(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    check_len(data, offset, len)?;
    Ok(&data[offset..offset + len])
}

/// Parse `char_count` UTF-16LE code units starting at `offset`.
///
/// Unpaired surrogates are rejected rather than replaced, since BIFF sheet
/// names must survive a round trip unchanged.
pub fn parse_utf16le_string_len(
    data: &[u8],
    offset: usize,
    char_count: usize,
) -> BinaryResult<String> {
    let bytes = read_bytes(data, offset, char_count * 2)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|_| BinaryError::ParseError("Invalid UTF-16 string".to_string()))
}

/// Parse a compressed (8-bit, Latin-1) BIFF string of `length` bytes.
pub fn parse_latin1_string_len(data: &[u8], offset: usize, length: usize) -> BinaryResult<String> {
    let bytes = read_bytes(data, offset, length)?;
    Ok(bytes.iter().map(|&b| b as char).collect())
}
