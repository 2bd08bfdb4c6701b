//! Escher record structure with zero-copy parsing.
//!
//! # Format
//!
//! Escher records have an 8-byte header:
//! - Bytes 0-1: Version and Instance (packed)
//! - Bytes 2-3: Record Type
//! - Bytes 4-7: Record Length (32-bit)

use super::types::EscherRecordType;
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};

/// An Escher record with zero-copy data access.
#[derive(Debug, Clone)]
pub struct EscherRecord<'data> {
    /// Record type
    pub record_type: EscherRecordType,
    /// Raw record type value
    pub record_type_raw: u16,
    /// Version (4 bits)
    pub version: u8,
    /// Instance (12 bits)
    pub instance: u16,
    /// Record data (zero-copy borrow)
    pub data: &'data [u8],
}

impl<'data> EscherRecord<'data> {
    /// Parse an Escher record from binary data at the given offset.
    ///
    /// A record whose declared length runs past the end of `data` is an
    /// error.
    ///
    /// # Returns
    ///
    /// `(record, bytes_consumed)` tuple
    pub fn parse(data: &'data [u8], offset: usize) -> Result<(Self, usize)> {
        let ver_inst = read_u16_le(data, offset)?;
        let record_type_raw = read_u16_le(data, offset + 2)?;
        let length = read_u32_le(data, offset + 4)? as usize;

        let version = (ver_inst & 0x000F) as u8;
        let instance = (ver_inst >> 4) & 0x0FFF;

        let data_start = offset + 8;
        let data_end = data_start
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                Error::Codec(format!(
                    "Escher record 0x{:04X} extends beyond bounds: offset={}, length={}, data_len={}",
                    record_type_raw,
                    offset,
                    length,
                    data.len()
                ))
            })?;

        Ok((
            Self {
                record_type: EscherRecordType::from(record_type_raw),
                record_type_raw,
                version,
                instance,
                data: &data[data_start..data_end],
            },
            8 + length,
        ))
    }

    /// Check if this is a container record (can have children).
    ///
    /// Container records have version 0xF (15).
    #[inline]
    pub fn is_container(&self) -> bool {
        self.version == 0x0F
    }

    /// Fail unless this record has the expected type.
    pub fn expect(self, record_type: EscherRecordType) -> Result<Self> {
        if self.record_type == record_type {
            Ok(self)
        } else {
            Err(Error::Codec(format!(
                "Expected Escher record {:?}, found 0x{:04X}",
                record_type, self.record_type_raw
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_record() {
        let data = vec![
            0x0F, 0x00, // version=0xF, instance=0
            0x04, 0xF0, // record type = 0xF004 (SpContainer)
            0x08, 0x00, 0x00, 0x00, // length = 8
            0x01, 0x02, 0x03, 0x04, // data
            0x05, 0x06, 0x07, 0x08,
        ];

        let (record, consumed) = EscherRecord::parse(&data, 0).unwrap();

        assert_eq!(record.version, 0x0F);
        assert_eq!(record.instance, 0);
        assert_eq!(record.record_type, EscherRecordType::SpContainer);
        assert_eq!(record.data.len(), 8);
        assert_eq!(consumed, 16);
        assert!(record.is_container());
    }

    #[test]
    fn test_parse_atom_record_with_instance() {
        let data = vec![
            0x22, 0x0A, // version=2, instance=0xA2
            0x0A, 0xF0, // record type = 0xF00A (Sp)
            0x04, 0x00, 0x00, 0x00, // length = 4
            0xAA, 0xBB, 0xCC, 0xDD,
        ];

        let (record, consumed) = EscherRecord::parse(&data, 0).unwrap();

        assert_eq!(record.version, 0x02);
        assert_eq!(record.instance, 0xA2);
        assert_eq!(record.record_type, EscherRecordType::Sp);
        assert_eq!(record.data, &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(consumed, 12);
        assert!(!record.is_container());
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let data = vec![0x0F, 0x00, 0x02, 0xF0, 0x10, 0x00, 0x00, 0x00, 0x01];
        assert!(matches!(EscherRecord::parse(&data, 0), Err(Error::Codec(_))));
        assert!(EscherRecord::parse(&data[..4], 0).is_err());
    }

    #[test]
    fn test_expect() {
        let data = vec![0x00, 0x00, 0x10, 0xF0, 0x00, 0x00, 0x00, 0x00];
        let (record, _) = EscherRecord::parse(&data, 0).unwrap();
        assert!(record.clone().expect(EscherRecordType::ClientAnchor).is_ok());
        assert!(record.expect(EscherRecordType::Sp).is_err());
    }
}
