//! Container record handling with iterator-based traversal.
//!
//! Children are parsed lazily and borrow from the parent's data. Iteration
//! stops at the first malformed child, after yielding its error.

use super::record::EscherRecord;
use super::types::EscherRecordType;
use crate::common::error::{Error, Result};

/// Iterator over child records in an Escher container.
pub struct EscherChildIterator<'data> {
    data: &'data [u8],
    offset: usize,
    failed: bool,
}

impl<'data> EscherChildIterator<'data> {
    /// Create a new child iterator for a container record.
    #[inline]
    pub fn new(container_data: &'data [u8]) -> Self {
        Self {
            data: container_data,
            offset: 0,
            failed: false,
        }
    }
}

impl<'data> Iterator for EscherChildIterator<'data> {
    type Item = Result<EscherRecord<'data>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        match EscherRecord::parse(self.data, self.offset) {
            Ok((record, consumed)) => {
                self.offset += consumed;
                Some(Ok(record))
            },
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len().saturating_sub(self.offset);
        (0, Some(remaining / 8))
    }
}

/// Escher container wrapper for convenient child access.
#[derive(Debug, Clone)]
pub struct EscherContainer<'data> {
    record: EscherRecord<'data>,
}

impl<'data> EscherContainer<'data> {
    /// Wrap an Escher record as a container.
    pub fn new(record: EscherRecord<'data>) -> Result<Self> {
        if record.is_container() {
            Ok(Self { record })
        } else {
            Err(Error::Codec(format!(
                "Escher record 0x{:04X} is not a container",
                record.record_type_raw
            )))
        }
    }

    /// Parse the record at the start of `data` and wrap it as a container of
    /// the given type.
    pub fn parse_as(data: &'data [u8], record_type: EscherRecordType) -> Result<Self> {
        let (record, _) = EscherRecord::parse(data, 0)?;
        Self::new(record.expect(record_type)?)
    }

    /// Iterate over child records.
    #[inline]
    pub fn children(&self) -> EscherChildIterator<'data> {
        EscherChildIterator::new(self.record.data)
    }

    /// Collect all children, failing on the first malformed one.
    pub fn child_records(&self) -> Result<Vec<EscherRecord<'data>>> {
        self.children().collect()
    }

    /// Find the first child of a specific type.
    pub fn find_child(&self, record_type: EscherRecordType) -> Result<Option<EscherRecord<'data>>> {
        for child in self.children() {
            let child = child?;
            if child.record_type == record_type {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_iterator() {
        let data = vec![
            0x02, 0x00, 0x0A, 0xF0, 0x04, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x03, 0x00,
            0x0B, 0xF0, 0x02, 0x00, 0x00, 0x00, 0x05, 0x06,
        ];

        let records: Vec<_> = EscherChildIterator::new(&data)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, EscherRecordType::Sp);
        assert_eq!(records[1].record_type, EscherRecordType::Opt);
    }

    #[test]
    fn test_child_iterator_stops_after_error() {
        // Second child claims 0x10 bytes but only 2 remain.
        let data = vec![
            0x02, 0x00, 0x0A, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x0B, 0xF0, 0x10, 0x00,
            0x00, 0x00, 0x05, 0x06,
        ];

        let mut iter = EscherChildIterator::new(&data);
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_parse_as_checks_type() {
        let data = vec![0x0F, 0x00, 0x02, 0xF0, 0x00, 0x00, 0x00, 0x00];
        assert!(EscherContainer::parse_as(&data, EscherRecordType::DgContainer).is_ok());
        assert!(EscherContainer::parse_as(&data, EscherRecordType::DggContainer).is_err());
    }

    #[test]
    fn test_atom_is_not_a_container() {
        let data = vec![0x00, 0x00, 0x11, 0xF0, 0x00, 0x00, 0x00, 0x00];
        let (record, _) = EscherRecord::parse(&data, 0).unwrap();
        assert!(EscherContainer::new(record).is_err());
    }
}
