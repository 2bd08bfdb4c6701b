//! Per-sheet drawing registry.

use super::patriarch::Patriarch;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Position of a sheet in its workbook (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SheetId(usize);

impl SheetId {
    /// Refer to the sheet at `index`.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The sheet's position in the workbook.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// At most one drawing patriarch per sheet, created on first request.
///
/// Patriarchs are kept in sheet order, which is also the order their
/// drawings are numbered in when written.
#[derive(Debug, Clone, Default)]
pub struct DrawingRegistry {
    patriarchs: BTreeMap<SheetId, Patriarch>,
}

impl DrawingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sheet's patriarch, creating an empty one on first request.
    /// Later calls for the same sheet return the same patriarch.
    pub fn get_or_create(&mut self, sheet: SheetId) -> &mut Patriarch {
        self.patriarchs.entry(sheet).or_insert_with(|| {
            debug!(%sheet, "created drawing patriarch");
            Patriarch::new(sheet)
        })
    }

    /// The sheet's patriarch, if one was created or loaded.
    pub fn get(&self, sheet: SheetId) -> Option<&Patriarch> {
        self.patriarchs.get(&sheet)
    }

    /// Install a patriarch rebuilt from a stream.
    pub(crate) fn insert(&mut self, patriarch: Patriarch) {
        self.patriarchs.insert(patriarch.sheet(), patriarch);
    }

    /// Patriarchs in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = &Patriarch> {
        self.patriarchs.values()
    }

    pub fn len(&self) -> usize {
        self.patriarchs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patriarchs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut registry = DrawingRegistry::new();
        let sheet = SheetId::new(0);
        assert!(registry.get(sheet).is_none());

        registry.get_or_create(sheet);
        registry.get_or_create(sheet);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(sheet).unwrap().sheet(), sheet);
    }

    #[test]
    fn test_iterates_in_sheet_order() {
        let mut registry = DrawingRegistry::new();
        registry.get_or_create(SheetId::new(2));
        registry.get_or_create(SheetId::new(0));
        let sheets: Vec<usize> = registry.iter().map(|p| p.sheet().index()).collect();
        assert_eq!(sheets, vec![0, 2]);
    }
}
