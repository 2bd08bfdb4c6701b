//! Worksheets of a workbook.

use super::biff::MAX_SHEET_NAME_LEN;
use crate::common::error::{Error, Result};

/// Characters a sheet name may not contain.
const FORBIDDEN_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

/// A named worksheet.
///
/// Only the sheet's identity is modelled; its drawing lives in the
/// workbook's drawing registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    name: String,
}

impl Worksheet {
    /// Create a worksheet after validating its name.
    pub(crate) fn new(name: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Sheet name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this sheet answers to `name`. Sheet names compare without
    /// regard to case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Check a sheet name: 1-31 characters, none of `: \ / ? * [ ]`, and no
/// leading or trailing apostrophe.
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(Error::InvalidSheetName(format!(
            "Worksheet name must be 1-{} characters: '{}'",
            MAX_SHEET_NAME_LEN, name
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(Error::InvalidSheetName(format!(
            "Worksheet name '{}' contains '{}'",
            name, c
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(Error::InvalidSheetName(format!(
            "Worksheet name '{}' starts or ends with an apostrophe",
            name
        )));
    }
    Ok(())
}
