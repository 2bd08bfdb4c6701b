/// Configuration for writing workbook streams.
///
/// # Examples
///
/// ```rust
/// use officeart::ole::xls::CodecOptions;
///
/// // Create with defaults
/// let options = CodecOptions::default();
///
/// // Or customize
/// let options = CodecOptions::new()
///     .with_max_record_data(1024)
///     .with_compress_metafiles(false);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Largest data length of one BIFF record before the payload spills into
    /// CONTINUE records. Always within `1..=8224`.
    pub max_record_data: usize,
    /// Whether EMF, WMF and PICT payloads are deflated inside their BLIP
    pub compress_metafiles: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_record_data: super::biff::MAX_RECORD_DATA,
            compress_metafiles: true,
        }
    }
}

impl CodecOptions {
    /// Create a new `CodecOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record data limit. Values outside `1..=8224` are clamped.
    ///
    /// Smaller limits only change how drawing payloads are split across
    /// CONTINUE records; the decoded workbook is the same.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use officeart::ole::xls::CodecOptions;
    ///
    /// assert_eq!(CodecOptions::new().with_max_record_data(0).max_record_data, 1);
    /// assert_eq!(CodecOptions::new().with_max_record_data(100_000).max_record_data, 8224);
    /// ```
    #[inline]
    pub fn with_max_record_data(mut self, max: usize) -> Self {
        self.max_record_data = max.clamp(1, super::biff::MAX_RECORD_DATA);
        self
    }

    /// Set whether metafile payloads are compressed.
    #[inline]
    pub fn with_compress_metafiles(mut self, compress: bool) -> Self {
        self.compress_metafiles = compress;
        self
    }
}
