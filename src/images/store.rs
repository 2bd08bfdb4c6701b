// Workbook picture store
//
// Every picture embedded in a workbook is registered exactly once in the
// store and receives a 1-based index. Shapes refer to pictures by that index
// (the `pib` property of a picture frame), so indices must stay stable for
// the lifetime of the workbook, including across save/load cycles.

use super::blip::{BlipUid, PictureType};
use super::info::ImageInfo;
use crate::common::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::num::NonZeroU32;
use tracing::debug;

/// Index of a picture in a workbook's picture store (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PictureId(NonZeroU32);

impl PictureId {
    /// Wrap a raw 1-based index; `None` for 0.
    #[inline]
    pub fn new(index: u32) -> Option<Self> {
        NonZeroU32::new(index).map(Self)
    }

    /// The raw 1-based index.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A picture registered with a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureData {
    index: PictureId,
    picture_type: PictureType,
    uid: BlipUid,
    data: Vec<u8>,
}

impl PictureData {
    pub(crate) fn new(index: PictureId, picture_type: PictureType, data: Vec<u8>) -> Self {
        let uid = compute_uid(&data);
        Self {
            index,
            picture_type,
            uid,
            data,
        }
    }

    /// Rebuild a picture read back from a stream, keeping its stored UID.
    pub(crate) fn with_uid(
        index: PictureId,
        picture_type: PictureType,
        uid: BlipUid,
        data: Vec<u8>,
    ) -> Self {
        Self {
            index,
            picture_type,
            uid,
            data,
        }
    }

    /// Index of this picture in the store.
    #[inline]
    pub fn index(&self) -> PictureId {
        self.index
    }

    /// Format of the payload.
    #[inline]
    pub fn picture_type(&self) -> PictureType {
        self.picture_type
    }

    /// The picture bytes exactly as registered.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// UID written into the BLIP store entry.
    #[inline]
    pub fn uid(&self) -> &BlipUid {
        &self.uid
    }

    /// MIME type of the payload.
    #[inline]
    pub fn mime_type(&self) -> &'static str {
        self.picture_type.mime_type()
    }

    /// Suggested file extension for the payload.
    #[inline]
    pub fn suggest_file_extension(&self) -> &'static str {
        self.picture_type.extension()
    }

    /// Pixel size and resolution, for bitmap formats with a readable header.
    pub fn image_info(&self) -> Option<ImageInfo> {
        ImageInfo::probe(self.picture_type, &self.data)
    }
}

/// BLIP UID: the first 16 bytes of the payload's SHA-256 digest.
fn compute_uid(data: &[u8]) -> BlipUid {
    let digest = Sha256::digest(data);
    let mut uid = [0u8; 16];
    uid.copy_from_slice(&digest[..16]);
    uid
}

/// The pictures of one workbook, ordered by index.
///
/// Indices are issued from an explicit counter that only moves forward. A
/// store rebuilt from a stream resumes counting after the last picture it
/// read, so editing a loaded workbook never reissues an index.
#[derive(Debug, Clone)]
pub struct PictureStore {
    pictures: Vec<PictureData>,
    next_index: NonZeroU32,
}

impl Default for PictureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PictureStore {
    /// Create an empty store; the first picture gets index 1.
    pub fn new() -> Self {
        Self {
            pictures: Vec::new(),
            next_index: NonZeroU32::MIN,
        }
    }

    /// Rebuild a store from pictures read back from a stream.
    ///
    /// The pictures must carry indices `1..=N` in order; anything else means
    /// the stream is inconsistent. The counter is re-seeded to `N + 1`.
    pub(crate) fn from_pictures(pictures: Vec<PictureData>) -> Result<Self> {
        for (position, picture) in pictures.iter().enumerate() {
            let expected = position as u32 + 1;
            if picture.index.get() != expected {
                return Err(Error::Codec(format!(
                    "Picture store is not contiguous: expected index {}, found {}",
                    expected, picture.index
                )));
            }
        }

        let next_index = u32::try_from(pictures.len())
            .ok()
            .and_then(|count| count.checked_add(1))
            .and_then(NonZeroU32::new)
            .ok_or_else(|| Error::Codec("Too many pictures".into()))?;

        debug!(
            pictures = pictures.len(),
            next_index = next_index.get(),
            "rebuilt picture store"
        );
        Ok(Self {
            pictures,
            next_index,
        })
    }

    /// Register a picture and return its index.
    ///
    /// Fails with [`Error::InvalidContent`] for an empty payload. The returned
    /// index is greater than every index issued before by this store.
    pub fn register(&mut self, data: Vec<u8>, picture_type: PictureType) -> Result<PictureId> {
        if data.is_empty() {
            return Err(Error::InvalidContent("picture data is empty".into()));
        }

        let index = PictureId(self.next_index);
        let next_index = self
            .next_index
            .checked_add(1)
            .ok_or_else(|| Error::InvalidContent("picture store is full".into()))?;

        debug!(
            index = index.get(),
            ?picture_type,
            size = data.len(),
            "registered picture"
        );
        self.pictures.push(PictureData::new(index, picture_type, data));
        self.next_index = next_index;
        Ok(index)
    }

    /// Register a picture given a raw picture-type code (MSOBLIPTYPE).
    pub fn register_code(&mut self, data: Vec<u8>, code: u32) -> Result<PictureId> {
        let picture_type = PictureType::from_code(code).ok_or_else(|| {
            Error::InvalidContent(format!("unrecognized picture type code {}", code))
        })?;
        self.register(data, picture_type)
    }

    /// Register a picture whose format is detected from its magic bytes.
    pub fn register_detected(&mut self, data: Vec<u8>) -> Result<PictureId> {
        let picture_type = PictureType::detect(&data).ok_or_else(|| {
            Error::InvalidContent("picture format could not be detected".into())
        })?;
        self.register(data, picture_type)
    }

    /// Look up a picture by index.
    pub fn resolve(&self, index: PictureId) -> Result<&PictureData> {
        self.get(index).ok_or(Error::UnknownResource(index.get()))
    }

    /// Look up a picture by index, if present.
    pub fn get(&self, index: PictureId) -> Option<&PictureData> {
        // Indices are contiguous from 1, so the position is index - 1.
        self.pictures.get(index.get() as usize - 1)
    }

    /// Whether `index` refers to a registered picture.
    #[inline]
    pub fn contains(&self, index: PictureId) -> bool {
        self.get(index).is_some()
    }

    /// All pictures, ordered by index.
    #[inline]
    pub fn all(&self) -> &[PictureData] {
        &self.pictures
    }

    /// Iterate over the pictures in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, PictureData> {
        self.pictures.iter()
    }

    /// Number of registered pictures.
    #[inline]
    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    /// Whether no picture has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    /// The index the next registration will receive.
    #[inline]
    pub fn next_index(&self) -> PictureId {
        PictureId(self.next_index)
    }
}

impl<'a> IntoIterator for &'a PictureStore {
    type Item = &'a PictureData;
    type IntoIter = std::slice::Iter<'a, PictureData>;

    fn into_iter(self) -> Self::IntoIter {
        self.pictures.iter()
    }
}
