// Picture storage for the workbook drawing layer
//
// Pictures embedded in a workbook live in a single per-workbook store and are
// written to the drawing group as BLIP records wrapped in BLIP store entries.
//
// # Architecture
//
// - `blip`: Picture types and OfficeArtBlip record encoding
// - `bse`: BLIP Store Entry (BSE) records
// - `info`: Pixel size and resolution probing for bitmap payloads
// - `store`: The per-workbook picture registry
//
// # Example
//
// ```
// use officeart::images::{PictureStore, PictureType};
//
// let mut store = PictureStore::new();
// let index = store.register(vec![1, 2, 3], PictureType::Jpeg)?;
// assert_eq!(index.get(), 1);
// assert_eq!(store.resolve(index)?.data(), &[1, 2, 3]);
// # Ok::<(), officeart::Error>(())
// ```

pub mod blip;
pub mod bse;
pub mod info;
pub mod store;

pub use blip::{BlipUid, PictureType};
pub use bse::BlipStoreEntry;
pub use info::ImageInfo;
pub use store::{PictureData, PictureId, PictureStore};
