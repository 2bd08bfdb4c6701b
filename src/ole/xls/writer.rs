//! Workbook stream writer.
//!
//! Encodes a [`Workbook`] as a BIFF8 workbook stream:
//!
//! ```text
//! BOF(globals) BOUNDSHEET* [MSODRAWINGGROUP CONTINUE*] EOF
//! ( BOF(worksheet) [MSODRAWING CONTINUE*] EOF )*
//! ```
//!
//! The drawing group holds the Dgg atom (shape id bookkeeping) and the BLIP
//! store with one BSE per picture, in index order. Each sheet with a drawing
//! gets a DgContainer whose first shape is the patriarch group, followed by
//! the sheet's shapes in creation order.
//!
//! Shape ids are allocated per drawing in clusters of 1024: drawing `n` owns
//! the cluster(s) following those of drawing `n - 1`.

use super::biff::{self, BoundSheetRecord, record_type as biff_record, substream};
use super::config::CodecOptions;
use super::drawing::{Patriarch, Picture, Shape};
use super::workbook::Workbook;
use crate::common::error::{Error, Result};
use crate::images::bse::write_bse;
use crate::images::{PictureData, PictureStore};
use crate::ole::escher::{
    EscherDggData, EscherIdCluster, PropertyBuilder, ShapeBuilder, ShapeFlags, prop_id,
    record_type, shape_type, write_atom, write_client_data, write_container, write_dg, write_dgg,
    write_spgr,
};
use smallvec::SmallVec;
use std::io::Write;
use tracing::debug;

const SHAPES_PER_CLUSTER: u32 = 1024;
/// Drawing ids travel in the 12-bit instance of the Dg atom.
const MAX_DRAWING_ID: usize = 0x0FFF;
/// The picture count travels in the 12-bit instance of the BStoreContainer.
const MAX_PICTURES: usize = 0x0FFF;
/// fLockAspectRatio together with its fUsefLockAspectRatio bit
const LOCK_ASPECT_RATIO: u32 = 0x0080_0080;

/// Where one drawing's shapes sit in the workbook's shape id space.
#[derive(Debug, Clone, Copy)]
struct DrawingLayout {
    drawing_id: u16,
    /// 1-based index of the drawing's first id cluster
    first_cluster: u32,
    /// Shapes in the drawing, patriarch included
    shape_count: u32,
}

impl DrawingLayout {
    fn cluster_count(&self) -> u32 {
        self.shape_count.div_ceil(SHAPES_PER_CLUSTER)
    }

    /// Shape id of the `n`-th shape; the patriarch is shape 0.
    fn shape_id(&self, n: u32) -> u32 {
        (self.first_cluster + n / SHAPES_PER_CLUSTER) * SHAPES_PER_CLUSTER + n % SHAPES_PER_CLUSTER
    }

    fn last_shape_id(&self) -> u32 {
        self.shape_id(self.shape_count - 1)
    }
}

/// Writes a [`Workbook`] as a BIFF8 workbook stream.
pub struct XlsWriter<'a> {
    workbook: &'a Workbook,
    options: CodecOptions,
}

impl<'a> XlsWriter<'a> {
    /// Create a writer with default options.
    pub fn new(workbook: &'a Workbook) -> Self {
        Self::with_options(workbook, CodecOptions::default())
    }

    /// Create a writer with the given options.
    pub fn with_options(workbook: &'a Workbook, options: CodecOptions) -> Self {
        Self { workbook, options }
    }

    /// Write the stream to `writer`.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Encode the stream.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let layouts = self.layout_drawings()?;
        let max_chunk = self.options.max_record_data;
        let mut stream = Vec::new();

        // === Workbook Globals ===
        biff::write_bof(&mut stream, substream::GLOBALS)?;

        // BoundSheet8 positions are patched once the sheet offsets are known
        let mut boundsheet_positions = Vec::with_capacity(self.workbook.sheet_count());
        for sheet in self.workbook.sheets() {
            boundsheet_positions.push(stream.len());
            BoundSheetRecord::worksheet(0, sheet.name()).write(&mut stream)?;
        }

        if !layouts.is_empty() || !self.workbook.pictures().is_empty() {
            let group = self.drawing_group(&layouts)?;
            biff::write_continued(&mut stream, biff_record::MSODRAWINGGROUP, &group, max_chunk)?;
        }

        biff::write_eof(&mut stream)?;

        // === Worksheets ===
        let mut sheet_positions = Vec::with_capacity(self.workbook.sheet_count());
        for (index, _) in self.workbook.sheets().iter().enumerate() {
            sheet_positions.push(stream.len());
            biff::write_bof(&mut stream, substream::WORKSHEET)?;

            if let Some((patriarch, layout)) = layouts
                .iter()
                .find(|(patriarch, _)| patriarch.sheet().index() == index)
            {
                let drawing = self.drawing(patriarch, layout)?;
                biff::write_continued(&mut stream, biff_record::MSODRAWING, &drawing, max_chunk)?;
            }

            biff::write_eof(&mut stream)?;
        }

        for (&record_pos, &sheet_pos) in boundsheet_positions.iter().zip(&sheet_positions) {
            let position = u32::try_from(sheet_pos)
                .map_err(|_| Error::Codec("Workbook stream exceeds 4 GiB".into()))?;
            // lbPlyPos is the first field after the record header
            let field = record_pos + biff::RECORD_HEADER_SIZE;
            stream[field..field + 4].copy_from_slice(&position.to_le_bytes());
        }

        debug!(
            sheets = self.workbook.sheet_count(),
            pictures = self.workbook.pictures().len(),
            drawings = layouts.len(),
            bytes = stream.len(),
            "wrote workbook stream"
        );
        Ok(stream)
    }

    /// Number the drawings in sheet order and hand out their id clusters.
    fn layout_drawings(&self) -> Result<Vec<(&'a Patriarch, DrawingLayout)>> {
        let mut layouts = Vec::with_capacity(self.workbook.drawings().len());
        let mut next_cluster = 1u32;

        for (position, patriarch) in self.workbook.drawings().iter().enumerate() {
            if self.workbook.sheet(patriarch.sheet()).is_none() {
                return Err(Error::SheetNotFound(patriarch.sheet().to_string()));
            }
            if position >= MAX_DRAWING_ID {
                return Err(Error::Codec(format!(
                    "A workbook holds at most {} drawings",
                    MAX_DRAWING_ID
                )));
            }

            let shape_count = u32::try_from(patriarch.len() + 1)
                .map_err(|_| Error::Codec("Too many shapes in one drawing".into()))?;
            let layout = DrawingLayout {
                drawing_id: position as u16 + 1,
                first_cluster: next_cluster,
                shape_count,
            };
            next_cluster = next_cluster
                .checked_add(layout.cluster_count())
                .filter(|&cluster| cluster.checked_mul(SHAPES_PER_CLUSTER).is_some())
                .ok_or_else(|| Error::Codec("Shape id space exhausted".into()))?;
            layouts.push((patriarch, layout));
        }

        Ok(layouts)
    }

    /// OfficeArtDggContainer: Dgg atom and BLIP store.
    fn drawing_group(&self, layouts: &[(&Patriarch, DrawingLayout)]) -> Result<Vec<u8>> {
        let mut clusters: SmallVec<[EscherIdCluster; 8]> = SmallVec::new();
        let mut shapes_saved = 0u32;
        let mut spid_max = SHAPES_PER_CLUSTER;

        for (_, layout) in layouts {
            let mut remaining = layout.shape_count;
            for _ in 0..layout.cluster_count() {
                let in_use = remaining.min(SHAPES_PER_CLUSTER);
                clusters.push(EscherIdCluster {
                    dgid: layout.drawing_id as u32,
                    cspid_cur: in_use,
                });
                remaining -= in_use;
            }
            shapes_saved += layout.shape_count;
            spid_max = spid_max.max(layout.last_shape_id() + 1);
        }

        let mut children = Vec::new();
        write_dgg(
            &mut children,
            EscherDggData {
                spid_max,
                cidcl: clusters.len() as u32 + 1,
                csp_saved: shapes_saved,
                cdg_saved: layouts.len() as u32,
            },
            &clusters,
        )?;

        let store = self.workbook.pictures();
        if store.len() > MAX_PICTURES {
            return Err(Error::Codec(format!(
                "A workbook holds at most {} pictures, found {}",
                MAX_PICTURES,
                store.len()
            )));
        }
        if !store.is_empty() {
            let ref_counts = reference_counts(store, layouts.iter().map(|(p, _)| *p));
            let mut entries = Vec::new();
            for (picture, ref_count) in store.iter().zip(ref_counts) {
                self.write_entry(&mut entries, picture, ref_count)?;
            }
            write_container(
                &mut children,
                store.len() as u16,
                record_type::BSTORE_CONTAINER,
                &entries,
            )?;
        }

        let mut group = Vec::with_capacity(children.len() + 8);
        write_container(&mut group, 0, record_type::DGG_CONTAINER, &children)?;
        Ok(group)
    }

    fn write_entry(&self, out: &mut Vec<u8>, picture: &PictureData, ref_count: u32) -> Result<()> {
        write_bse(
            out,
            picture.picture_type(),
            picture.uid(),
            picture.data(),
            ref_count,
            self.options.compress_metafiles,
        )
    }

    /// OfficeArtDgContainer for one sheet.
    fn drawing(&self, patriarch: &Patriarch, layout: &DrawingLayout) -> Result<Vec<u8>> {
        let mut shapes = Vec::new();

        // The patriarch group is always the first shape of the drawing
        let mut group = Vec::new();
        write_spgr(&mut group, 0, 0, 1023, 255)?;
        ShapeBuilder::new(shape_type::NOT_PRIMITIVE, layout.shape_id(0))
            .with_flags(ShapeFlags::GROUP | ShapeFlags::PATRIARCH)
            .write(&mut group)?;
        write_container(&mut shapes, 0, record_type::SP_CONTAINER, &group)?;

        for (n, shape) in patriarch.children().iter().enumerate() {
            let spid = layout.shape_id(n as u32 + 1);
            match shape {
                Shape::Picture(picture) => write_picture(&mut shapes, picture, spid)?,
            }
        }

        let mut dg = Vec::new();
        write_dg(
            &mut dg,
            layout.drawing_id,
            layout.shape_count,
            layout.last_shape_id(),
        )?;
        write_container(&mut dg, 0, record_type::SPGR_CONTAINER, &shapes)?;

        let mut out = Vec::with_capacity(dg.len() + 8);
        write_container(&mut out, 0, record_type::DG_CONTAINER, &dg)?;
        debug!(
            sheet = %patriarch.sheet(),
            drawing_id = layout.drawing_id,
            shapes = layout.shape_count,
            bytes = out.len(),
            "encoded drawing"
        );
        Ok(out)
    }
}

/// Picture frame SpContainer: Sp, Opt with `pib`, ClientAnchor, ClientData.
fn write_picture(out: &mut Vec<u8>, picture: &Picture, spid: u32) -> Result<()> {
    let mut body = Vec::new();
    ShapeBuilder::new(shape_type::PICTURE_FRAME, spid)
        .with_flags(ShapeFlags::HAVE_ANCHOR | ShapeFlags::HAVE_SPT)
        .write(&mut body)?;

    let mut props = PropertyBuilder::new();
    props
        .add_simple(prop_id::PROTECTION_BOOLEANS, LOCK_ASPECT_RATIO)
        .add_simple(prop_id::PIB, picture.picture_index().get());
    props.write(&mut body)?;

    write_atom(&mut body, 0x00, 0, record_type::CLIENT_ANCHOR, &picture.anchor().to_bytes())?;
    write_client_data(&mut body)?;

    write_container(out, 0, record_type::SP_CONTAINER, &body)?;
    Ok(())
}

/// How many shapes display each picture, in store order.
fn reference_counts<'p>(
    store: &PictureStore,
    patriarchs: impl Iterator<Item = &'p Patriarch>,
) -> Vec<u32> {
    let mut counts = vec![0u32; store.len()];
    for patriarch in patriarchs {
        for picture in patriarch.pictures() {
            if let Some(count) = counts.get_mut(picture.picture_index().get() as usize - 1) {
                *count += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_ids() {
        let layout = DrawingLayout {
            drawing_id: 1,
            first_cluster: 1,
            shape_count: 3,
        };
        assert_eq!(layout.shape_id(0), 1024);
        assert_eq!(layout.last_shape_id(), 1026);
        assert_eq!(layout.cluster_count(), 1);
    }

    #[test]
    fn test_shape_ids_span_clusters() {
        let layout = DrawingLayout {
            drawing_id: 2,
            first_cluster: 3,
            shape_count: 1500,
        };
        assert_eq!(layout.cluster_count(), 2);
        assert_eq!(layout.shape_id(1023), 3 * 1024 + 1023);
        assert_eq!(layout.shape_id(1024), 4 * 1024);
        assert_eq!(layout.last_shape_id(), 4 * 1024 + 475);
    }

    #[test]
    fn test_picture_count_fits_bstore_instance() {
        let mut workbook = Workbook::new();
        for n in 0..MAX_PICTURES {
            workbook
                .add_picture(vec![n as u8], crate::images::PictureType::Jpeg)
                .unwrap();
        }
        assert!(XlsWriter::new(&workbook).to_bytes().is_ok());

        workbook
            .add_picture(vec![0], crate::images::PictureType::Jpeg)
            .unwrap();
        assert!(matches!(
            XlsWriter::new(&workbook).to_bytes(),
            Err(Error::Codec(_))
        ));
    }

    #[test]
    fn test_empty_workbook() {
        let workbook = Workbook::new();
        let bytes = XlsWriter::new(&workbook).to_bytes().unwrap();
        // BOF(globals) + EOF
        assert_eq!(bytes.len(), 2 * biff::RECORD_HEADER_SIZE + 16);
    }
}
