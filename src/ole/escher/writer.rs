//! Escher record writers for drawing groups and sheet drawings.
//!
//! Record headers, the Dgg/Dg/Spgr/Sp atoms, shape properties and the
//! constants shared with the workbook reader (MS-ODRAW).

use bitflags::bitflags;
use std::io::{self, Write};
use zerocopy::IntoBytes;
use zerocopy_derive::*;

// =============================================================================
// Shape Flags (MS-ODRAW 2.2.40)
// =============================================================================

bitflags! {
    /// Shape flags for EscherSpRecord (MS-ODRAW 2.2.40)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShapeFlags: u32 {
        /// Shape is a group
        const GROUP = 0x0001;
        /// Shape is a child of a group
        const CHILD = 0x0002;
        /// Shape is the topmost group (patriarch)
        const PATRIARCH = 0x0004;
        /// Shape has been deleted
        const DELETED = 0x0008;
        /// Shape is an OLE object
        const OLE_SHAPE = 0x0010;
        /// Shape has a valid master
        const HAVE_MASTER = 0x0020;
        /// Shape is flipped horizontally
        const FLIP_H = 0x0040;
        /// Shape is flipped vertically
        const FLIP_V = 0x0080;
        /// Shape is a connector
        const CONNECTOR = 0x0100;
        /// Shape has an anchor
        const HAVE_ANCHOR = 0x0200;
        /// Shape is a background shape
        const BACKGROUND = 0x0400;
        /// Shape has a shape type property
        const HAVE_SPT = 0x0800;
    }
}

// =============================================================================
// Escher Record Types Constants
// =============================================================================

pub mod record_type {
    pub const DGG_CONTAINER: u16 = 0xF000;
    pub const BSTORE_CONTAINER: u16 = 0xF001;
    pub const DG_CONTAINER: u16 = 0xF002;
    pub const SPGR_CONTAINER: u16 = 0xF003;
    pub const SP_CONTAINER: u16 = 0xF004;
    pub const DGG: u16 = 0xF006;
    pub const BSE: u16 = 0xF007;
    pub const DG: u16 = 0xF008;
    pub const SPGR: u16 = 0xF009;
    pub const SP: u16 = 0xF00A;
    pub const OPT: u16 = 0xF00B;
    pub const CLIENT_ANCHOR: u16 = 0xF010;
    pub const CLIENT_DATA: u16 = 0xF011;
}

// =============================================================================
// Shape Type Constants (MS-ODRAW 2.4.6 MSOSPT)
// =============================================================================

pub mod shape_type {
    pub const NOT_PRIMITIVE: u16 = 0;
    pub const PICTURE_FRAME: u16 = 75;
}

// =============================================================================
// Property Ids (MS-ODRAW 2.3)
// =============================================================================

pub mod prop_id {
    /// Property id mask (drops the fBid and fComplex bits)
    pub const ID_MASK: u16 = 0x3FFF;
    /// Property value is a BLIP id (fBid)
    pub const IS_BLIP_ID: u16 = 0x4000;
    /// `pib`: 1-based index into the BStoreContainer
    pub const BLIP_TO_DISPLAY: u16 = 0x0104;
    /// `pib` with the fBid flag, as written for picture frames
    pub const PIB: u16 = BLIP_TO_DISPLAY | IS_BLIP_ID;
    /// Protection booleans (fLockAgainstGrouping etc.)
    pub const PROTECTION_BOOLEANS: u16 = 0x007F;
}

// =============================================================================
// Zerocopy Data Structures
// =============================================================================

/// Escher record header (8 bytes) - zerocopy compatible
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EscherRecordHeader {
    pub ver_inst: u16,
    pub rec_type: u16,
    pub length: u32,
}

impl EscherRecordHeader {
    pub const fn new(version: u8, instance: u16, rec_type: u16, length: u32) -> Self {
        let ver_inst = (version as u16 & 0x0F) | ((instance & 0x0FFF) << 4);
        Self {
            ver_inst,
            rec_type,
            length,
        }
    }
}

/// Shape record data (8 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct EscherSpData {
    pub spid: u32,
    pub flags: u32,
}

impl EscherSpData {
    pub const fn with_flags(spid: u32, flags: ShapeFlags) -> Self {
        Self {
            spid,
            flags: flags.bits(),
        }
    }
}

/// Drawing group atom body (FDGG, 16 bytes), followed by `cidcl - 1` FIDCLs
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct EscherDggData {
    /// Maximum shape id in use
    pub spid_max: u32,
    /// Number of id clusters + 1
    pub cidcl: u32,
    /// Total number of shapes saved
    pub csp_saved: u32,
    /// Total number of drawings saved
    pub cdg_saved: u32,
}

/// File id cluster (FIDCL, 8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct EscherIdCluster {
    /// Drawing id owning the cluster
    pub dgid: u32,
    /// Next free shape id within the cluster
    pub cspid_cur: u32,
}

// =============================================================================
// Writing Functions
// =============================================================================

/// Write an Escher record header (8 bytes).
///
/// # Format
///
/// - Bytes 0-1: Version (4 bits) | Instance (12 bits)
/// - Bytes 2-3: Record Type
/// - Bytes 4-7: Record Length (32-bit)
pub fn write_record_header<W: Write>(
    writer: &mut W,
    version: u8,
    instance: u16,
    record_type: u16,
    length: u32,
) -> io::Result<()> {
    let header = EscherRecordHeader::new(version, instance, record_type, length);
    writer.write_all(header.as_bytes())?;
    Ok(())
}

/// Write a container record with pre-calculated child data.
pub fn write_container<W: Write>(
    writer: &mut W,
    instance: u16,
    record_type: u16,
    child_data: &[u8],
) -> io::Result<()> {
    write_record_header(writer, 0x0F, instance, record_type, child_data.len() as u32)?;
    writer.write_all(child_data)?;
    Ok(())
}

/// Write a simple atom record.
pub fn write_atom<W: Write>(
    writer: &mut W,
    version: u8,
    instance: u16,
    record_type: u16,
    data: &[u8],
) -> io::Result<()> {
    write_record_header(writer, version, instance, record_type, data.len() as u32)?;
    writer.write_all(data)?;
    Ok(())
}

/// Helper to build property records (Opt records).
///
/// Properties are written sorted by id, as Office expects.
#[derive(Debug, Default)]
pub struct PropertyBuilder {
    properties: Vec<(u16, u32)>,
}

impl PropertyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a simple property.
    pub fn add_simple(&mut self, property_id: u16, value: u32) -> &mut Self {
        self.properties.push((property_id, value));
        self
    }

    /// Write the Opt record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut sorted = self.properties.clone();
        sorted.sort_by_key(|(id, _)| id & prop_id::ID_MASK);

        let num_properties = sorted.len() as u16;
        write_record_header(
            writer,
            0x03,
            num_properties,
            record_type::OPT,
            (sorted.len() * 6) as u32,
        )?;

        for (id, value) in &sorted {
            writer.write_all(&id.to_le_bytes())?;
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }
}

/// Helper to build shape records.
pub struct ShapeBuilder {
    shape_type: u16,
    shape_id: u32,
    flags: ShapeFlags,
}

impl ShapeBuilder {
    pub fn new(shape_type: u16, shape_id: u32) -> Self {
        Self {
            shape_type,
            shape_id,
            flags: ShapeFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: ShapeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Write the Sp record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let data = EscherSpData::with_flags(self.shape_id, self.flags);
        write_atom(writer, 0x02, self.shape_type, record_type::SP, data.as_bytes())
    }
}

/// Write an Spgr record (group shape coordinates).
pub fn write_spgr<W: Write>(
    writer: &mut W,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
) -> io::Result<()> {
    write_record_header(writer, 0x01, 0, record_type::SPGR, 16)?;
    writer.write_all(&left.to_le_bytes())?;
    writer.write_all(&top.to_le_bytes())?;
    writer.write_all(&right.to_le_bytes())?;
    writer.write_all(&bottom.to_le_bytes())?;
    Ok(())
}

/// Write a Dg record (drawing atom). The drawing id travels in the instance.
pub fn write_dg<W: Write>(
    writer: &mut W,
    drawing_id: u16,
    num_shapes: u32,
    last_shape_id: u32,
) -> io::Result<()> {
    write_record_header(writer, 0x00, drawing_id, record_type::DG, 8)?;
    writer.write_all(&num_shapes.to_le_bytes())?;
    writer.write_all(&last_shape_id.to_le_bytes())?;
    Ok(())
}

/// Write a Dgg record (drawing group atom) with its id clusters.
pub fn write_dgg<W: Write>(
    writer: &mut W,
    header: EscherDggData,
    clusters: &[EscherIdCluster],
) -> io::Result<()> {
    let length = 16 + clusters.len() * 8;
    write_record_header(writer, 0x00, 0, record_type::DGG, length as u32)?;
    writer.write_all(header.as_bytes())?;
    for cluster in clusters {
        writer.write_all(cluster.as_bytes())?;
    }
    Ok(())
}

/// Write an empty ClientData record.
pub fn write_client_data<W: Write>(writer: &mut W) -> io::Result<()> {
    write_record_header(writer, 0x00, 0, record_type::CLIENT_DATA, 0)
}
