//! OfficeArt (Escher) records for the workbook drawing layer.
//!
//! Escher is Microsoft's drawing layer format used across Office applications.
//! In a BIFF8 workbook it is carried inside MSODRAWINGGROUP (picture store) and
//! MSODRAWING (per-sheet shapes) records.
//!
//! # Modules
//!
//! - `types`: Escher record type definitions
//! - `record`: Zero-copy record structure
//! - `container`: Container record handling with iterators
//! - `writer`: Escher record generation utilities

pub mod container;
pub mod record;
pub mod types;
pub mod writer;

pub use container::{EscherChildIterator, EscherContainer};
pub use record::EscherRecord;
pub use types::EscherRecordType;
pub use writer::{
    EscherDggData, EscherIdCluster, EscherRecordHeader, EscherSpData, PropertyBuilder,
    ShapeBuilder, ShapeFlags, prop_id, record_type, shape_type, write_atom, write_client_data,
    write_container, write_dg, write_dgg, write_record_header, write_spgr,
};
