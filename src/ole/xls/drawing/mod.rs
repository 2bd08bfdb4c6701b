//! Sheet drawings: shape containers and the shapes placed on them.
//!
//! Every sheet owns at most one [`Patriarch`], created on first request by the
//! workbook's [`DrawingRegistry`]. Picture shapes reference the workbook's
//! picture store by index.

pub mod anchor;
pub mod patriarch;
pub mod registry;
pub mod shape;

pub use anchor::{AnchorType, ClientAnchor};
pub use patriarch::{Drawing, Patriarch};
pub use registry::{DrawingRegistry, SheetId};
pub use shape::{Picture, Shape};
