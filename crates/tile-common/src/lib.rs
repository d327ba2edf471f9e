//! Common types shared across the tile pyramid workspace.

pub mod bbox;
pub mod dtype;
pub mod error;
pub mod tile;

pub use bbox::BoundingBox;
pub use dtype::DataType;
pub use error::ParseError;
pub use tile::{PyramidType, TILE_SIZE};
