//! Raster dataset access.
//!
//! Everything the planner needs to know about an input raster goes through
//! two traits:
//!
//! - [`RasterOpener`] turns a path into an open dataset
//! - [`RasterDataset`] exposes metadata and whole-band reads
//!
//! Datasets are plain owned values; dropping one releases the underlying
//! handle, so every early return closes the raster.
//!
//! Two openers ship with the crate: [`GeoTiffOpener`] for files on disk and
//! [`MemoryRasters`] for rasters held in memory.

pub mod dataset;
pub mod error;
pub mod geotiff;
pub mod memory;

pub use dataset::{BandData, RasterDataset, RasterInfo, RasterOpener};
pub use error::{RasterError, Result};
pub use geotiff::GeoTiffOpener;
pub use memory::{MemoryRaster, MemoryRasters};
