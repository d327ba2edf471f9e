//! Traits and value types shared by all raster backends.

use std::path::Path;

use tile_common::{BoundingBox, DataType};

use crate::error::{RasterError, Result};

/// Metadata of an open raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Sample type of each band.
    pub dtypes: Vec<DataType>,
    /// Declared nodata value of each band.
    pub nodatavals: Vec<Option<f64>>,
    /// Extent as (left, bottom, right, top).
    pub bounds: BoundingBox,
}

impl RasterInfo {
    pub fn band_count(&self) -> usize {
        self.dtypes.len()
    }

    /// Data type of the first band, used as the raster's data type.
    pub fn dtype(&self) -> Option<DataType> {
        self.dtypes.first().copied()
    }

    /// Nodata value of the first band.
    pub fn nodata(&self) -> Option<f64> {
        self.nodatavals.first().copied().flatten()
    }

    /// Check a 1-based band index against the band count.
    pub fn check_band(&self, index: usize) -> Result<()> {
        if index == 0 || index > self.band_count() {
            return Err(RasterError::BandOutOfRange {
                index,
                count: self.band_count(),
            });
        }
        Ok(())
    }
}

/// A full band as a row-major 2D array of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct BandData {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl BandData {
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Self {
        Self {
            width,
            height,
            values,
        }
    }

    /// Value at a column/row position.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.values.get(row * self.width + col).copied()
    }

    /// Empirical (min, max) over all samples, ignoring NaN.
    ///
    /// Returns `None` for a band without any finite or infinite sample.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// An open raster. Dropping it releases the underlying handle.
pub trait RasterDataset: Send {
    /// Metadata read when the raster was opened.
    fn info(&self) -> &RasterInfo;

    /// Read a whole band at full resolution. Bands are numbered from 1.
    fn read_band(&mut self, index: usize) -> Result<BandData>;
}

/// Opens rasters by path.
pub trait RasterOpener: Send + Sync {
    /// Open a raster for reading.
    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>>;

    /// Whether a raster is available at `path`.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
