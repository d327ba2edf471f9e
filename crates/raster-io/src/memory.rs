//! In-memory rasters.
//!
//! Useful for callers that already hold raster data and for tests: a
//! [`MemoryRasters`] registry maps paths to [`MemoryRaster`]s and behaves like
//! any other [`RasterOpener`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tile_common::{BoundingBox, DataType};

use crate::dataset::{BandData, RasterDataset, RasterInfo, RasterOpener};
use crate::error::{RasterError, Result};

/// A raster held fully in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRaster {
    info: RasterInfo,
    bands: Vec<BandData>,
}

impl MemoryRaster {
    /// Create a raster with `band_count` zero-filled bands of one data type.
    pub fn new(
        bounds: BoundingBox,
        width: u32,
        height: u32,
        dtype: DataType,
        band_count: usize,
    ) -> Self {
        let size = width as usize * height as usize;
        let band = BandData::new(width as usize, height as usize, vec![0.0; size]);
        Self {
            info: RasterInfo {
                width,
                height,
                dtypes: vec![dtype; band_count],
                nodatavals: vec![None; band_count],
                bounds,
            },
            bands: vec![band; band_count],
        }
    }

    /// Replace the samples of a band (numbered from 1).
    ///
    /// Missing samples are padded with zeros, extra samples are dropped.
    pub fn with_band(mut self, index: usize, mut values: Vec<f64>) -> Self {
        if let Some(band) = index.checked_sub(1).and_then(|i| self.bands.get_mut(i)) {
            values.resize(band.width * band.height, 0.0);
            band.values = values;
        }
        self
    }

    /// Declare the same nodata value on every band.
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.info.nodatavals = vec![Some(nodata); self.info.band_count()];
        self
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }
}

struct MemoryDataset {
    raster: MemoryRaster,
}

impl RasterDataset for MemoryDataset {
    fn info(&self) -> &RasterInfo {
        &self.raster.info
    }

    fn read_band(&mut self, index: usize) -> Result<BandData> {
        self.raster.info.check_band(index)?;
        Ok(self.raster.bands[index - 1].clone())
    }
}

/// A path-keyed registry of in-memory rasters.
#[derive(Debug, Clone, Default)]
pub struct MemoryRasters {
    rasters: HashMap<PathBuf, MemoryRaster>,
}

impl MemoryRasters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster under a path, replacing any previous one.
    pub fn insert(&mut self, path: impl Into<PathBuf>, raster: MemoryRaster) {
        self.rasters.insert(path.into(), raster);
    }

    /// Builder-style [`MemoryRasters::insert`].
    pub fn with(mut self, path: impl Into<PathBuf>, raster: MemoryRaster) -> Self {
        self.insert(path, raster);
        self
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}

impl RasterOpener for MemoryRasters {
    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>> {
        let raster = self
            .rasters
            .get(path)
            .cloned()
            .ok_or_else(|| RasterError::NotFound(path.to_path_buf()))?;
        Ok(Box::new(MemoryDataset { raster }))
    }

    fn exists(&self, path: &Path) -> bool {
        self.rasters.contains_key(path)
    }
}
