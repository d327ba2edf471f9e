//! Error types for raster access.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening or reading a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    /// The raster does not exist.
    #[error("raster not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The raster exists but could not be opened.
    #[error("failed to open raster {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },

    /// Decoding the raster failed.
    #[error("failed to decode raster: {0}")]
    Decode(String),

    /// The raster uses a layout or sample type this crate cannot read.
    #[error("unsupported raster: {0}")]
    Unsupported(String),

    /// A band index outside 1..=band_count was requested.
    #[error("band {index} out of range (raster has {count} bands)")]
    BandOutOfRange { index: usize, count: usize },

    /// Storage/IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    /// Create an Open error.
    pub fn open(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            message: msg.into(),
        }
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(err: tiff::TiffError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
