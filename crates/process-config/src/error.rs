//! Error types for job resolution.

use std::path::PathBuf;

use raster_io::RasterError;
use thiserror::Error;

/// Errors raised while resolving a job description.
///
/// Every validation failure is raised where it is detected; a partially
/// resolved configuration is never returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A job description or process file does not exist.
    #[error("{what} not found: {}", .path.display())]
    NotFound { what: &'static str, path: PathBuf },

    /// Missing, malformed or contradictory configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The job is structurally invalid at one zoom level.
    #[error("configuration invalid at zoom {zoom}: {explanation}")]
    InvalidAtZoom { zoom: u32, explanation: String },

    /// No value range is known for the data type.
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Reading an input raster failed.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Storage/IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The execution engine rejected the plan.
    #[error("execution failed: {0}")]
    Execution(#[from] anyhow::Error),
}

impl ConfigError {
    /// Create a Configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    /// Whether this error belongs to the configuration family.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidAtZoom { .. })
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Configuration(format!("malformed job description: {}", err))
    }
}

/// Result type for job resolution.
pub type Result<T> = std::result::Result<T, ConfigError>;
