//! Output dataset description.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tile_common::DataType;

use crate::error::{ConfigError, Result};

/// Output format driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[default]
    GTiff,
    #[serde(rename = "PNG")]
    Png,
}

impl OutputFormat {
    /// Most bands the format can carry, if limited.
    pub fn max_bands(&self) -> Option<usize> {
        match self {
            Self::GTiff => None,
            Self::Png => Some(3),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GTiff => "GTiff",
            Self::Png => "PNG",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gtiff" | "geotiff" => Ok(Self::GTiff),
            "png" => Ok(Self::Png),
            _ => Err(ConfigError::configuration(format!(
                "unknown output format '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how the output pyramid is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// Band count, when known up front.
    pub bands: Option<usize>,
    /// Output data type, when known up front.
    pub dtype: Option<DataType>,
}

/// Whether existing output tiles are replaced or kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    #[default]
    Continue,
    Overwrite,
}

impl ProcessingMode {
    pub fn from_overwrite(overwrite: bool) -> Self {
        if overwrite {
            Self::Overwrite
        } else {
            Self::Continue
        }
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(ConfigError::configuration(format!(
                "unknown processing mode '{}'",
                s
            ))),
        }
    }
}
