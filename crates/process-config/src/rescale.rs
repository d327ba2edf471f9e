//! Per-band rescale planning for raster to pyramid conversion.
//!
//! Decides how raw input values map onto the output data type:
//!
//! | mode          | per-band pair                         |
//! |---------------|---------------------------------------|
//! | `none`        | (absent, absent)                      |
//! | `dtype_scale` | theoretical range of the input dtype  |
//! | `minmax_scale`| empirical min/max, full band read     |
//! | `crop`        | (0, 255)                              |
//!
//! An 8-bit unsigned input is never rescaled, whatever mode was requested.

use raster_io::{RasterDataset, RasterInfo};
use serde::{Deserialize, Serialize};
use tile_common::DataType;
use tracing::{info, warn};

use crate::error::{ConfigError, Result};
use crate::output::OutputFormat;

/// Requested scaling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ScaleMode {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "dtype_scale")]
    DtypeRange,
    #[serde(rename = "minmax_scale")]
    MinMax,
    #[serde(rename = "crop")]
    Crop,
}

impl ScaleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DtypeRange => "dtype_scale",
            Self::MinMax => "minmax_scale",
            Self::Crop => "crop",
        }
    }
}

impl std::str::FromStr for ScaleMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" | "" => Ok(Self::None),
            "dtype_scale" | "dtype_range" => Ok(Self::DtypeRange),
            "minmax_scale" | "min_max" | "minmax" => Ok(Self::MinMax),
            "crop" => Ok(Self::Crop),
            _ => Err(ConfigError::configuration(format!(
                "unknown scale method '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input value range mapped onto the output range for one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl BandScale {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    /// A band that is passed through unchanged.
    pub fn unscaled() -> Self {
        Self {
            low: None,
            high: None,
        }
    }
}

/// Effective scale mode plus one pair per output band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalePlan {
    pub mode: ScaleMode,
    pub bands: Vec<BandScale>,
}

impl ScalePlan {
    pub fn unscaled(band_count: usize) -> Self {
        Self {
            mode: ScaleMode::None,
            bands: vec![BandScale::unscaled(); band_count],
        }
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

/// Output band layout derived from the input and the output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBands {
    pub count: usize,
    pub dtype: DataType,
    /// Whether bands were dropped to fit the output format.
    pub narrowed: bool,
}

/// Full result of analyzing one input raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RescaleAnalysis {
    pub input_dtype: DataType,
    pub output: OutputBands,
    pub plan: ScalePlan,
}

/// Derive the output band count and data type.
///
/// Formats limited to 3 bands get at most 3 bands of `uint8`; extra input
/// bands are dropped.
pub fn output_bands(info: &RasterInfo, format: OutputFormat) -> Result<OutputBands> {
    let dtype = info
        .dtype()
        .ok_or_else(|| ConfigError::configuration("input raster has no bands"))?;
    let count = info.band_count();

    match format.max_bands() {
        Some(max) if count > max => {
            warn!(
                input_bands = count,
                output_bands = max,
                format = %format,
                "Output format cannot hold all bands, narrowing to uint8"
            );
            Ok(OutputBands {
                count: max,
                dtype: DataType::Uint8,
                narrowed: true,
            })
        }
        _ => Ok(OutputBands {
            count,
            dtype,
            narrowed: false,
        }),
    }
}

/// Build the scale plan for an open raster.
///
/// `minmax_scale` reads every output band at full resolution.
pub fn analyze(
    dataset: &mut dyn RasterDataset,
    mode: ScaleMode,
    format: OutputFormat,
) -> Result<RescaleAnalysis> {
    let output = output_bands(dataset.info(), format)?;
    let input_dtype = first_band_dtype(dataset.info())?;

    if input_dtype.is_uint8() {
        return Ok(RescaleAnalysis {
            input_dtype,
            output,
            plan: ScalePlan::unscaled(output.count),
        });
    }

    let bands = match mode {
        ScaleMode::None => vec![BandScale::unscaled(); output.count],
        ScaleMode::DtypeRange => {
            let (low, high) = input_dtype
                .range()
                .ok_or_else(|| ConfigError::UnsupportedDataType(input_dtype.to_string()))?;
            vec![BandScale::new(low, high); output.count]
        }
        ScaleMode::MinMax => {
            info!(bands = output.count, "Computing band statistics for min/max scaling");
            (1..=output.count)
                .map(|index| -> Result<BandScale> {
                    let band = dataset.read_band(index)?;
                    Ok(band
                        .min_max()
                        .map(|(low, high)| BandScale::new(low, high))
                        .unwrap_or_else(BandScale::unscaled))
                })
                .collect::<Result<Vec<_>>>()?
        }
        ScaleMode::Crop => vec![BandScale::new(0.0, 255.0); output.count],
    };

    Ok(RescaleAnalysis {
        input_dtype,
        output,
        plan: ScalePlan { mode, bands },
    })
}

fn first_band_dtype(info: &RasterInfo) -> Result<DataType> {
    info.dtype()
        .ok_or_else(|| ConfigError::configuration("input raster has no bands"))
}
