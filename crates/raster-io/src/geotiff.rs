//! GeoTIFF backend.
//!
//! Reads georeferencing from the GeoTIFF model tags (pixel scale + tiepoint,
//! or a non-rotated model transformation) and nodata from the GDAL nodata
//! tag. Only chunky (pixel interleaved) layouts are supported.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use tile_common::{BoundingBox, DataType};

use crate::dataset::{BandData, RasterDataset, RasterInfo, RasterOpener};
use crate::error::{RasterError, Result};

const SAMPLE_FORMAT_UINT: u16 = 1;
const SAMPLE_FORMAT_INT: u16 = 2;
const SAMPLE_FORMAT_FLOAT: u16 = 3;
const PLANAR_CHUNKY: u16 = 1;

/// Opens GeoTIFF files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffOpener;

impl RasterOpener for GeoTiffOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>> {
        Ok(Box::new(GeoTiffDataset::open(path)?))
    }
}

/// An open GeoTIFF file.
pub struct GeoTiffDataset {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    info: RasterInfo,
    /// Interleaved samples, decoded on the first band read.
    samples: Option<Vec<f64>>,
}

impl GeoTiffDataset {
    /// Open a GeoTIFF and read its metadata.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(RasterError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let mut decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| RasterError::open(path, e.to_string()))?;

        let info = read_info(&mut decoder).map_err(|e| match e {
            RasterError::Decode(msg) => RasterError::open(path, msg),
            other => other,
        })?;

        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            bands = info.band_count(),
            dtype = ?info.dtype(),
            "Opened GeoTIFF"
        );

        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            info,
            samples: None,
        })
    }

    fn samples(&mut self) -> Result<&[f64]> {
        if self.samples.is_none() {
            debug!(path = %self.path.display(), "Decoding GeoTIFF image data");
            let decoded = self.decoder.read_image()?;
            self.samples = Some(decoding_result_to_f64(decoded)?);
        }
        Ok(self.samples.as_deref().unwrap_or_default())
    }
}

impl RasterDataset for GeoTiffDataset {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_band(&mut self, index: usize) -> Result<BandData> {
        self.info.check_band(index)?;
        let band_count = self.info.band_count();
        let width = self.info.width as usize;
        let height = self.info.height as usize;

        let samples = self.samples()?;
        let expected = width * height * band_count;
        if samples.len() < expected {
            return Err(RasterError::Decode(format!(
                "expected {} samples, decoded {}",
                expected,
                samples.len()
            )));
        }

        let values = samples
            .iter()
            .skip(index - 1)
            .step_by(band_count)
            .take(width * height)
            .copied()
            .collect();

        Ok(BandData::new(width, height, values))
    }
}

fn read_info(decoder: &mut Decoder<BufReader<File>>) -> Result<RasterInfo> {
    let (width, height) = decoder.dimensions()?;

    let planar = decoder
        .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
        .unwrap_or(PLANAR_CHUNKY);
    if planar != PLANAR_CHUNKY {
        return Err(RasterError::Unsupported(
            "planar (band sequential) GeoTIFF layout".to_string(),
        ));
    }

    let band_count = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1) as usize;
    let bits = decoder
        .find_tag_unsigned_vec::<u16>(Tag::BitsPerSample)?
        .unwrap_or_else(|| vec![1]);
    let formats = decoder
        .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)?
        .unwrap_or_else(|| vec![SAMPLE_FORMAT_UINT]);

    let dtypes = (0..band_count)
        .map(|band| {
            // Single-valued tags apply to every sample.
            let bits = bits.get(band).or(bits.first()).copied().unwrap_or(1);
            let format = formats
                .get(band)
                .or(formats.first())
                .copied()
                .unwrap_or(SAMPLE_FORMAT_UINT);
            sample_data_type(format, bits)
        })
        .collect::<Result<Vec<_>>>()?;

    let nodata = match decoder.find_tag(Tag::GdalNodata)? {
        Some(value) => parse_nodata(&value.into_string()?),
        None => None,
    };

    let bounds = read_bounds(decoder, width, height)?;

    Ok(RasterInfo {
        width,
        height,
        dtypes,
        nodatavals: vec![nodata; band_count],
        bounds,
    })
}

fn read_bounds(
    decoder: &mut Decoder<BufReader<File>>,
    width: u32,
    height: u32,
) -> Result<BoundingBox> {
    let (origin_x, origin_y, scale_x, scale_y) =
        if let Some(scale) = decoder.find_tag(Tag::ModelPixelScaleTag)? {
            let scale = scale.into_f64_vec()?;
            let tiepoint = decoder
                .find_tag(Tag::ModelTiepointTag)?
                .ok_or_else(|| RasterError::Decode("pixel scale without tiepoint".to_string()))?
                .into_f64_vec()?;
            if scale.len() < 2 || tiepoint.len() < 6 {
                return Err(RasterError::Decode("malformed GeoTIFF model tags".to_string()));
            }
            // Tiepoint maps raster (i, j) to model (x, y).
            let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
            (x - i * scale[0], y + j * scale[1], scale[0], scale[1])
        } else if let Some(transform) = decoder.find_tag(Tag::ModelTransformationTag)? {
            let t = transform.into_f64_vec()?;
            if t.len() < 16 {
                return Err(RasterError::Decode(
                    "malformed GeoTIFF model transformation".to_string(),
                ));
            }
            if t[1] != 0.0 || t[4] != 0.0 {
                return Err(RasterError::Unsupported(
                    "rotated model transformation".to_string(),
                ));
            }
            (t[3], t[7], t[0], -t[5])
        } else {
            return Err(RasterError::Decode("missing georeferencing tags".to_string()));
        };

    let left = origin_x;
    let top = origin_y;
    let right = left + width as f64 * scale_x;
    let bottom = top - height as f64 * scale_y;

    Ok(BoundingBox::new(left, bottom, right, top))
}

fn sample_data_type(format: u16, bits: u16) -> Result<DataType> {
    match (format, bits) {
        (SAMPLE_FORMAT_UINT, 8) => Ok(DataType::Uint8),
        (SAMPLE_FORMAT_UINT, 16) => Ok(DataType::Uint16),
        (SAMPLE_FORMAT_UINT, 32) => Ok(DataType::Uint32),
        (SAMPLE_FORMAT_UINT, 64) => Ok(DataType::Uint64),
        (SAMPLE_FORMAT_INT, 8) => Ok(DataType::Int8),
        (SAMPLE_FORMAT_INT, 16) => Ok(DataType::Int16),
        (SAMPLE_FORMAT_INT, 32) => Ok(DataType::Int32),
        (SAMPLE_FORMAT_INT, 64) => Ok(DataType::Int64),
        (SAMPLE_FORMAT_FLOAT, 32) => Ok(DataType::Float32),
        (SAMPLE_FORMAT_FLOAT, 64) => Ok(DataType::Float64),
        _ => Err(RasterError::Unsupported(format!(
            "sample format {} with {} bits",
            format, bits
        ))),
    }
}

/// GDAL writes nodata as a NUL-terminated ASCII number.
fn parse_nodata(raw: &str) -> Option<f64> {
    raw.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse()
        .ok()
}

fn decoding_result_to_f64(result: DecodingResult) -> Result<Vec<f64>> {
    #[allow(unreachable_patterns)]
    let values = match result {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        _ => {
            return Err(RasterError::Unsupported(
                "decoded sample type".to_string(),
            ))
        }
    };
    Ok(values)
}
