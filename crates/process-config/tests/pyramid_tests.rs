//! Raster to pyramid conversion through the full resolution path.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use process_config::{
    raster_to_pyramid, BandScale, ConfigError, ExecutionEngine, JobDescription, OutputFormat,
    ProcessingMode, PyramidOptions, ResolvedConfig, ScaleMode, ZoomRange,
};
use raster_io::{GeoTiffOpener, MemoryRasters};
use test_utils::{bbox, dummy_raster, JobDir};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tile_common::{BoundingBox, DataType, PyramidType};

/// Remembers every batch it was asked to run.
#[derive(Default)]
struct RecordingEngine {
    runs: Mutex<Vec<(JobDescription, ZoomRange)>>,
}

impl ExecutionEngine for RecordingEngine {
    fn batch_process(
        &self,
        job: &JobDescription,
        _config: &ResolvedConfig,
        zoom: ZoomRange,
    ) -> anyhow::Result<()> {
        self.runs.lock().unwrap().push((job.clone(), zoom));
        Ok(())
    }
}

struct FailingEngine;

impl ExecutionEngine for FailingEngine {
    fn batch_process(&self, _: &JobDescription, _: &ResolvedConfig, _: ZoomRange) -> anyhow::Result<()> {
        anyhow::bail!("worker pool unavailable")
    }
}

fn write_uint16(path: &Path, width: u32, height: u32, origin: (f64, f64), scale: f64) {
    let data: Vec<u16> = (0..width * height).map(|v| (v * 100) as u16 + 7).collect();
    let file = File::create(path).expect("create tiff");
    let mut encoder = TiffEncoder::new(file).expect("tiff encoder");
    let mut image = encoder
        .new_image::<colortype::Gray16>(width, height)
        .expect("new image");
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &[scale, scale, 0.0][..])
        .expect("pixel scale");
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, origin.0, origin.1, 0.0][..])
        .expect("tiepoint");
    image.write_data(&data).expect("write data");
}

#[test]
fn test_pyramid_runs_engine_over_zoom_range() {
    let dir = JobDir::new();
    let input = dir.join("dummy1.tif");
    let output = dir.join("out/pyramid");
    let rasters = MemoryRasters::new().with(&input, dummy_raster(bbox::DUMMY1, DataType::Uint8, 3));
    let engine = RecordingEngine::default();

    let resolved =
        raster_to_pyramid(&rasters, &engine, &input, &output, &PyramidOptions::default()).unwrap();

    assert!(output.is_dir());
    assert_eq!(resolved.zoom_levels, (1..=6).collect::<Vec<_>>());
    for area in resolved.process_area.values() {
        assert!(area.equals_topo(&process_config::ProcessArea::from_bbox(&bbox::DUMMY1)));
    }

    let runs = engine.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    let (job, zoom) = &runs[0];
    assert_eq!(*zoom, ZoomRange::new(1, 6));
    assert_eq!(job.mode, ProcessingMode::Continue);

    let settings = job.pyramid.as_ref().unwrap();
    assert_eq!(settings.scale.mode, ScaleMode::None);
    assert_eq!(settings.scale.bands, vec![BandScale::unscaled(); 3]);
}

#[test]
fn test_uint8_input_ignores_requested_scaling() {
    let dir = JobDir::new();
    let input = dir.join("rgb.tif");
    let rasters = MemoryRasters::new().with(&input, dummy_raster(bbox::DUMMY2, DataType::Uint8, 3));
    let options = PyramidOptions {
        scale_method: ScaleMode::MinMax,
        zoom: vec![3],
        ..PyramidOptions::default()
    };
    let engine = RecordingEngine::default();

    let resolved = raster_to_pyramid(&rasters, &engine, &input, &dir.join("out"), &options).unwrap();
    let settings = resolved.pyramid.unwrap();
    assert_eq!(settings.scale.mode, ScaleMode::None);
    assert!(settings.scale.bands.iter().all(|b| b.low.is_none() && b.high.is_none()));
}

#[test]
fn test_pyramid_bounds_and_overwrite() {
    let dir = JobDir::new();
    let input = dir.join("dummy1.tif");
    let rasters = MemoryRasters::new().with(&input, dummy_raster(bbox::DUMMY1, DataType::Uint8, 1));
    let options = PyramidOptions {
        pyramid_type: PyramidType::Mercator,
        zoom: vec![4, 2],
        bounds: Some(vec![2.0, 3.0, 3.0, 4.0]),
        overwrite: true,
        ..PyramidOptions::default()
    };
    let engine = RecordingEngine::default();

    let resolved = raster_to_pyramid(&rasters, &engine, &input, &dir.join("out"), &options).unwrap();
    assert_eq!(resolved.zoom_levels, vec![2, 3, 4]);
    assert_eq!(resolved.mode, ProcessingMode::Overwrite);
    assert_eq!(resolved.pyramid.as_ref().unwrap().grid, PyramidType::Mercator);
    let expected = process_config::ProcessArea::from_bbox(&BoundingBox::new(2.0, 3.0, 3.0, 4.0));
    assert!(resolved.process_area(3).unwrap().equals_topo(&expected));
}

#[test]
fn test_engine_failure_is_reported() {
    let dir = JobDir::new();
    let input = dir.join("dummy1.tif");
    let rasters = MemoryRasters::new().with(&input, dummy_raster(bbox::DUMMY1, DataType::Uint8, 1));
    let options = PyramidOptions {
        zoom: vec![2],
        ..PyramidOptions::default()
    };

    let err = raster_to_pyramid(&rasters, &FailingEngine, &input, &dir.join("out"), &options)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Execution(_)));
    assert!(err.to_string().contains("worker pool unavailable"));
}

#[test]
fn test_geotiff_minmax_png() {
    let dir = JobDir::new();
    let input = dir.join("dem.tif");
    write_uint16(&input, 4, 12, (2.0, 4.0), 0.25);

    let options = PyramidOptions {
        scale_method: ScaleMode::MinMax,
        output_format: OutputFormat::Png,
        zoom: vec![5],
        ..PyramidOptions::default()
    };
    let engine = RecordingEngine::default();

    let resolved =
        raster_to_pyramid(&GeoTiffOpener, &engine, &input, &dir.join("tiles"), &options).unwrap();

    let output = resolved.output.as_ref().unwrap();
    assert_eq!(output.format, OutputFormat::Png);
    assert_eq!(output.bands, Some(1));
    assert_eq!(output.dtype, Some(DataType::Uint16));

    let settings = resolved.pyramid.as_ref().unwrap();
    assert_eq!(settings.scale.mode, ScaleMode::MinMax);
    assert_eq!(settings.scale.bands, vec![BandScale::new(7.0, 4707.0)]);
    assert_eq!(settings.nodata, 0.0);
    assert!(resolved
        .process_area(5)
        .unwrap()
        .equals_topo(&process_config::ProcessArea::from_bbox(&bbox::DUMMY1)));
}
