//! Raster to pyramid conversion.
//!
//! Builds a synthetic job that runs the built-in `tilify` process over a
//! single input raster, resolves it like any other job and hands it to an
//! [`ExecutionEngine`].

use std::path::{Path, PathBuf};

use raster_io::RasterOpener;
use tile_common::PyramidType;
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::job::{
    bounds_from_values, Baselevel, InputEntry, JobDescription, ProcessRef, PyramidSettings,
    Resampling,
};
use crate::output::{OutputFormat, OutputSpec, ProcessingMode};
use crate::rescale::{analyze, ScaleMode};
use crate::resolver::{ConfigResolver, Overrides, ResolvedConfig};
use crate::zoom::{resolve_pyramid_zoom, ZoomFields, ZoomRange};

/// Built-in process that cuts a raster into tiles.
pub const TILIFY_PROCESS: &str = "tilify";

/// Pixels read around each tile to avoid resampling seams.
pub const PIXELBUFFER: u32 = 5;

/// Logical name of the input raster in pyramid jobs.
pub const RASTER_INPUT: &str = "raster";

/// Options of a raster to pyramid conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PyramidOptions {
    pub pyramid_type: PyramidType,
    pub scale_method: ScaleMode,
    pub output_format: OutputFormat,
    pub resampling: Resampling,
    /// Zero, one or two zoom levels; empty means 1 up to the best zoom.
    pub zoom: Vec<i64>,
    pub bounds: Option<Vec<f64>>,
    pub overwrite: bool,
}

/// Runs a resolved job.
pub trait ExecutionEngine {
    /// Process every tile of `config` within `zoom`.
    fn batch_process(
        &self,
        job: &JobDescription,
        config: &ResolvedConfig,
        zoom: ZoomRange,
    ) -> anyhow::Result<()>;
}

/// Builds raster to pyramid jobs.
pub struct PyramidJobBuilder<'a> {
    rasters: &'a dyn RasterOpener,
}

impl<'a> PyramidJobBuilder<'a> {
    pub fn new(rasters: &'a dyn RasterOpener) -> Self {
        Self { rasters }
    }

    /// Build the job description for converting `input` into a pyramid in
    /// `output_dir`.
    ///
    /// The input raster is opened once and released before returning.
    pub fn build(
        &self,
        input: &Path,
        output_dir: &Path,
        options: &PyramidOptions,
    ) -> Result<JobDescription> {
        if !self.rasters.exists(input) {
            return Err(ConfigError::not_found("input raster", input));
        }
        let base_dir = std::env::current_dir()?;

        let mut dataset = self.rasters.open(input)?;
        let raster = dataset.info().clone();

        let zoom = resolve_pyramid_zoom(&options.zoom, || {
            Ok(options
                .pyramid_type
                .best_zoom_for_resolution(&raster.bounds, raster.width, raster.height))
        })?;
        let analysis = analyze(dataset.as_mut(), options.scale_method, options.output_format)?;
        drop(dataset);

        // undeclared nodata and 0 are treated alike
        let nodata = raster.nodata().unwrap_or(0.0);
        let bounds = options
            .bounds
            .as_deref()
            .map(bounds_from_values)
            .transpose()?;

        let mut job = JobDescription::new(ProcessRef::Builtin(TILIFY_PROCESS.to_string()), base_dir);
        job.zoom = ZoomFields {
            zoom: None,
            minzoom: Some(i64::from(zoom.min)),
            maxzoom: Some(i64::from(zoom.max)),
        };
        job.bounds = bounds;
        job.input_files = vec![InputEntry::path(RASTER_INPUT, input)];
        job.output = Some(OutputSpec {
            path: job.resolve_path(output_dir),
            format: options.output_format,
            bands: Some(analysis.output.count),
            dtype: Some(analysis.output.dtype),
        });
        job.mode = ProcessingMode::from_overwrite(options.overwrite);
        job.pyramid = Some(PyramidSettings {
            grid: options.pyramid_type,
            pixelbuffer: PIXELBUFFER,
            resampling: options.resampling,
            scale: analysis.plan,
            nodata,
            baselevel: Baselevel {
                zoom: zoom.max,
                resampling: options.resampling,
            },
        });

        info!(
            input = %input.display(),
            grid = %options.pyramid_type,
            minzoom = zoom.min,
            maxzoom = zoom.max,
            bands = analysis.output.count,
            dtype = %analysis.output.dtype,
            "Built pyramid job"
        );
        Ok(job)
    }
}

/// Convert a raster into a tile pyramid.
///
/// Builds and resolves the job, creates the output directory if needed and
/// runs the engine over the job's zoom range.
pub fn raster_to_pyramid(
    rasters: &dyn RasterOpener,
    engine: &dyn ExecutionEngine,
    input: &Path,
    output_dir: &Path,
    options: &PyramidOptions,
) -> Result<ResolvedConfig> {
    let job = PyramidJobBuilder::new(rasters).build(input, output_dir, options)?;
    let overrides = Overrides {
        zoom: options.zoom.clone(),
        bounds: options.bounds.clone(),
        ..Overrides::default()
    };
    let resolved = ConfigResolver::new(rasters).resolve(&job, &overrides)?;

    let output_dir: PathBuf = resolved
        .output
        .as_ref()
        .map(|output| output.path.clone())
        .unwrap_or_else(|| output_dir.to_path_buf());
    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir)?;
    }

    engine.batch_process(&job, &resolved, resolved.zoom_range())?;
    Ok(resolved)
}
