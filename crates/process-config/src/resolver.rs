//! Job resolution.
//!
//! [`ConfigResolver`] turns a job description plus caller overrides into a
//! [`ResolvedConfig`]: a zoom range and one process area per zoom level.
//! Every check fails fast; a partially resolved configuration is never
//! returned.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use raster_io::RasterOpener;
use serde::Serialize;
use tile_common::BoundingBox;
use tracing::{debug, info};

use crate::area::{resolve_process_areas, ZoomInput};
use crate::error::{ConfigError, Result};
use crate::geometry::ProcessArea;
use crate::job::{
    bounds_from_values, InputKind, JobDescription, ProcessRef, PyramidSettings, BUILTIN_PROCESSES,
};
use crate::output::{OutputFormat, OutputSpec, ProcessingMode};
use crate::process::{ProcessConfig, ZoomConfig};
use crate::zoom::{resolve_zoom_levels, ZoomRange};

/// Caller-supplied values that take precedence over the job description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// Zero, one or two zoom levels.
    pub zoom: Vec<i64>,
    /// Exactly four values (minx, miny, maxx, maxy) when given.
    pub bounds: Option<Vec<f64>>,
    pub output_path: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
}

impl Overrides {
    pub fn zoom(zoom: impl Into<Vec<i64>>) -> Self {
        Self {
            zoom: zoom.into(),
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, bounds: impl Into<Vec<f64>>) -> Self {
        self.bounds = Some(bounds.into());
        self
    }
}

/// A fully resolved execution plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    /// Ascending, never empty.
    pub zoom_levels: Vec<u32>,
    /// One entry per zoom level; an empty area means nothing to process.
    pub process_area: BTreeMap<u32, ProcessArea>,
    pub bounds: Option<BoundingBox>,
    pub process: ProcessRef,
    pub output: Option<OutputSpec>,
    pub mode: ProcessingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pyramid: Option<PyramidSettings>,
}

impl ResolvedConfig {
    pub fn process_area(&self, zoom: u32) -> Option<&ProcessArea> {
        self.process_area.get(&zoom)
    }

    pub fn zoom_range(&self) -> ZoomRange {
        let first = self.zoom_levels.first().copied().unwrap_or_default();
        let last = self.zoom_levels.last().copied().unwrap_or(first);
        ZoomRange::new(first, last)
    }
}

/// Resolves job descriptions against a raster collaborator.
///
/// Holds no state between calls; every resolution reads its inputs afresh.
pub struct ConfigResolver<'a> {
    rasters: &'a dyn RasterOpener,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(rasters: &'a dyn RasterOpener) -> Self {
        Self { rasters }
    }

    /// Read and resolve a job description file.
    pub fn resolve_file(&self, path: impl AsRef<Path>, overrides: &Overrides) -> Result<ResolvedConfig> {
        let job = JobDescription::from_file(path)?;
        self.resolve(&job, overrides)
    }

    /// Resolve a parsed job description.
    pub fn resolve(&self, job: &JobDescription, overrides: &Overrides) -> Result<ResolvedConfig> {
        let stack: Vec<PathBuf> = job.source.iter().cloned().collect();
        self.resolve_nested(job, overrides, &stack)
    }

    fn resolve_nested(
        &self,
        job: &JobDescription,
        overrides: &Overrides,
        stack: &[PathBuf],
    ) -> Result<ResolvedConfig> {
        if let Some(source) = &job.source {
            if !source.is_file() {
                return Err(ConfigError::not_found("job description", source));
            }
        }
        check_process(job)?;

        let zoom = resolve_zoom_levels(&overrides.zoom, &job.zoom)?;
        let zoom_levels: Vec<u32> = zoom.levels().collect();

        let view = ProcessConfig::new(job, self.rasters);
        for &level in &zoom_levels {
            if !view.is_valid_at_zoom(level) {
                return Err(ConfigError::InvalidAtZoom {
                    zoom: level,
                    explanation: view.explain_validity_at_zoom(level),
                });
            }
        }

        let bounds = match &overrides.bounds {
            Some(values) => Some(bounds_from_values(values)?),
            None => job.bounds,
        };

        let configs = zoom_levels
            .iter()
            .map(|&level| view.at_zoom(level))
            .collect::<Result<Vec<ZoomConfig>>>()?;
        let inputs_by_zoom = self.footprints(&configs, stack)?;
        let process_area = resolve_process_areas(&zoom_levels, &inputs_by_zoom, bounds.as_ref());

        info!(
            job = %job.name(),
            minzoom = zoom.min,
            maxzoom = zoom.max,
            bounds = ?bounds.map(|b| b.to_array()),
            "Resolved job configuration"
        );

        Ok(ResolvedConfig {
            zoom_levels,
            process_area,
            bounds,
            process: job.process.clone(),
            output: resolve_output(job.output.as_ref(), overrides)?,
            mode: job.mode,
            pyramid: job.pyramid.clone(),
        })
    }

    /// Footprint of every input at every zoom.
    ///
    /// Each distinct raster is opened once.
    fn footprints(
        &self,
        configs: &[ZoomConfig],
        stack: &[PathBuf],
    ) -> Result<BTreeMap<u32, Vec<ZoomInput>>> {
        let mut raster_paths: Vec<&Path> = configs
            .iter()
            .flat_map(ZoomConfig::active_inputs)
            .filter(|input| input.kind == InputKind::Raster)
            .map(|input| input.path.as_path())
            .collect();
        raster_paths.sort();
        raster_paths.dedup();

        let raster_bounds = raster_paths
            .par_iter()
            .map(|path| -> Result<(PathBuf, BoundingBox)> {
                let dataset = self.rasters.open(path)?;
                let bounds = dataset.info().bounds;
                debug!(path = %path.display(), bounds = ?bounds.to_array(), "Read raster bounds");
                Ok((path.to_path_buf(), bounds))
            })
            .collect::<Result<HashMap<PathBuf, BoundingBox>>>()?;

        let mut inputs_by_zoom = BTreeMap::new();
        for config in configs {
            let mut inputs = Vec::with_capacity(config.input_files.len());
            for (name, input) in &config.input_files {
                let zoom_input = match input {
                    None => ZoomInput::unused(name.clone()),
                    Some(input) => match input.kind {
                        InputKind::Raster => match raster_bounds.get(&input.path) {
                            Some(bounds) => ZoomInput::bounds(name.clone(), *bounds),
                            None => ZoomInput::unused(name.clone()),
                        },
                        InputKind::Job => ZoomInput::area(
                            name.clone(),
                            self.nested_area(&input.path, config.zoom, stack)?,
                        ),
                    },
                };
                inputs.push(zoom_input);
            }
            inputs_by_zoom.insert(config.zoom, inputs);
        }
        Ok(inputs_by_zoom)
    }

    /// Process area of a nested job at one zoom level.
    fn nested_area(&self, path: &Path, zoom: u32, stack: &[PathBuf]) -> Result<ProcessArea> {
        let path = path.canonicalize()?;
        if stack.contains(&path) {
            return Err(ConfigError::configuration(format!(
                "circular job reference: {}",
                path.display()
            )));
        }

        let mut nested_stack = stack.to_vec();
        nested_stack.push(path.clone());

        let job = JobDescription::from_file(&path)?;
        let resolved = self.resolve_nested(&job, &Overrides::zoom([i64::from(zoom)]), &nested_stack)?;
        let area = resolved.process_area(zoom).cloned().unwrap_or_default();
        debug!(path = %path.display(), zoom, area = area.area(), "Resolved nested job area");
        Ok(area)
    }
}

fn check_process(job: &JobDescription) -> Result<()> {
    match &job.process {
        ProcessRef::File(_) => {
            let path = job.process_path().unwrap_or_default();
            if !path.is_file() {
                return Err(ConfigError::not_found("process file", path));
            }
        }
        ProcessRef::Builtin(name) => {
            if !BUILTIN_PROCESSES.contains(&name.as_str()) {
                return Err(ConfigError::configuration(format!(
                    "unknown built-in process '{}'",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn resolve_output(output: Option<&OutputSpec>, overrides: &Overrides) -> Result<Option<OutputSpec>> {
    let mut output = match (output, &overrides.output_path) {
        (Some(output), _) => output.clone(),
        (None, Some(path)) => OutputSpec {
            path: path.clone(),
            format: OutputFormat::default(),
            bands: None,
            dtype: None,
        },
        (None, None) if overrides.output_format.is_some() => {
            return Err(ConfigError::configuration(
                "output format override given but job declares no output and no output path",
            ))
        }
        (None, None) => return Ok(None),
    };
    if let Some(path) = &overrides.output_path {
        output.path = path.clone();
    }
    if let Some(format) = overrides.output_format {
        output.format = format;
    }
    Ok(Some(output))
}
