//! Zoom-indexed view over a job description.
//!
//! Any value in a job may depend on the zoom level:
//!
//! ```yaml
//! input_files:
//!   file1:
//!     zoom>=10: dummy1.tif
//!     zoom<10: dummy2.tif
//! some_parameter:
//!   zoom<=10: string1
//!   zoom>10: string2
//! ```
//!
//! The first matching condition wins; no match means the value is absent at
//! that zoom.

use std::path::PathBuf;
use std::str::FromStr;

use raster_io::RasterOpener;
use serde_yaml::Value;

use crate::error::{ConfigError, Result};
use crate::job::{InputKind, JobDescription};

/// Comparison operator of a zoom condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed `zoom<op><n>` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomCondition {
    pub op: ZoomOp,
    pub zoom: u32,
}

impl ZoomCondition {
    pub fn matches(&self, zoom: u32) -> bool {
        match self.op {
            ZoomOp::Eq => zoom == self.zoom,
            ZoomOp::Lt => zoom < self.zoom,
            ZoomOp::Le => zoom <= self.zoom,
            ZoomOp::Gt => zoom > self.zoom,
            ZoomOp::Ge => zoom >= self.zoom,
        }
    }
}

impl FromStr for ZoomCondition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || ConfigError::configuration(format!("malformed zoom condition '{}'", s));
        let rest = s.trim().strip_prefix("zoom").ok_or_else(malformed)?.trim_start();

        // two-character operators first
        let (op, number) = [
            (">=", ZoomOp::Ge),
            ("<=", ZoomOp::Le),
            ("==", ZoomOp::Eq),
            ("=", ZoomOp::Eq),
            ("<", ZoomOp::Lt),
            (">", ZoomOp::Gt),
        ]
        .iter()
        .find_map(|(token, op)| rest.strip_prefix(token).map(|n| (*op, n)))
        .ok_or_else(malformed)?;

        let zoom = number.trim().parse::<u32>().map_err(|_| malformed())?;
        Ok(Self { op, zoom })
    }
}

fn is_conditional(value: &Value) -> bool {
    match value {
        Value::Mapping(map) => {
            !map.is_empty()
                && map
                    .keys()
                    .all(|k| k.as_str().map(|s| s.trim_start().starts_with("zoom")).unwrap_or(false))
        }
        _ => false,
    }
}

/// Resolve a possibly zoom-conditional value. `None` means absent.
pub fn value_at_zoom(value: &Value, zoom: u32) -> Result<Option<&Value>> {
    if !is_conditional(value) {
        return Ok(Some(value).filter(|v| !v.is_null()));
    }
    let Value::Mapping(map) = value else {
        return Ok(None);
    };
    for (key, candidate) in map {
        let condition: ZoomCondition = key.as_str().unwrap_or_default().parse()?;
        if condition.matches(zoom) {
            return Ok(Some(candidate).filter(|v| !v.is_null()));
        }
    }
    Ok(None)
}

/// An input resolved at one zoom level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRasterRef {
    pub name: String,
    /// Absolute path.
    pub path: PathBuf,
    pub kind: InputKind,
}

/// Job parameters resolved at one zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomConfig {
    pub zoom: u32,
    /// Input table in file order; `None` marks an input unused at this zoom.
    pub input_files: Vec<(String, Option<InputRasterRef>)>,
    /// Free-form parameters present at this zoom, in file order.
    pub params: Vec<(String, Value)>,
}

impl ZoomConfig {
    pub fn input(&self, name: &str) -> Option<&InputRasterRef> {
        self.input_files
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, input)| input.as_ref())
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Inputs that are used at this zoom.
    pub fn active_inputs(&self) -> impl Iterator<Item = &InputRasterRef> {
        self.input_files.iter().filter_map(|(_, input)| input.as_ref())
    }
}

/// Zoom-indexed process configuration.
pub struct ProcessConfig<'a> {
    job: &'a JobDescription,
    rasters: &'a dyn RasterOpener,
}

impl<'a> ProcessConfig<'a> {
    pub fn new(job: &'a JobDescription, rasters: &'a dyn RasterOpener) -> Self {
        Self { job, rasters }
    }

    pub fn job(&self) -> &JobDescription {
        self.job
    }

    pub fn is_valid_at_zoom(&self, zoom: u32) -> bool {
        self.problems_at_zoom(zoom).is_empty()
    }

    /// Human-readable validity report for one zoom level.
    pub fn explain_validity_at_zoom(&self, zoom: u32) -> String {
        let problems = self.problems_at_zoom(zoom);
        if problems.is_empty() {
            format!("valid at zoom {}", zoom)
        } else {
            problems.join("; ")
        }
    }

    /// Resolve inputs and parameters at one zoom level.
    pub fn at_zoom(&self, zoom: u32) -> Result<ZoomConfig> {
        let input_files = self
            .job
            .input_files
            .iter()
            .map(|entry| -> Result<(String, Option<InputRasterRef>)> {
                Ok((entry.name.clone(), self.input_at_zoom(&entry.name, &entry.value, zoom)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut params = Vec::with_capacity(self.job.params.len());
        for (key, value) in &self.job.params {
            let name = param_name(key)?;
            if let Some(value) = value_at_zoom(value, zoom)? {
                params.push((name, value.clone()));
            }
        }

        Ok(ZoomConfig {
            zoom,
            input_files,
            params,
        })
    }

    fn input_at_zoom(&self, name: &str, value: &Value, zoom: u32) -> Result<Option<InputRasterRef>> {
        let Some(value) = value_at_zoom(value, zoom)? else {
            return Ok(None);
        };
        let path = value.as_str().ok_or_else(|| {
            ConfigError::configuration(format!("input '{}' must be a path", name))
        })?;
        let path = self.job.resolve_path(path);
        Ok(Some(InputRasterRef {
            name: name.to_string(),
            kind: InputKind::from_path(&path),
            path,
        }))
    }

    fn problems_at_zoom(&self, zoom: u32) -> Vec<String> {
        let mut problems = Vec::new();

        for entry in &self.job.input_files {
            match self.input_at_zoom(&entry.name, &entry.value, zoom) {
                Err(e) => problems.push(format!("input '{}': {}", entry.name, e)),
                Ok(None) => {}
                Ok(Some(input)) => match input.kind {
                    InputKind::Raster if !self.rasters.exists(&input.path) => problems.push(
                        format!("input '{}': raster not found: {}", input.name, input.path.display()),
                    ),
                    InputKind::Job if !input.path.is_file() => problems.push(format!(
                        "input '{}': job description not found: {}",
                        input.name,
                        input.path.display()
                    )),
                    _ => {}
                },
            }
        }

        for (key, value) in &self.job.params {
            let checked = param_name(key).and_then(|_| value_at_zoom(value, zoom).map(|_| ()));
            if let Err(e) = checked {
                problems.push(format!("parameter {:?}: {}", key.as_str().unwrap_or("?"), e));
            }
        }

        problems
    }
}

fn param_name(key: &Value) -> Result<String> {
    key.as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::configuration("parameter names must be strings"))
}
