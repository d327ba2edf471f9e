//! Job descriptions.
//!
//! A job description names a process, its inputs, zoom fields, bounds and
//! free-form parameters. It is read from a YAML file or built in code (see
//! [`crate::pyramid::PyramidJobBuilder`]) and never modified afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tile_common::{BoundingBox, PyramidType};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::output::{OutputSpec, ProcessingMode};
use crate::rescale::ScalePlan;
use crate::zoom::ZoomFields;

/// Process implementations that ship with the executor.
pub const BUILTIN_PROCESSES: &[&str] = &["tilify"];

/// File extensions marking an input as a nested job description.
pub const JOB_EXTENSIONS: &[&str] = &["mapchete", "yaml", "yml"];

const RESERVED_KEYS: &[&str] = &[
    "process_file",
    "process",
    "process_zoom",
    "process_minzoom",
    "process_maxzoom",
    "process_bounds",
    "input_files",
    "output",
    "mode",
];

/// Reference to the process logic a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessRef {
    /// A process file, absolute or relative to the job's directory.
    File(PathBuf),
    /// A built-in process by name.
    Builtin(String),
}

/// What an input path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Raster,
    Job,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Self {
        let is_job = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| JOB_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_job {
            Self::Job
        } else {
            Self::Raster
        }
    }
}

/// One row of the input table, kept unresolved.
///
/// The value is a path string, null, or a zoom-conditional mapping of those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEntry {
    pub name: String,
    pub value: Value,
}

impl InputEntry {
    pub fn path(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            value: Value::String(path.as_ref().to_string_lossy().into_owned()),
        }
    }
}

/// Resampling method for pyramid levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
}

impl Resampling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Cubic => "cubic",
            Self::CubicSpline => "cubic_spline",
            Self::Lanczos => "lanczos",
            Self::Average => "average",
            Self::Mode => "mode",
        }
    }
}

impl std::str::FromStr for Resampling {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "cubic" => Ok(Self::Cubic),
            "cubic_spline" | "cubicspline" => Ok(Self::CubicSpline),
            "lanczos" => Ok(Self::Lanczos),
            "average" => Ok(Self::Average),
            "mode" => Ok(Self::Mode),
            _ => Err(ConfigError::configuration(format!(
                "unknown resampling method '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Resampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zoom level that is rendered from source data; coarser levels are
/// resampled from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baselevel {
    pub zoom: u32,
    pub resampling: Resampling,
}

/// Settings only present on raster to pyramid jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidSettings {
    pub grid: PyramidType,
    pub pixelbuffer: u32,
    pub resampling: Resampling,
    pub scale: ScalePlan,
    pub nodata: f64,
    pub baselevel: Baselevel,
}

/// A parsed job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    /// File the job was read from; `None` for jobs built in code.
    pub source: Option<PathBuf>,
    /// Directory relative paths are resolved against.
    pub base_dir: PathBuf,
    pub process: ProcessRef,
    pub zoom: ZoomFields,
    pub bounds: Option<BoundingBox>,
    /// Input table in file order.
    pub input_files: Vec<InputEntry>,
    pub output: Option<OutputSpec>,
    pub mode: ProcessingMode,
    pub pyramid: Option<PyramidSettings>,
    /// Every key not interpreted above, in file order.
    pub params: Mapping,
}

impl JobDescription {
    /// An empty job rooted at `base_dir`.
    pub fn new(process: ProcessRef, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: None,
            base_dir: base_dir.into(),
            process,
            zoom: ZoomFields::default(),
            bounds: None,
            input_files: Vec::new(),
            output: None,
            mode: ProcessingMode::default(),
            pyramid: None,
            params: Mapping::new(),
        }
    }

    /// Read a job description file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::not_found("job description", path));
        }
        let path = path.canonicalize()?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        debug!(path = %path.display(), "Reading job description");
        let text = std::fs::read_to_string(&path)?;
        let mut job = Self::from_yaml_str(&text, base_dir)?;
        job.source = Some(path);
        Ok(job)
    }

    /// Parse a job description from YAML text.
    pub fn from_yaml_str(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let raw: Value = serde_yaml::from_str(text)?;
        let map = match raw {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => {
                return Err(ConfigError::configuration(
                    "job description must be a mapping",
                ))
            }
        };
        Self::from_mapping(map, base_dir.into())
    }

    fn from_mapping(map: Mapping, base_dir: PathBuf) -> Result<Self> {
        let process = match (map.get("process_file"), map.get("process")) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::configuration(
                    "only one of 'process_file' and 'process' may be given",
                ))
            }
            (Some(file), None) => ProcessRef::File(PathBuf::from(string_field(
                "process_file",
                file,
            )?)),
            (None, Some(name)) => ProcessRef::Builtin(string_field("process", name)?),
            (None, None) => {
                return Err(ConfigError::configuration(
                    "'process_file' parameter is missing",
                ))
            }
        };

        let zoom = ZoomFields {
            zoom: int_field(&map, "process_zoom")?,
            minzoom: int_field(&map, "process_minzoom")?,
            maxzoom: int_field(&map, "process_maxzoom")?,
        };

        let bounds = match map.get("process_bounds") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_bounds(value)?),
        };

        let input_files = match map.get("input_files") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Mapping(entries)) => entries
                .iter()
                .map(|(name, value)| -> Result<InputEntry> {
                    Ok(InputEntry {
                        name: string_field("input_files key", name)?,
                        value: value.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(ConfigError::configuration(
                    "'input_files' must be a mapping",
                ))
            }
        };

        let output = match map.get("output") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let mut spec: OutputSpec = serde_yaml::from_value(value.clone())
                    .map_err(|e| ConfigError::configuration(format!("invalid output: {}", e)))?;
                if spec.path.is_relative() {
                    spec.path = base_dir.join(&spec.path);
                }
                Some(spec)
            }
        };

        let mode = match map.get("mode") {
            None | Some(Value::Null) => ProcessingMode::default(),
            Some(value) => string_field("mode", value)?.parse()?,
        };

        let params = map
            .into_iter()
            .filter(|(key, _)| {
                key.as_str()
                    .map(|k| !RESERVED_KEYS.contains(&k))
                    .unwrap_or(true)
            })
            .collect();

        Ok(Self {
            source: None,
            base_dir,
            process,
            zoom,
            bounds,
            input_files,
            output,
            mode,
            pyramid: None,
            params,
        })
    }

    /// Absolute path of the process file, if the job references one.
    pub fn process_path(&self) -> Option<PathBuf> {
        match &self.process {
            ProcessRef::File(path) => Some(self.resolve_path(path)),
            ProcessRef::Builtin(_) => None,
        }
    }

    /// Resolve a path relative to the job's directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Human-readable job name for logs.
    pub fn name(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => match &self.process {
                ProcessRef::Builtin(name) => format!("<{}>", name),
                ProcessRef::File(path) => format!("<{}>", path.display()),
            },
        }
    }
}

fn string_field(field: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::configuration(format!("'{}' must be a string", field)))
}

fn int_field(map: &Mapping, field: &str) -> Result<Option<i64>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| ConfigError::configuration(format!("'{}' must be an integer", field))),
    }
}

fn parse_bounds(value: &Value) -> Result<BoundingBox> {
    let values = value
        .as_sequence()
        .ok_or_else(|| ConfigError::configuration("'process_bounds' must be a list of numbers"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| ConfigError::configuration("'process_bounds' must be a list of numbers"))
        })
        .collect::<Result<Vec<f64>>>()?;
    bounds_from_values(&values)
}

/// Build bounds from exactly four finite numbers (minx, miny, maxx, maxy).
pub fn bounds_from_values(values: &[f64]) -> Result<BoundingBox> {
    let bounds = BoundingBox::from_slice(values)
        .map_err(|_| ConfigError::configuration("invalid number of process bounds"))?;
    if !bounds.is_finite() {
        return Err(ConfigError::configuration("process bounds must be finite numbers"));
    }
    Ok(bounds)
}
