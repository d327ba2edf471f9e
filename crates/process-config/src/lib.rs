//! Tile Pyramid Job Resolution
//!
//! This crate turns a declarative job description into a concrete execution
//! plan: a closed zoom range, a process area per zoom level and, for raster
//! to pyramid conversions, per-band rescale parameters.
//!
//! # Architecture
//!
//! ```text
//! job file (YAML) + Overrides
//!      │
//!      ▼
//! ConfigResolver::resolve
//!      │
//!      ├─► resolve_zoom_levels (request > min/max > zoom)
//!      │
//!      ├─► ProcessConfig::is_valid_at_zoom, for every zoom
//!      │
//!      ├─► input footprints (raster bounds, nested job areas)
//!      │
//!      └─► resolve_process_areas (union, clip to bounds)
//!               │
//!               ▼
//!          ResolvedConfig ─► ExecutionEngine
//! ```
//!
//! Raster to pyramid conversions run [`rescale::analyze`] and
//! [`PyramidJobBuilder`] first and feed the synthetic job through the same
//! path.
//!
//! # Example
//!
//! ```ignore
//! use process_config::{ConfigResolver, Overrides};
//! use raster_io::GeoTiffOpener;
//!
//! let resolver = ConfigResolver::new(&GeoTiffOpener);
//! let resolved = resolver.resolve_file("job.mapchete", &Overrides::zoom([1, 4]))?;
//! for (zoom, area) in &resolved.process_area {
//!     println!("{zoom}: {:?}", area.bounds());
//! }
//! ```

pub mod area;
pub mod error;
pub mod geometry;
pub mod job;
pub mod output;
pub mod process;
pub mod pyramid;
pub mod rescale;
pub mod resolver;
pub mod zoom;

// Re-export commonly used types at crate root
pub use area::{process_area_for_zoom, resolve_process_areas, Footprint, ZoomInput};
pub use error::{ConfigError, Result};
pub use geometry::{AreaKind, ProcessArea};
pub use job::{InputEntry, InputKind, JobDescription, ProcessRef, PyramidSettings, Resampling};
pub use output::{OutputFormat, OutputSpec, ProcessingMode};
pub use process::{InputRasterRef, ProcessConfig, ZoomConfig};
pub use pyramid::{raster_to_pyramid, ExecutionEngine, PyramidJobBuilder, PyramidOptions};
pub use rescale::{BandScale, OutputBands, ScaleMode, ScalePlan};
pub use resolver::{ConfigResolver, Overrides, ResolvedConfig};
pub use zoom::{resolve_zoom_levels, ZoomFields, ZoomRange};
