//! Common test fixtures for job resolution tests.
//!
//! Two dummy rasters with an L-shaped union:
//!
//! ```text
//!  4 ┌───┐
//!    │ 1 │
//!  2 │   ├───┐
//!    │   │ 2 │
//!  1 └───┴───┘
//!    2   3   4
//! ```

use std::path::Path;

use raster_io::{MemoryRaster, MemoryRasters};
use tile_common::{BoundingBox, DataType};

/// Common bounding box definitions for testing.
pub mod bbox {
    use tile_common::BoundingBox;

    /// Extent of `dummy1.tif`
    pub const DUMMY1: BoundingBox = BoundingBox {
        min_x: 2.0,
        min_y: 1.0,
        max_x: 3.0,
        max_y: 4.0,
    };

    /// Extent of `dummy2.tif`
    pub const DUMMY2: BoundingBox = BoundingBox {
        min_x: 3.0,
        min_y: 1.0,
        max_x: 4.0,
        max_y: 2.0,
    };

    /// `process_bounds` of `zoom.mapchete`
    pub const ZOOM_JOB: BoundingBox = BoundingBox {
        min_x: 3.0,
        min_y: 1.5,
        max_x: 3.5,
        max_y: 2.0,
    };

    /// Far away from both dummy rasters
    pub const DISJOINT: BoundingBox = BoundingBox {
        min_x: 10.0,
        min_y: 10.0,
        max_x: 11.0,
        max_y: 11.0,
    };
}

/// In-memory raster covering `bounds` with 0.01 unit pixels.
pub fn dummy_raster(bounds: BoundingBox, dtype: DataType, bands: usize) -> MemoryRaster {
    let width = (bounds.width() * 100.0).round() as u32;
    let height = (bounds.height() * 100.0).round() as u32;
    MemoryRaster::new(bounds, width, height, dtype, bands)
}

/// `dummy1.tif` and `dummy2.tif` inside `dir`.
pub fn dummy_rasters(dir: &Path) -> MemoryRasters {
    MemoryRasters::new()
        .with(dir.join("dummy1.tif"), dummy_raster(bbox::DUMMY1, DataType::Uint8, 1))
        .with(dir.join("dummy2.tif"), dummy_raster(bbox::DUMMY2, DataType::Uint8, 1))
}

/// Job description files, relative to one directory.
pub mod jobs {
    pub const PROCESS_FILE: &str = "process.py";

    /// Single zoom and process bounds.
    pub const ZOOM: &str = "zoom.mapchete";
    /// Min/max zoom, inputs switching with zoom.
    pub const MINMAX_ZOOM: &str = "minmax_zoom.mapchete";
    /// Area from input files only.
    pub const FILES_BOUNDS: &str = "files_bounds.mapchete";
    /// Nested job as an input.
    pub const MAPCHETE_INPUT: &str = "mapchete_input.mapchete";
    /// Zoom-dependent parameters.
    pub const EXAMPLE: &str = "example.mapchete";

    pub const ALL: [(&str, &str); 5] = [
        (
            ZOOM,
            "process_file: process.py
process_zoom: 5
process_bounds: [3, 1.5, 3.5, 2]
input_files:
  file1: dummy1.tif
  file2: dummy2.tif
",
        ),
        (
            MINMAX_ZOOM,
            "process_file: process.py
process_minzoom: 7
process_maxzoom: 10
input_files:
  file1:
    zoom>=10: dummy1.tif
  file2: dummy2.tif
",
        ),
        (
            FILES_BOUNDS,
            "process_file: process.py
process_zoom: 10
input_files:
  file1: dummy1.tif
  file2: dummy2.tif
",
        ),
        (
            MAPCHETE_INPUT,
            "process_file: process.py
process_zoom: 5
input_files:
  file1: dummy1.tif
  file2: zoom.mapchete
",
        ),
        (
            EXAMPLE,
            "process_file: process.py
process_minzoom: 0
process_maxzoom: 20
input_files:
  file1:
    zoom>=10: dummy1.tif
  file2: dummy2.tif
some_integer_parameter: 12
some_float_parameter: 5.3
some_string_parameter:
  zoom<=10: string1
  zoom>10: string2
some_bool_parameter: true
",
        ),
    ];
}
