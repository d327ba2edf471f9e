//! Tile pyramid grid definitions.
//!
//! Two grids are supported, mirroring the OGC well-known tile matrix sets:
//! - `geodetic` (WorldCRS84Quad): 2x1 tiles at zoom 0 over -180..180, -90..90
//! - `mercator` (WebMercatorQuad): 1 tile at zoom 0 over the Web Mercator extent

use crate::error::ParseError;
use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Tile width and height in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level the best-zoom search considers.
pub const MAX_ZOOM: u32 = 39;

const MERCATOR_EXTENT: f64 = 20037508.342789244;

/// The tiling scheme of an output pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PyramidType {
    #[default]
    Geodetic,
    Mercator,
}

impl PyramidType {
    /// Full extent of the grid in its own CRS units.
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Self::Geodetic => BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            Self::Mercator => BoundingBox::new(
                -MERCATOR_EXTENT,
                -MERCATOR_EXTENT,
                MERCATOR_EXTENT,
                MERCATOR_EXTENT,
            ),
        }
    }

    /// Number of tile (columns, rows) at a zoom level.
    pub fn matrix_size(&self, zoom: u32) -> (u64, u64) {
        let n = 1u64 << zoom.min(62);
        match self {
            Self::Geodetic => (n * 2, n),
            Self::Mercator => (n, n),
        }
    }

    /// Horizontal size of one pixel at a zoom level, in CRS units.
    pub fn pixel_x_size(&self, zoom: u32) -> f64 {
        let (cols, _) = self.matrix_size(zoom);
        self.bounds().width() / (cols as f64 * TILE_SIZE as f64)
    }

    /// Estimate the zoom level that matches a raster's native resolution.
    ///
    /// The raster's average pixel size (x and y sizes weighted by the pixel
    /// counts along each axis) is compared against the grid. The result is
    /// the zoom just before the first one whose pixels are at least as fine
    /// as the raster's, clamped at 0. Bounds must be in the grid's CRS.
    pub fn best_zoom_for_resolution(&self, bounds: &BoundingBox, width: u32, height: u32) -> u32 {
        if width == 0 || height == 0 {
            return 0;
        }
        let size = width as f64 + height as f64;
        let avg_resolution = (bounds.width() / width as f64) * (width as f64 / size)
            + (bounds.height() / height as f64) * (height as f64 / size);

        (0..=MAX_ZOOM)
            .find(|zoom| self.pixel_x_size(*zoom) <= avg_resolution)
            .map(|zoom| zoom.saturating_sub(1))
            .unwrap_or(MAX_ZOOM)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geodetic => "geodetic",
            Self::Mercator => "mercator",
        }
    }
}

impl std::str::FromStr for PyramidType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geodetic" => Ok(Self::Geodetic),
            "mercator" => Ok(Self::Mercator),
            _ => Err(ParseError::UnknownPyramidType(s.to_string())),
        }
    }
}

impl std::fmt::Display for PyramidType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
