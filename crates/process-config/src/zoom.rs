//! Zoom level resolution.
//!
//! Merges an explicit zoom request, the zoom fields of a job description and,
//! for pyramid builds, a best-zoom estimate into one closed range.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tile_common::tile::MAX_ZOOM;

use crate::error::{ConfigError, Result};

/// Zoom fields as declared in a job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoomFields {
    /// `process_zoom`
    pub zoom: Option<i64>,
    /// `process_minzoom`
    pub minzoom: Option<i64>,
    /// `process_maxzoom`
    pub maxzoom: Option<i64>,
}

/// A closed, ascending range of zoom levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: u32,
    pub max: u32,
}

impl ZoomRange {
    /// Range between two zoom levels in either order.
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn single(zoom: u32) -> Self {
        Self {
            min: zoom,
            max: zoom,
        }
    }

    pub fn levels(&self) -> RangeInclusive<u32> {
        self.min..=self.max
    }

    pub fn contains(&self, zoom: u32) -> bool {
        self.levels().contains(&zoom)
    }

    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Resolve zoom levels for a job.
///
/// First match wins:
/// 1. a request of two values, in either order
/// 2. a request of one value
/// 3. `process_minzoom` and `process_maxzoom` together
/// 4. `process_zoom`
///
/// An empty request means "not requested".
pub fn resolve_zoom_levels(request: &[i64], fields: &ZoomFields) -> Result<ZoomRange> {
    match request {
        [] => {}
        [a, b] => return pair(*a, *b),
        [a] => return Ok(ZoomRange::single(non_negative(*a)?)),
        other => {
            return Err(ConfigError::configuration(format!(
                "zoom level parameter requires one or two values, got {}",
                other.len()
            )))
        }
    }

    match (fields.minzoom, fields.maxzoom, fields.zoom) {
        (Some(min), Some(max), _) => pair(min, max),
        (_, _, Some(zoom)) => Ok(ZoomRange::single(non_negative(zoom)?)),
        _ => Err(ConfigError::configuration("no zoom level provided")),
    }
}

/// Resolve the zoom range of a pyramid build.
///
/// Without a request the range starts at 1 and ends at the estimated best
/// zoom for the input raster. The estimate is only computed when needed.
pub fn resolve_pyramid_zoom<F>(request: &[i64], best_zoom: F) -> Result<ZoomRange>
where
    F: FnOnce() -> Result<u32>,
{
    match request {
        [] => Ok(ZoomRange::new(1, best_zoom()?)),
        _ => resolve_zoom_levels(request, &ZoomFields::default()),
    }
}

fn pair(a: i64, b: i64) -> Result<ZoomRange> {
    Ok(ZoomRange::new(non_negative(a)?, non_negative(b)?))
}

fn non_negative(zoom: i64) -> Result<u32> {
    if zoom < 0 {
        return Err(ConfigError::configuration("zoom levels must be non-negative"));
    }
    match u32::try_from(zoom) {
        Ok(zoom) if zoom <= MAX_ZOOM => Ok(zoom),
        _ => Err(ConfigError::configuration(format!(
            "zoom level {} exceeds maximum zoom {}",
            zoom, MAX_ZOOM
        ))),
    }
}
