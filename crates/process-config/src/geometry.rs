//! Planar union and intersection of processing areas.
//!
//! Areas are kept as a `geo::MultiPolygon`; anything without area (points,
//! lines, zero-area slivers left by tangent inputs) is dropped, so a
//! degenerate overlap always comes out as an empty area rather than an error.

use geo::{Area, BooleanOps, BoundingRect, Geometry, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use tile_common::BoundingBox;

/// Relative tolerance used when comparing areas.
const AREA_EPSILON: f64 = 1e-9;

/// Shape class of a process area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    Empty,
    Polygon,
    MultiPolygon,
}

/// The region within which processing is valid, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessArea(MultiPolygon<f64>);

impl ProcessArea {
    pub fn empty() -> Self {
        Self(MultiPolygon::new(Vec::new()))
    }

    /// Rectangle covering a bounding box; corners may be given in any order.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self::from_geometry(Geometry::Polygon(bbox_polygon(bbox)))
    }

    /// Normalize an arbitrary geometry to its areal parts.
    pub fn from_geometry(geometry: Geometry<f64>) -> Self {
        match geometry {
            // Members of a collection may overlap.
            Geometry::GeometryCollection(gc) => union(gc.0.into_iter().map(Self::from_geometry)),
            other => {
                let mut polygons = Vec::new();
                collect_polygons(other, &mut polygons);
                Self(MultiPolygon::new(polygons))
            }
        }
    }

    pub fn kind(&self) -> AreaKind {
        match self.0.0.len() {
            0 => AreaKind::Empty,
            1 => AreaKind::Polygon,
            _ => AreaKind::MultiPolygon,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.0.is_empty()
    }

    pub fn area(&self) -> f64 {
        self.0.unsigned_area()
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.0.0
    }

    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    /// Envelope of the area, `None` when empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.0
            .bounding_rect()
            .map(|r| BoundingBox::new(r.min().x, r.min().y, r.max().x, r.max().y))
    }

    /// Topological equality: both areas cover the same region.
    pub fn equals_topo(&self, other: &ProcessArea) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (false, false) => {
                let scale = self.area().max(other.area()).max(1.0);
                self.0.xor(&other.0).unsigned_area() <= AREA_EPSILON * scale
            }
            _ => false,
        }
    }
}

impl Default for ProcessArea {
    fn default() -> Self {
        Self::empty()
    }
}

/// Polygon from a bounding box, ring ordered upper-left, upper-right,
/// lower-right, lower-left.
pub fn bbox_polygon(bbox: &BoundingBox) -> Polygon<f64> {
    Polygon::new(LineString::from(bbox.corners().to_vec()), Vec::new())
}

/// Union of zero or more areas. No input yields an empty area.
pub fn union<I>(areas: I) -> ProcessArea
where
    I: IntoIterator<Item = ProcessArea>,
{
    let merged = areas
        .into_iter()
        .filter(|area| !area.is_empty())
        .fold(None::<MultiPolygon<f64>>, |acc, area| match acc {
            None => Some(area.0),
            Some(acc) => Some(acc.union(&area.0)),
        });

    merged
        .map(|mp| ProcessArea::from_geometry(Geometry::MultiPolygon(mp)))
        .unwrap_or_default()
}

/// Intersection of two areas; a degenerate overlap is empty.
pub fn intersect(a: &ProcessArea, b: &ProcessArea) -> ProcessArea {
    if a.is_empty() || b.is_empty() {
        return ProcessArea::empty();
    }
    ProcessArea::from_geometry(Geometry::MultiPolygon(a.0.intersection(&b.0)))
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => push_areal(p, out),
        Geometry::MultiPolygon(mp) => mp.0.into_iter().for_each(|p| push_areal(p, out)),
        Geometry::Rect(r) => push_areal(r.to_polygon(), out),
        Geometry::Triangle(t) => push_areal(t.to_polygon(), out),
        // Points and lines carry no area; collections are unioned by the caller.
        Geometry::GeometryCollection(_)
        | Geometry::Point(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_) => {}
    }
}

fn push_areal(polygon: Polygon<f64>, out: &mut Vec<Polygon<f64>>) {
    if polygon.unsigned_area() > 0.0 {
        out.push(polygon);
    }
}
