//! Per-zoom process areas.
//!
//! The process area of a zoom level is the union of the footprints of every
//! input used at that zoom, clipped to the process bounds when given. A zoom
//! whose area comes out empty stays in the result with an empty area.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tile_common::BoundingBox;
use tracing::{debug, warn};

use crate::geometry::{intersect, union, ProcessArea};

/// Area covered by one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    /// A raster's bounding box.
    Bounds(BoundingBox),
    /// A nested job's process area.
    Area(ProcessArea),
}

impl Footprint {
    pub fn to_area(&self) -> ProcessArea {
        match self {
            Self::Bounds(bbox) => ProcessArea::from_bbox(bbox),
            Self::Area(area) => area.clone(),
        }
    }
}

/// An input at one zoom; `None` footprint means not used at that zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomInput {
    pub name: String,
    pub footprint: Option<Footprint>,
}

impl ZoomInput {
    pub fn unused(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            footprint: None,
        }
    }

    pub fn bounds(name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            name: name.into(),
            footprint: Some(Footprint::Bounds(bbox)),
        }
    }

    pub fn area(name: impl Into<String>, area: ProcessArea) -> Self {
        Self {
            name: name.into(),
            footprint: Some(Footprint::Area(area)),
        }
    }
}

/// Process area of a single zoom level.
pub fn process_area_for_zoom(inputs: &[ZoomInput], user_bounds: Option<&BoundingBox>) -> ProcessArea {
    let files_area = union(
        inputs
            .iter()
            .filter_map(|input| input.footprint.as_ref())
            .map(Footprint::to_area),
    );

    match user_bounds {
        Some(bounds) => clip_to_bounds(&files_area, bounds),
        None => files_area,
    }
}

/// Clip an area to a rectangle.
///
/// The polygon overlay quantizes coordinates over the combined extent of its
/// operands, so the rectangle is first reduced to the area's envelope. Bounds
/// far larger than the inputs would otherwise collapse the result.
fn clip_to_bounds(area: &ProcessArea, bounds: &BoundingBox) -> ProcessArea {
    let Some(envelope) = area.bounds() else {
        return ProcessArea::empty();
    };
    if bounds.contains(&envelope) {
        return area.clone();
    }
    match bounds.intersection(&envelope) {
        Some(clip) => intersect(area, &ProcessArea::from_bbox(&clip)),
        None => ProcessArea::empty(),
    }
}

/// Process areas of every zoom level, computed in parallel.
///
/// Zoom levels missing from `inputs_by_zoom` have no inputs.
pub fn resolve_process_areas(
    zoom_levels: &[u32],
    inputs_by_zoom: &BTreeMap<u32, Vec<ZoomInput>>,
    user_bounds: Option<&BoundingBox>,
) -> BTreeMap<u32, ProcessArea> {
    zoom_levels
        .par_iter()
        .map(|&zoom| {
            let inputs = inputs_by_zoom.get(&zoom).map(Vec::as_slice).unwrap_or(&[]);
            let area = process_area_for_zoom(inputs, user_bounds);
            if area.is_empty() {
                warn!(zoom, "Process area is empty");
            } else {
                debug!(zoom, kind = ?area.kind(), area = area.area(), "Resolved process area");
            }
            (zoom, area)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AreaKind;
    use test_utils::{assert_approx_eq, assert_bounds_approx_eq};

    fn dummy1() -> BoundingBox {
        BoundingBox::new(2.0, 1.0, 3.0, 4.0)
    }

    fn dummy2() -> BoundingBox {
        BoundingBox::new(3.0, 1.0, 4.0, 2.0)
    }

    #[test]
    fn test_no_inputs_is_empty() {
        assert!(process_area_for_zoom(&[], None).is_empty());
        assert!(process_area_for_zoom(&[], Some(&dummy1())).is_empty());
    }

    #[test]
    fn test_unused_inputs_are_skipped() {
        let inputs = vec![ZoomInput::bounds("file1", dummy1()), ZoomInput::unused("file2")];
        let area = process_area_for_zoom(&inputs, None);
        assert!(area.equals_topo(&ProcessArea::from_bbox(&dummy1())));
    }

    #[test]
    fn test_disjoint_inputs_are_multipart() {
        let inputs = vec![
            ZoomInput::bounds("a", BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
            ZoomInput::bounds("b", BoundingBox::new(5.0, 5.0, 6.0, 6.0)),
        ];
        let area = process_area_for_zoom(&inputs, None);
        assert_eq!(area.kind(), AreaKind::MultiPolygon);
        assert_approx_eq!(area.area(), 2.0);
    }

    #[test]
    fn test_user_bounds_clip() {
        let inputs = vec![ZoomInput::bounds("file1", BoundingBox::new(2.0, 1.0, 4.0, 4.0))];
        let bounds = BoundingBox::new(3.0, 1.5, 3.5, 2.0);
        let area = process_area_for_zoom(&inputs, Some(&bounds));
        assert!(area.equals_topo(&ProcessArea::from_bbox(&bounds)));
    }

    #[test]
    fn test_disjoint_user_bounds_is_empty() {
        let inputs = vec![ZoomInput::bounds("file1", dummy1())];
        let bounds = BoundingBox::new(10.0, 10.0, 11.0, 11.0);
        assert!(process_area_for_zoom(&inputs, Some(&bounds)).is_empty());
    }

    #[test]
    fn test_tangent_user_bounds_is_empty() {
        let inputs = vec![ZoomInput::bounds("file1", dummy1())];
        let bounds = BoundingBox::new(3.0, 1.0, 5.0, 4.0);
        assert!(process_area_for_zoom(&inputs, Some(&bounds)).is_empty());
    }

    #[test]
    fn test_huge_user_bounds_keep_files_area() {
        let inputs = vec![ZoomInput::bounds("file1", BoundingBox::new(2.0, 1.0, 4.0, 4.0))];
        for extent in [1e9, 1e12, f64::MAX] {
            let bounds = BoundingBox::new(-extent, -extent, extent, extent);
            let area = process_area_for_zoom(&inputs, Some(&bounds));
            assert_approx_eq!(area.area(), 6.0);
            assert_bounds_approx_eq!(area.bounds().unwrap().to_array(), [2.0, 1.0, 4.0, 4.0]);
        }
    }

    #[test]
    fn test_huge_user_bounds_partially_overlapping() {
        let inputs = vec![ZoomInput::bounds("file1", dummy1())];
        let bounds = BoundingBox::new(2.5, -1e12, 1e12, 1e12);
        let area = process_area_for_zoom(&inputs, Some(&bounds));
        assert_approx_eq!(area.area(), 1.5);
        assert_bounds_approx_eq!(area.bounds().unwrap().to_array(), [2.5, 1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_nested_area_footprint() {
        let nested = ProcessArea::from_bbox(&BoundingBox::new(3.0, 1.5, 3.5, 2.0));
        let inputs = vec![
            ZoomInput::bounds("file1", dummy1()),
            ZoomInput::area("nested", nested),
        ];
        let area = process_area_for_zoom(&inputs, None);
        // shares an edge with file1
        assert_eq!(area.kind(), AreaKind::Polygon);
        assert_approx_eq!(area.area(), 3.25);
    }

    #[test]
    fn test_every_zoom_present() {
        let mut inputs_by_zoom = BTreeMap::new();
        inputs_by_zoom.insert(7, vec![ZoomInput::bounds("file1", dummy1())]);
        inputs_by_zoom.insert(
            8,
            vec![ZoomInput::bounds("file1", dummy1()), ZoomInput::bounds("file2", dummy2())],
        );

        let areas = resolve_process_areas(&[7, 8, 9], &inputs_by_zoom, None);
        assert_eq!(areas.keys().copied().collect::<Vec<_>>(), vec![7, 8, 9]);
        assert!(areas[&7].equals_topo(&ProcessArea::from_bbox(&dummy1())));
        assert_eq!(areas[&8].kind(), AreaKind::Polygon);
        assert_approx_eq!(areas[&8].area(), 4.0);
        assert!(areas[&9].is_empty());
    }
}
