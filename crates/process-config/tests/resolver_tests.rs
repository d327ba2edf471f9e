//! Job resolution against job files and rasters on a temporary directory.

use geo::{LineString, Polygon};
use process_config::{
    AreaKind, ConfigError, ConfigResolver, JobDescription, Overrides, ProcessArea, ProcessConfig,
};
use raster_io::MemoryRasters;
use serde_yaml::Value;
use test_utils::{
    assert_approx_eq, assert_bounds_approx_eq, bbox, dummy_raster, dummy_rasters, jobs, JobDir,
};
use tile_common::{BoundingBox, DataType};

fn polygon(coords: &[(f64, f64)]) -> ProcessArea {
    ProcessArea::from_geometry(Polygon::new(LineString::from(coords.to_vec()), vec![]).into())
}

/// dummy1 ∪ dummy2
fn l_shape() -> ProcessArea {
    polygon(&[
        (3.0, 2.0),
        (4.0, 2.0),
        (4.0, 1.0),
        (3.0, 1.0),
        (2.0, 1.0),
        (2.0, 4.0),
        (3.0, 4.0),
        (3.0, 2.0),
    ])
}

fn setup() -> (JobDir, MemoryRasters) {
    let dir = JobDir::with_fixtures();
    let rasters = dummy_rasters(dir.path());
    (dir, rasters)
}

#[test]
fn test_zoom_from_file() {
    let (dir, rasters) = setup();
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::ZOOM), &Overrides::default())
        .unwrap();
    assert_eq!(resolved.zoom_levels, vec![5]);
}

#[test]
fn test_minmax_zoom_from_file() {
    let (dir, rasters) = setup();
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::MINMAX_ZOOM), &Overrides::default())
        .unwrap();
    assert_eq!(resolved.zoom_levels, vec![7, 8, 9, 10]);
}

#[test]
fn test_zoom_override_wins() {
    let (dir, rasters) = setup();
    let resolver = ConfigResolver::new(&rasters);
    let path = dir.join(jobs::MINMAX_ZOOM);

    let resolved = resolver.resolve_file(&path, &Overrides::zoom([1, 4])).unwrap();
    assert_eq!(resolved.zoom_levels, vec![1, 2, 3, 4]);

    let reversed = resolver.resolve_file(&path, &Overrides::zoom([4, 1])).unwrap();
    assert_eq!(reversed.zoom_levels, resolved.zoom_levels);

    let single = resolver.resolve_file(&path, &Overrides::zoom([3])).unwrap();
    assert_eq!(single.zoom_levels, vec![3]);

    let tie = resolver.resolve_file(&path, &Overrides::zoom([6, 6])).unwrap();
    assert_eq!(tie.zoom_levels, vec![6]);
}

#[test]
fn test_every_zoom_has_an_area() {
    let (dir, rasters) = setup();
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::MINMAX_ZOOM), &Overrides::default())
        .unwrap();
    let zooms: Vec<u32> = resolved.process_area.keys().copied().collect();
    assert_eq!(zooms, resolved.zoom_levels);

    // file1 only joins at zoom 10
    for zoom in 7..10 {
        let area = resolved.process_area(zoom).unwrap();
        assert!(area.equals_topo(&ProcessArea::from_bbox(&bbox::DUMMY2)), "zoom {zoom}");
    }
    assert!(resolved.process_area(10).unwrap().equals_topo(&l_shape()));
}

#[test]
fn test_bounds_from_file() {
    let (dir, rasters) = setup();
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::ZOOM), &Overrides::default())
        .unwrap();
    let expected = polygon(&[(3.0, 1.5), (3.0, 2.0), (3.5, 2.0), (3.5, 1.5), (3.0, 1.5)]);
    assert!(resolved.process_area(5).unwrap().equals_topo(&expected));
    assert_eq!(resolved.bounds, Some(bbox::ZOOM_JOB));
}

#[test]
fn test_bounds_override_with_swapped_corners() {
    let (dir, rasters) = setup();
    let overrides = Overrides::default().with_bounds(vec![3.0, 2.0, 3.5, 1.5]);
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::ZOOM), &overrides)
        .unwrap();
    let expected = polygon(&[(3.0, 1.5), (3.0, 2.0), (3.5, 2.0), (3.5, 1.5), (3.0, 1.5)]);
    assert!(resolved.process_area(5).unwrap().equals_topo(&expected));
}

#[test]
fn test_bounds_from_input_files() {
    let (dir, rasters) = setup();
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::FILES_BOUNDS), &Overrides::default())
        .unwrap();
    let area = resolved.process_area(10).unwrap();
    assert_eq!(area.kind(), AreaKind::Polygon);
    assert!(area.equals_topo(&l_shape()));
    assert_eq!(area.bounds(), Some(BoundingBox::new(2.0, 1.0, 4.0, 4.0)));
}

#[test]
fn test_nested_job_input() {
    let (dir, rasters) = setup();
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::MAPCHETE_INPUT), &Overrides::default())
        .unwrap();
    let expected = polygon(&[
        (3.0, 2.0),
        (3.5, 2.0),
        (3.5, 1.5),
        (3.0, 1.5),
        (3.0, 1.0),
        (2.0, 1.0),
        (2.0, 4.0),
        (3.0, 4.0),
        (3.0, 2.0),
    ]);
    assert!(resolved.process_area(5).unwrap().equals_topo(&expected));
}

#[test]
fn test_nested_job_cycle() {
    let dir = JobDir::new();
    dir.write(jobs::PROCESS_FILE, "");
    dir.write(
        "a.mapchete",
        "process_file: process.py\nprocess_zoom: 3\ninput_files:\n  other: b.mapchete\n",
    );
    dir.write(
        "b.mapchete",
        "process_file: process.py\nprocess_zoom: 3\ninput_files:\n  other: a.mapchete\n",
    );
    let rasters = MemoryRasters::new();
    let err = ConfigResolver::new(&rasters)
        .resolve_file(dir.join("a.mapchete"), &Overrides::default())
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("circular job reference"));
}

#[test]
fn test_non_overlapping_inputs_are_multipart() {
    let dir = JobDir::new();
    dir.write(jobs::PROCESS_FILE, "");
    let path = dir.write(
        "split.mapchete",
        "process_file: process.py\nprocess_zoom: 2\ninput_files:\n  west: west.tif\n  east: east.tif\n",
    );
    let west = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    let east = BoundingBox::new(5.0, 0.0, 6.0, 1.0);
    let rasters = MemoryRasters::new()
        .with(dir.join("west.tif"), dummy_raster(west, DataType::Uint8, 1))
        .with(dir.join("east.tif"), dummy_raster(east, DataType::Uint8, 1));

    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(path, &Overrides::default())
        .unwrap();
    let area = resolved.process_area(2).unwrap();
    assert_eq!(area.kind(), AreaKind::MultiPolygon);
    let expected = process_config::geometry::union([
        ProcessArea::from_bbox(&west),
        ProcessArea::from_bbox(&east),
    ]);
    assert!(area.equals_topo(&expected));
}

#[test]
fn test_user_bounds_clip_single_raster() {
    let dir = JobDir::new();
    dir.write(jobs::PROCESS_FILE, "");
    let path = dir.write(
        "single.mapchete",
        "process_file: process.py\nprocess_zoom: 8\ninput_files:\n  file1: wide.tif\n",
    );
    let rasters = MemoryRasters::new().with(
        dir.join("wide.tif"),
        dummy_raster(BoundingBox::new(2.0, 1.0, 4.0, 4.0), DataType::Uint8, 1),
    );
    let overrides = Overrides::default().with_bounds(vec![3.0, 1.5, 3.5, 2.0]);
    let resolved = ConfigResolver::new(&rasters).resolve_file(path, &overrides).unwrap();
    assert!(resolved
        .process_area(8)
        .unwrap()
        .equals_topo(&ProcessArea::from_bbox(&bbox::ZOOM_JOB)));
}

#[test]
fn test_disjoint_bounds_give_empty_area() {
    let (dir, rasters) = setup();
    let overrides = Overrides::default().with_bounds(bbox::DISJOINT.to_array().to_vec());
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::FILES_BOUNDS), &overrides)
        .unwrap();
    assert_eq!(resolved.zoom_levels, vec![10]);
    assert!(resolved.process_area(10).unwrap().is_empty());
}

#[test]
fn test_huge_bounds_keep_input_area() {
    let (dir, rasters) = setup();
    for extent in [1e9, 1e12] {
        let overrides = Overrides::default().with_bounds(vec![-extent, -extent, extent, extent]);
        let resolved = ConfigResolver::new(&rasters)
            .resolve_file(dir.join(jobs::FILES_BOUNDS), &overrides)
            .unwrap();
        let area = resolved.process_area(10).unwrap();
        assert!(area.equals_topo(&l_shape()));
        assert_approx_eq!(area.area(), 4.0);
        assert_bounds_approx_eq!(area.bounds().unwrap().to_array(), [2.0, 1.0, 4.0, 4.0]);
    }
}

#[test]
fn test_non_finite_bounds_are_rejected() {
    let (dir, rasters) = setup();
    for values in [
        vec![f64::NAN, 1.0, 3.0, 4.0],
        vec![f64::NEG_INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::INFINITY],
    ] {
        let err = ConfigResolver::new(&rasters)
            .resolve_file(dir.join(jobs::FILES_BOUNDS), &Overrides::default().with_bounds(values))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: process bounds must be finite numbers"
        );
    }
}

#[test]
fn test_no_zoom_level() {
    let dir = JobDir::new();
    dir.write(jobs::PROCESS_FILE, "");
    let path = dir.write("nozoom.mapchete", "process_file: process.py\n");
    let rasters = MemoryRasters::new();
    let err = ConfigResolver::new(&rasters)
        .resolve_file(path, &Overrides::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "configuration error: no zoom level provided");
}

#[test]
fn test_invalid_zoom_requests() {
    let (dir, rasters) = setup();
    let resolver = ConfigResolver::new(&rasters);
    let path = dir.join(jobs::ZOOM);

    let err = resolver.resolve_file(&path, &Overrides::zoom([1, 2, 3])).unwrap_err();
    assert!(err.is_configuration());

    let err = resolver.resolve_file(&path, &Overrides::zoom([-1, 3])).unwrap_err();
    assert_eq!(err.to_string(), "configuration error: zoom levels must be non-negative");

    let err = resolver
        .resolve_file(&path, &Overrides::zoom([0, 4_000_000_000]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "configuration error: zoom level 4000000000 exceeds maximum zoom 39"
    );
}

#[test]
fn test_invalid_bounds_override() {
    let (dir, rasters) = setup();
    let overrides = Overrides::default().with_bounds(vec![3.0, 2.0, 3.5]);
    let err = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::ZOOM), &overrides)
        .unwrap_err();
    assert!(err.to_string().contains("invalid number of process bounds"));
}

#[test]
fn test_missing_job_file() {
    let dir = JobDir::new();
    let rasters = MemoryRasters::new();
    let err = ConfigResolver::new(&rasters)
        .resolve_file(dir.join("missing.mapchete"), &Overrides::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { what: "job description", .. }));
}

#[test]
fn test_missing_process_file() {
    let dir = JobDir::new();
    let path = dir.write("job.mapchete", "process_file: gone.py\nprocess_zoom: 1\n");
    let rasters = MemoryRasters::new();
    let err = ConfigResolver::new(&rasters)
        .resolve_file(path, &Overrides::default())
        .unwrap_err();
    match err {
        ConfigError::NotFound { what, path } => {
            assert_eq!(what, "process file");
            assert_eq!(path, dir.join("gone.py"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_raster_fails_at_its_zoom() {
    let dir = JobDir::with_fixtures();
    // only dummy2 exists; dummy1 is used from zoom 10 on
    let rasters = MemoryRasters::new().with(
        dir.join("dummy2.tif"),
        dummy_raster(bbox::DUMMY2, DataType::Uint8, 1),
    );
    let resolver = ConfigResolver::new(&rasters);
    let path = dir.join(jobs::MINMAX_ZOOM);

    assert!(resolver.resolve_file(&path, &Overrides::zoom([7, 9])).is_ok());

    let err = resolver.resolve_file(&path, &Overrides::default()).unwrap_err();
    match err {
        ConfigError::InvalidAtZoom { zoom, explanation } => {
            assert_eq!(zoom, 10);
            assert!(explanation.contains("dummy1.tif"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_resolution_is_repeatable() {
    let (dir, rasters) = setup();
    let resolver = ConfigResolver::new(&rasters);
    let overrides = Overrides::zoom([4, 6]).with_bounds(vec![2.5, 1.0, 3.5, 3.0]);
    let path = dir.join(jobs::FILES_BOUNDS);

    let first = resolver.resolve_file(&path, &overrides).unwrap();
    let second = resolver.resolve_file(&path, &overrides).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_zoom_dependent_parameters() {
    let (dir, rasters) = setup();
    let job = JobDescription::from_file(dir.join(jobs::EXAMPLE)).unwrap();
    let config = ProcessConfig::new(&job, &rasters);

    let zoom5 = config.at_zoom(5).unwrap();
    assert!(zoom5.input("file1").is_none());
    assert_eq!(zoom5.input("file2").unwrap().path, dir.join("dummy2.tif"));
    assert_eq!(zoom5.param("some_integer_parameter").and_then(Value::as_i64), Some(12));
    assert_eq!(zoom5.param("some_float_parameter").and_then(Value::as_f64), Some(5.3));
    assert_eq!(zoom5.param("some_string_parameter").and_then(Value::as_str), Some("string1"));
    assert_eq!(zoom5.param("some_bool_parameter").and_then(Value::as_bool), Some(true));

    let zoom11 = config.at_zoom(11).unwrap();
    assert_eq!(zoom11.input("file1").unwrap().path, dir.join("dummy1.tif"));
    assert_eq!(zoom11.param("some_string_parameter").and_then(Value::as_str), Some("string2"));
}

#[test]
fn test_resolved_config_serializes() {
    let (dir, rasters) = setup();
    let resolved = ConfigResolver::new(&rasters)
        .resolve_file(dir.join(jobs::ZOOM), &Overrides::default())
        .unwrap();
    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json["zoom_levels"], serde_json::json!([5]));
    assert!(json["process_area"]["5"].is_array());
    assert_eq!(json["mode"], "continue");
}
