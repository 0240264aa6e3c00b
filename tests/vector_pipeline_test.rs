//! Integration tests for the vector half of the pipeline.
//!
//! Tests the workflow from files on disk to per-region totals:
//! shapefile + point table -> reproject -> join -> sum -> shapefile.

use std::io::Write;

use approx::assert_relative_eq;
use aquaspatial::crs::Crs;
use aquaspatial::error::{CrsError, SpatialError};
use aquaspatial::io::{read_point_table, read_shapefile, write_shapefile, PointTableOptions};
use aquaspatial::pipeline::{region_totals, RegionTotalsSpec};
use aquaspatial::vector::{
    reproject_layer, spatial_join, sum_by_group, Feature, JoinSpec, OverlapPolicy, VectorLayer,
};
use geo::{polygon, Geometry};
use tempfile::tempdir;

/// Three rectangular "states" along the US west coast.
fn states() -> VectorLayer {
    let rect = |x0: f64, y0: f64, x1: f64, y1: f64| {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)]
    };
    VectorLayer::new(
        "states",
        vec![
            Feature::new(rect(-124.5, 46.0, -117.0, 49.0)).with_attribute("NAME", "Washington"),
            Feature::new(rect(-124.5, 42.0, -116.5, 46.0)).with_attribute("NAME", "Oregon"),
            Feature::new(rect(-124.5, 32.5, -114.0, 42.0)).with_attribute("NAME", "California"),
        ],
        Some(Crs::Geographic),
    )
}

const CITIES: &str = "\
# name, longitude, latitude, population
name,lon,lat,pop
Seattle,-122.33,47.61,608660
Spokane,-117.43,47.66,208916
Portland,-122.68,45.52,583776
Eugene,-123.09,44.05,156185
\"Los Angeles, CA\",-118.24,34.05,3792621
San Francisco,-122.42,37.77,805235
Honolulu,-157.86,21.31,337256
";

#[test]
fn test_region_totals_from_files() {
    let dir = tempdir().unwrap();
    let states_path = dir.path().join("states.shp");
    write_shapefile(&states(), &states_path).unwrap();

    let cities_path = dir.path().join("cities.csv");
    std::fs::File::create(&cities_path)
        .unwrap()
        .write_all(CITIES.as_bytes())
        .unwrap();

    let states = read_shapefile(&states_path).unwrap();
    assert_eq!(states.crs, Some(Crs::Geographic));

    let options = PointTableOptions::new("lon", "lat").with_crs(Crs::Geographic);
    let cities = read_point_table(&cities_path, &options).unwrap();
    assert_eq!(cities.len(), 7);

    let spec = RegionTotalsSpec {
        target_crs: Crs::Mollweide,
        join: JoinSpec::new("NAME", OverlapPolicy::Reject),
        value_field: "pop".to_string(),
        output_field: "pop_sum".to_string(),
    };
    let totals = region_totals(&states, &cities, &spec).unwrap();

    assert_eq!(totals.unmatched, 1);
    let by_name: Vec<(&str, f64)> = totals
        .sums
        .iter()
        .map(|s| (s.group.as_str(), s.sum))
        .collect();
    assert_eq!(
        by_name,
        vec![
            ("California", 3_792_621.0 + 805_235.0),
            ("Oregon", 583_776.0 + 156_185.0),
            ("Washington", 608_660.0 + 208_916.0),
        ]
    );

    let out_path = dir.path().join("out").join("state_totals.shp");
    std::fs::create_dir_all(out_path.parent().unwrap()).unwrap();
    write_shapefile(&totals.regions, &out_path).unwrap();

    let written = read_shapefile(&out_path).unwrap();
    assert_eq!(written.crs, Some(Crs::Mollweide));
    let oregon = written
        .features
        .iter()
        .find(|f| f.attribute("NAME").as_text().as_deref() == Some("Oregon"))
        .unwrap();
    assert_relative_eq!(oregon.attribute("pop_sum").as_f64().unwrap(), 739_961.0);
}

#[test]
fn test_regions_without_points_get_null_totals() {
    let cities = VectorLayer::new(
        "cities",
        vec![Feature::new(geo::point!(x: -122.33, y: 47.61)).with_attribute("pop", 10.0)],
        Some(Crs::Geographic),
    );
    let spec = RegionTotalsSpec {
        target_crs: Crs::Geographic,
        join: JoinSpec::new("NAME", OverlapPolicy::FirstMatch),
        value_field: "pop".to_string(),
        output_field: "total".to_string(),
    };

    let totals = region_totals(&states(), &cities, &spec).unwrap();
    assert_eq!(totals.sums.len(), 1);
    assert!(totals.regions.features[1].attribute("total").is_null());
    assert!(totals.regions.features[2].attribute("total").is_null());
    assert_eq!(totals.regions.features[0].attribute("total").as_f64(), Some(10.0));
}

#[test]
fn test_join_requires_matching_crs() {
    let cities = VectorLayer::new(
        "cities",
        vec![Feature::new(geo::point!(x: -122.33, y: 47.61)).with_attribute("pop", 1.0)],
        Some(Crs::Geographic),
    );
    let projected = reproject_layer(&states(), Crs::WebMercator).unwrap();

    let err = spatial_join(&cities, &projected, &JoinSpec::new("NAME", OverlapPolicy::FirstMatch))
        .unwrap_err();
    assert!(matches!(err, SpatialError::Crs(CrsError::Mismatch { .. })));

    // Same join after bringing both into one CRS
    let cities = reproject_layer(&cities, Crs::WebMercator).unwrap();
    let records =
        spatial_join(&cities, &projected, &JoinSpec::new("NAME", OverlapPolicy::FirstMatch)).unwrap();
    assert_eq!(sum_by_group(&records, "pop")[0].group, "Washington");
}

#[test]
fn test_utm_round_trip_of_polygons() {
    let utm = Crs::utm_for(45.0, -122.0);
    assert_eq!(utm, Crs::Utm { zone: 10, northern: true });

    // Inside zone 10
    let coast = VectorLayer::new(
        "coast",
        vec![Feature::new(polygon![
            (x: -124.9, y: 43.0), (x: -121.2, y: 43.0), (x: -121.2, y: 48.5),
            (x: -124.9, y: 48.5), (x: -124.9, y: 43.0)
        ])
        .with_attribute("NAME", "coast")],
        Some(Crs::Geographic),
    );
    let back = reproject_layer(&reproject_layer(&coast, utm).unwrap(), Crs::Geographic).unwrap();
    assert_eq!(back.crs, Some(Crs::Geographic));

    let (Geometry::Polygon(a), Geometry::Polygon(b)) =
        (&coast.features[0].geometry, &back.features[0].geometry)
    else {
        panic!("expected polygons");
    };
    for (ca, cb) in a.exterior().coords().zip(b.exterior().coords()) {
        assert_relative_eq!(ca.x, cb.x, epsilon = 1e-6);
        assert_relative_eq!(ca.y, cb.y, epsilon = 1e-6);
    }
}
