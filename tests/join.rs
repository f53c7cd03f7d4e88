mod common;

use std::collections::HashSet;

use geojson::Value;
use trisk_map::{BoundaryRecord, BoundaryTable, Selection, apply_filters, join_geometry};

#[test]
fn unknown_codes_are_dropped() {
    let assets = common::sample_assets();
    let boundaries = common::sample_boundaries();
    let all: Vec<_> = assets.rows().iter().collect();
    let joined = join_geometry(&all, &boundaries);

    let known: HashSet<&str> = boundaries.rows().iter().map(|b| b.country_iso2.as_str()).collect();
    assert!(joined.len() <= all.len());
    assert!(joined.rows.iter().all(|r| known.contains(r.country_iso2())));
    assert_eq!(joined.len(), all.len() - 1);
    assert_eq!(joined.dropped_codes.iter().collect::<Vec<_>>(), vec!["ZZ"]);
}

#[test]
fn joined_rows_keep_asset_attributes() {
    let assets = common::sample_assets();
    let boundaries = common::sample_boundaries();
    let filtered = apply_filters(
        &assets,
        &Selection {
            technology: Some("Oil".into()),
            ..Default::default()
        },
    );
    let joined = join_geometry(&filtered, &boundaries);
    assert_eq!(joined.len(), 1);
    let row = joined.rows[0];
    assert_eq!(row.asset.technology, "Oil");
    assert_eq!(row.country_iso2(), "US");
    assert_eq!(row.geometry, &boundaries.rows()[0].geometry);
}

#[test]
fn rows_without_code_are_dropped() {
    let mut record = common::asset("A", "B", "Coal", 2025, "US", 0.1);
    record.country_iso2 = None;
    let boundaries = common::sample_boundaries();
    let joined = join_geometry(&[&record], &boundaries);
    assert!(joined.is_empty());
    assert!(joined.dropped_codes.is_empty());
}

#[test]
fn missing_code_never_matches_a_blank_boundary() {
    let mut record = common::asset("A", "B", "Coal", 2025, "US", 0.1);
    record.country_iso2 = None;
    let boundaries = BoundaryTable::new(vec![BoundaryRecord {
        country_iso2: String::new(),
        geometry: common::square(0.0, 0.0),
    }]);
    let joined = join_geometry(&[&record], &boundaries);
    assert!(joined.is_empty());
    assert!(joined.dropped_codes.is_empty());
}

#[test]
fn duplicate_boundaries_do_not_multiply_rows() {
    let us = common::asset("A", "B", "Coal", 2025, "US", 0.1);
    let de = common::asset("A", "B", "Coal", 2025, "DE", 0.2);
    let boundaries = BoundaryTable::new(vec![
        common::boundary("US", 0.0),
        common::boundary("DE", 10.0),
        common::boundary("US", 5.0),
    ]);
    assert_eq!(boundaries.len(), 2);

    let filtered = [&us, &de];
    let joined = join_geometry(&filtered, &boundaries);
    assert!(joined.len() <= filtered.len());
    assert_eq!(joined.len(), 2);
    let Value::MultiPolygon(parts) = &joined.rows[0].geometry.value else {
        panic!("merged boundary should be a MultiPolygon");
    };
    assert_eq!(parts.len(), 2);
}

#[test]
fn empty_inputs_join_to_nothing() {
    let boundaries = common::sample_boundaries();
    assert!(join_geometry(&[], &boundaries).is_empty());

    let record = common::asset("A", "B", "Coal", 2025, "US", 0.1);
    let empty = BoundaryTable::default();
    let joined = join_geometry(&[&record], &empty);
    assert!(joined.is_empty());
    assert!(joined.dropped_codes.contains("US"));
}
