use std::io::Write;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, DictionaryArray, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Int32Type, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use tempfile::NamedTempFile;

use trisk_map::dataset::{BoundarySchema, load_assets, load_boundaries};
use trisk_map::{AppContext, DashboardConfig, Metric, TriskError};

fn snapshot_columns() -> Vec<(Field, ArrayRef)> {
    let mut columns: Vec<(Field, ArrayRef)> = vec![
        (
            Field::new("baseline_scenario", DataType::Utf8, false),
            Arc::new(StringArray::from(vec!["WEO2021", "WEO2021"])),
        ),
        (
            Field::new("target_scenario", DataType::Utf8, false),
            Arc::new(StringArray::from(vec!["NZE2050", "NZE2050"])),
        ),
        (
            Field::new(
                "technology",
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                false,
            ),
            Arc::new(["Coal", "Oil"].into_iter().collect::<DictionaryArray<Int32Type>>()),
        ),
        (
            Field::new("year", DataType::Int32, false),
            Arc::new(Int32Array::from(vec![2025, 2030])),
        ),
        (
            Field::new("shock_year", DataType::Int32, false),
            Arc::new(Int32Array::from(vec![2030, 2030])),
        ),
        (
            Field::new("country_iso2", DataType::Utf8, true),
            Arc::new(StringArray::from(vec![Some("US"), None])),
        ),
    ];
    for (i, metric) in Metric::ALL.iter().enumerate() {
        columns.push((
            Field::new(metric.column(), DataType::Float64, true),
            Arc::new(Float64Array::from(vec![Some(i as f64), None])),
        ));
    }
    columns
}

fn replace_column(columns: &mut [(Field, ArrayRef)], name: &str, array: ArrayRef) {
    let slot = columns.iter_mut().find(|(f, _)| f.name() == name).unwrap();
    *slot = (Field::new(name, array.data_type().clone(), true), array);
}

fn write_ipc(columns: Vec<(Field, ArrayRef)>) -> NamedTempFile {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(Arc::clone(&schema), arrays).unwrap();
    let file = NamedTempFile::new().unwrap();
    let mut writer = FileWriter::try_new(file.reopen().unwrap(), &schema).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();
    file
}

fn write_snapshot(skip: Option<&str>) -> NamedTempFile {
    let columns = snapshot_columns()
        .into_iter()
        .filter(|(field, _)| Some(field.name().as_str()) != skip)
        .collect();
    write_ipc(columns)
}

const BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    { "type": "Feature",
      "properties": { "status": "Member State", "iso_3166_1_": "US" },
      "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } },
    { "type": "Feature",
      "properties": { "status": "Territory", "iso_3166_1_": "GU" },
      "geometry": { "type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,0]]] } },
    { "type": "Feature",
      "properties": { "status": "Member State", "iso_3166_1_alpha_2_codes": "DE" },
      "geometry": { "type": "MultiPolygon", "coordinates": [[[[4,0],[5,0],[5,1],[4,0]]]] } },
    { "type": "Feature",
      "properties": { "status": "Member State" },
      "geometry": { "type": "Polygon", "coordinates": [[[6,0],[7,0],[7,1],[6,0]]] } }
  ]
}"#;

fn write_boundaries() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(BOUNDARIES.as_bytes()).unwrap();
    file
}

#[test]
fn reads_feather_snapshot() {
    let file = write_snapshot(None);
    let table = load_assets(file.path()).unwrap();
    assert_eq!(table.len(), 2);

    let first = &table.rows()[0];
    assert_eq!(first.baseline_scenario, "WEO2021");
    assert_eq!(first.technology, "Coal");
    assert_eq!(first.year, 2025);
    assert_eq!(first.shock_year, 2030);
    assert_eq!(first.country_iso2.as_deref(), Some("US"));
    assert_eq!(first.metric(Metric::Pd), Some(4.0));

    let second = &table.rows()[1];
    assert_eq!(second.technology, "Oil");
    assert_eq!(second.country_iso2, None);
    assert_eq!(second.metric(Metric::Pd), None);
}

#[test]
fn missing_column_is_fatal() {
    let file = write_snapshot(Some("volatility"));
    let err = load_assets(file.path()).unwrap_err();
    assert!(matches!(err, TriskError::MissingColumn { ref column, .. } if column == "volatility"));
}

#[test]
fn unparseable_values_are_fatal() {
    let mut columns = snapshot_columns();
    replace_column(
        &mut columns,
        "year",
        Arc::new(StringArray::from(vec!["2025", "not-a-year"])),
    );
    let err = load_assets(write_ipc(columns).path()).unwrap_err();
    assert!(matches!(err, TriskError::ColumnType { ref column, .. } if column == "year"));

    let mut columns = snapshot_columns();
    replace_column(&mut columns, "pd", Arc::new(StringArray::from(vec!["0.1", "high"])));
    let err = load_assets(write_ipc(columns).path()).unwrap_err();
    assert!(matches!(err, TriskError::ColumnType { ref column, .. } if column == "pd"));
}

#[test]
fn numeric_strings_still_load() {
    let mut columns = snapshot_columns();
    replace_column(&mut columns, "year", Arc::new(StringArray::from(vec!["2025", "2030"])));
    let table = load_assets(write_ipc(columns).path()).unwrap();
    assert_eq!(table.rows()[1].year, 2030);
}

#[test]
fn null_selection_key_is_fatal() {
    let mut columns = snapshot_columns();
    replace_column(
        &mut columns,
        "technology",
        Arc::new(StringArray::from(vec![Some("Coal"), None])),
    );
    let err = load_assets(write_ipc(columns).path()).unwrap_err();
    assert!(matches!(err, TriskError::NullKey { ref column, .. } if column == "technology"));

    let mut columns = snapshot_columns();
    replace_column(
        &mut columns,
        "shock_year",
        Arc::new(Int32Array::from(vec![Some(2030), None])),
    );
    let err = load_assets(write_ipc(columns).path()).unwrap_err();
    assert!(matches!(err, TriskError::NullKey { ref column, .. } if column == "shock_year"));
}

#[test]
fn missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_assets(&dir.path().join("WorldAssets.feather")).unwrap_err();
    assert!(matches!(err, TriskError::Read { .. }));
}

#[test]
fn garbage_snapshot_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"not an arrow file").unwrap();
    assert!(matches!(load_assets(file.path()), Err(TriskError::Arrow { .. })));
}

#[test]
fn keeps_member_states_with_a_code() {
    let file = write_boundaries();
    let code_fields = vec!["iso_3166_1_".to_string(), "iso_3166_1_alpha_2_codes".to_string()];
    let schema = BoundarySchema {
        status_field: "status",
        member_status: "Member State",
        code_fields: &code_fields,
    };
    let table = load_boundaries(file.path(), &schema).unwrap();
    let codes: Vec<_> = table.rows().iter().map(|b| b.country_iso2.as_str()).collect();
    assert_eq!(codes, vec!["US", "DE"]);
}

#[test]
fn duplicate_member_states_merge() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"{ "type": "FeatureCollection", "features": [
          { "type": "Feature", "properties": { "status": "Member State", "iso_3166_1_": "FR" },
            "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } },
          { "type": "Feature", "properties": { "status": "Member State", "iso_3166_1_": "FR" },
            "geometry": { "type": "Polygon", "coordinates": [[[-60,4],[-59,4],[-59,5],[-60,4]]] } }
        ] }"#,
    )
    .unwrap();
    let config = DashboardConfig::builtin();
    let table = load_boundaries(file.path(), &config.boundary_schema()).unwrap();
    assert_eq!(table.len(), 1);
    assert!(matches!(&table.rows()[0].geometry.value, geojson::Value::MultiPolygon(p) if p.len() == 2));
}

#[test]
fn malformed_boundaries_are_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    let config = DashboardConfig::builtin();
    let err = load_boundaries(file.path(), &config.boundary_schema()).unwrap_err();
    assert!(matches!(err, TriskError::GeoJson { .. }));
}

#[test]
fn geometry_root_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{ "type": "Point", "coordinates": [0, 0] }"#).unwrap();
    let config = DashboardConfig::builtin();
    let err = load_boundaries(file.path(), &config.boundary_schema()).unwrap_err();
    assert!(matches!(err, TriskError::NotFeatureCollection { .. }));
}

#[test]
fn context_reads_files_once_until_invalidated() {
    let dir = tempfile::tempdir().unwrap();
    let assets_path = dir.path().join("WorldAssets.feather");
    let boundaries_path = dir.path().join("boundaries.geojson");
    std::fs::copy(write_snapshot(None).path(), &assets_path).unwrap();
    std::fs::copy(write_boundaries().path(), &boundaries_path).unwrap();

    let config = DashboardConfig {
        assets_path: assets_path.clone(),
        boundaries_path: boundaries_path.clone(),
        ..DashboardConfig::builtin()
    };
    let mut context = AppContext::new(config);
    assert!(!context.is_loaded());
    let (assets, boundaries) = context.load().unwrap();
    assert!(context.is_loaded());

    // Cached copies survive the files disappearing.
    std::fs::remove_file(&assets_path).unwrap();
    std::fs::remove_file(&boundaries_path).unwrap();
    let (again, boundaries_again) = context.load().unwrap();
    assert!(Arc::ptr_eq(&assets, &again));
    assert!(Arc::ptr_eq(&boundaries, &boundaries_again));

    context.invalidate();
    assert!(matches!(context.assets(), Err(TriskError::Read { .. })));
}
