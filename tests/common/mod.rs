#![allow(dead_code)]

use geojson::{Geometry, Value};
use trisk_map::{AssetRecord, AssetTable, BoundaryRecord, BoundaryTable, Metric};

pub fn asset(
    baseline: &str,
    target: &str,
    technology: &str,
    year: i64,
    iso: &str,
    pd: f64,
) -> AssetRecord {
    AssetRecord {
        baseline_scenario: baseline.to_string(),
        target_scenario: target.to_string(),
        technology: technology.to_string(),
        year,
        shock_year: 2030,
        country_iso2: Some(iso.to_string()),
        ..Default::default()
    }
    .with_metric(Metric::Pd, pd)
}

/// Unit square with its lower-left corner at (lon, lat).
pub fn square(lon: f64, lat: f64) -> Geometry {
    Geometry::new(Value::Polygon(vec![vec![
        vec![lon, lat],
        vec![lon + 1.0, lat],
        vec![lon + 1.0, lat + 1.0],
        vec![lon, lat + 1.0],
        vec![lon, lat],
    ]]))
}

pub fn boundary(iso: &str, lon: f64) -> BoundaryRecord {
    BoundaryRecord {
        country_iso2: iso.to_string(),
        geometry: square(lon, 0.0),
    }
}

/// Two scenario pairs over three countries; `ZZ` has no boundary.
pub fn sample_assets() -> AssetTable {
    AssetTable::new(vec![
        asset("WEO2021", "NZE2050", "Coal", 2025, "US", 0.02),
        asset("WEO2021", "NZE2050", "Coal", 2025, "DE", 0.05),
        asset("WEO2021", "NZE2050", "Coal", 2025, "ZZ", 0.07),
        asset("WEO2021", "NZE2050", "Coal", 2030, "US", 0.04),
        asset("WEO2021", "NZE2050", "Oil", 2025, "US", 0.01),
        asset("WEO2021", "APS", "Gas", 2025, "DE", 0.03),
        asset("WEO2021", "APS", "Gas", 2035, "DE", 0.06),
        asset("IPR2021", "FPS2021", "Power", 2030, "US", -0.05),
        asset("IPR2021", "FPS2021", "Power", 2030, "DE", 0.0),
        asset("IPR2021", "FPS2021", "Power", 2030, "FR", 0.10),
    ])
}

pub fn sample_boundaries() -> BoundaryTable {
    BoundaryTable::new(vec![boundary("US", -100.0), boundary("DE", 10.0), boundary("FR", 2.0)])
}
