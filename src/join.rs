// join.rs

use std::collections::{BTreeSet, HashMap};

use geojson::Geometry;
use tracing::debug;

use crate::dataset::{AssetRecord, BoundaryTable, Metric, value_range};

/// An asset row paired with its country's boundary geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRecord<'a> {
    pub asset: &'a AssetRecord,
    pub geometry: &'a Geometry,
}

impl GeoRecord<'_> {
    pub fn country_iso2(&self) -> &str {
        self.asset.country_iso2.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTable<'a> {
    pub rows: Vec<GeoRecord<'a>>,
    /// Country codes present in the input but absent from the boundaries.
    pub dropped_codes: BTreeSet<String>,
}

impl GeoTable<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric_range(&self, metric: Metric) -> Option<(f64, f64)> {
        value_range(self.rows.iter().filter_map(|r| r.asset.metric(metric)))
    }
}

/// Inner join of filtered rows with boundaries on `country_iso2`.
///
/// Rows without a code are skipped. Rows whose code has no boundary
/// (territories that are not member states) are left out and reported in
/// [`GeoTable::dropped_codes`]. Boundaries are unique per code, so the output
/// never has more rows than `filtered`.
pub fn join_geometry<'a>(filtered: &[&'a AssetRecord], boundaries: &'a BoundaryTable) -> GeoTable<'a> {
    let index: HashMap<&str, &Geometry> = boundaries
        .rows()
        .iter()
        .map(|b| (b.country_iso2.as_str(), &b.geometry))
        .collect();

    let mut table = GeoTable::default();
    let mut uncoded = 0usize;
    for &asset in filtered {
        let Some(code) = asset.country_iso2.as_deref() else {
            uncoded += 1;
            continue;
        };
        match index.get(code) {
            Some(&geometry) => table.rows.push(GeoRecord { asset, geometry }),
            None => {
                table.dropped_codes.insert(code.to_string());
            }
        }
    }

    if !table.dropped_codes.is_empty() {
        debug!(
            codes = ?table.dropped_codes,
            "rows without a member-state boundary left out of the map"
        );
    }
    debug!(input = filtered.len(), joined = table.len(), uncoded, "joined geometry");
    table
}
