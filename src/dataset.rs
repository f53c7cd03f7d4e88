// dataset.rs

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast_with_options;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::ipc::reader::FileReader;
use arrow::record_batch::RecordBatch;
use arrow::compute::CastOptions;
use geojson::{GeoJson, Geometry, PolygonType, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, TriskError};

/// Numeric columns that can drive the choropleth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ProductionPlanCompanyTechnology,
    ProductionBaselineScenario,
    ProductionTargetScenario,
    ProductionShockScenario,
    Pd,
    NetProfitMargin,
    DebtEquityRatio,
    Volatility,
    ScenarioPriceBaseline,
    PriceShockScenario,
    NetProfitsBaselineScenario,
    NetProfitsShockScenario,
    DiscountedNetProfitsBaselineScenario,
    DiscountedNetProfitsShockScenario,
    Count,
}

impl Metric {
    pub const COUNT: usize = 15;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::ProductionPlanCompanyTechnology,
        Metric::ProductionBaselineScenario,
        Metric::ProductionTargetScenario,
        Metric::ProductionShockScenario,
        Metric::Pd,
        Metric::NetProfitMargin,
        Metric::DebtEquityRatio,
        Metric::Volatility,
        Metric::ScenarioPriceBaseline,
        Metric::PriceShockScenario,
        Metric::NetProfitsBaselineScenario,
        Metric::NetProfitsShockScenario,
        Metric::DiscountedNetProfitsBaselineScenario,
        Metric::DiscountedNetProfitsShockScenario,
        Metric::Count,
    ];

    /// Column name in the asset snapshot.
    pub fn column(self) -> &'static str {
        match self {
            Metric::ProductionPlanCompanyTechnology => "production_plan_company_technology",
            Metric::ProductionBaselineScenario => "production_baseline_scenario",
            Metric::ProductionTargetScenario => "production_target_scenario",
            Metric::ProductionShockScenario => "production_shock_scenario",
            Metric::Pd => "pd",
            Metric::NetProfitMargin => "net_profit_margin",
            Metric::DebtEquityRatio => "debt_equity_ratio",
            Metric::Volatility => "volatility",
            Metric::ScenarioPriceBaseline => "scenario_price_baseline",
            Metric::PriceShockScenario => "price_shock_scenario",
            Metric::NetProfitsBaselineScenario => "net_profits_baseline_scenario",
            Metric::NetProfitsShockScenario => "net_profits_shock_scenario",
            Metric::DiscountedNetProfitsBaselineScenario => {
                "discounted_net_profits_baseline_scenario"
            }
            Metric::DiscountedNetProfitsShockScenario => "discounted_net_profits_shock_scenario",
            Metric::Count => "count",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = TriskError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.column() == s)
            .ok_or_else(|| TriskError::UnknownMetric(s.to_string()))
    }
}

/// One asset row. Duplicate key tuples are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetRecord {
    pub baseline_scenario: String,
    pub target_scenario: String,
    pub technology: String,
    pub year: i64,
    pub shock_year: i64,
    pub country_iso2: Option<String>,
    pub metrics: [Option<f64>; Metric::COUNT],
}

impl AssetRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics[metric.index()]
    }

    pub fn set_metric(&mut self, metric: Metric, value: Option<f64>) {
        self.metrics[metric.index()] = value;
    }

    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        self.set_metric(metric, Some(value));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetTable {
    rows: Vec<AssetRecord>,
}

impl AssetTable {
    pub fn new(rows: Vec<AssetRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[AssetRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Min and max of `metric` over non-null, finite values.
    pub fn metric_range(&self, metric: Metric) -> Option<(f64, f64)> {
        value_range(self.rows.iter().filter_map(|r| r.metric(metric)))
    }
}

impl FromIterator<AssetRecord> for AssetTable {
    fn from_iter<I: IntoIterator<Item = AssetRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub(crate) fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Country polygon keyed by ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRecord {
    pub country_iso2: String,
    pub geometry: Geometry,
}

/// Boundaries with at most one record per country code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryTable {
    rows: Vec<BoundaryRecord>,
}

impl BoundaryTable {
    /// Records sharing a code are merged into one multi-part geometry, kept
    /// at the position of the first.
    pub fn new(records: Vec<BoundaryRecord>) -> Self {
        let mut rows: Vec<BoundaryRecord> = Vec::with_capacity(records.len());
        for record in records {
            match rows.iter_mut().find(|r| r.country_iso2 == record.country_iso2) {
                Some(existing) => {
                    warn!(code = %record.country_iso2, "merging duplicate boundary");
                    existing.geometry = merge_geometry(&existing.geometry, &record.geometry);
                }
                None => rows.push(record),
            }
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[BoundaryRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn polygons(geometry: &Geometry) -> Option<Vec<PolygonType>> {
    match &geometry.value {
        Value::Polygon(polygon) => Some(vec![polygon.clone()]),
        Value::MultiPolygon(polygons) => Some(polygons.clone()),
        _ => None,
    }
}

/// One geometry covering both inputs: a MultiPolygon when both are areal,
/// otherwise a GeometryCollection.
fn merge_geometry(first: &Geometry, second: &Geometry) -> Geometry {
    match (polygons(first), polygons(second)) {
        (Some(mut parts), Some(more)) => {
            parts.extend(more);
            Geometry::new(Value::MultiPolygon(parts))
        }
        _ => Geometry::new(Value::GeometryCollection(vec![first.clone(), second.clone()])),
    }
}

/// Where and how boundaries are read.
#[derive(Debug, Clone)]
pub struct BoundarySchema<'a> {
    pub status_field: &'a str,
    pub member_status: &'a str,
    /// Candidate code properties, first present wins.
    pub code_fields: &'a [String],
}

/// Reads the asset snapshot (Arrow IPC / Feather v2).
pub fn load_assets(path: &Path) -> Result<AssetTable> {
    let file = fs::File::open(path).map_err(|source| TriskError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = FileReader::try_new(io::BufReader::new(file), None).map_err(|source| {
        TriskError::Arrow {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|source| TriskError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        append_batch(path, &batch, &mut rows)?;
    }
    info!(path = %path.display(), rows = rows.len(), "loaded asset snapshot");
    Ok(AssetTable::new(rows))
}

fn column(path: &Path, batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| TriskError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })?;
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array, to, &options).map_err(|source| TriskError::ColumnType {
        path: path.to_path_buf(),
        column: name.to_string(),
        expected: match to {
            DataType::Utf8 => "utf8",
            DataType::Int64 => "int64",
            _ => "float64",
        },
        source,
    })
}

fn append_batch(path: &Path, batch: &RecordBatch, rows: &mut Vec<AssetRecord>) -> Result<()> {
    // Selection keys must be present on every row; only the country code and
    // the metrics are nullable.
    let key = |name: &str, to: &DataType| -> Result<ArrayRef> {
        let array = column(path, batch, name, to)?;
        if array.null_count() > 0 {
            return Err(TriskError::NullKey {
                path: path.to_path_buf(),
                column: name.to_string(),
            });
        }
        Ok(array)
    };

    let baseline = key("baseline_scenario", &DataType::Utf8)?;
    let target = key("target_scenario", &DataType::Utf8)?;
    let technology = key("technology", &DataType::Utf8)?;
    let year = key("year", &DataType::Int64)?;
    let shock_year = key("shock_year", &DataType::Int64)?;
    let country = column(path, batch, "country_iso2", &DataType::Utf8)?;
    let metrics = Metric::ALL
        .iter()
        .map(|m| column(path, batch, m.column(), &DataType::Float64))
        .collect::<Result<Vec<_>>>()?;

    let baseline = baseline.as_string::<i32>();
    let target = target.as_string::<i32>();
    let technology = technology.as_string::<i32>();
    let country = country.as_string::<i32>();
    let year = year.as_primitive::<Int64Type>();
    let shock_year = shock_year.as_primitive::<Int64Type>();
    let metrics: Vec<_> = metrics
        .iter()
        .map(|a| a.as_primitive::<Float64Type>())
        .collect();

    rows.reserve(batch.num_rows());
    for i in 0..batch.num_rows() {
        let mut record = AssetRecord {
            baseline_scenario: baseline.value(i).to_string(),
            target_scenario: target.value(i).to_string(),
            technology: technology.value(i).to_string(),
            year: year.value(i),
            shock_year: shock_year.value(i),
            country_iso2: (!country.is_null(i)).then(|| country.value(i).to_string()),
            metrics: [None; Metric::COUNT],
        };
        for (metric, values) in Metric::ALL.iter().zip(&metrics) {
            if !values.is_null(i) {
                record.set_metric(*metric, Some(values.value(i)));
            }
        }
        rows.push(record);
    }
    debug!(rows = batch.num_rows(), "decoded asset batch");
    Ok(())
}

/// Reads the boundary FeatureCollection, keeping member states only.
pub fn load_boundaries(path: &Path, schema: &BoundarySchema<'_>) -> Result<BoundaryTable> {
    let file = fs::File::open(path).map_err(|source| TriskError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson = GeoJson::from_reader(io::BufReader::new(file)).map_err(|source| {
        TriskError::GeoJson {
            path: path.to_path_buf(),
            source: Box::new(geojson::Error::MalformedJson(source)),
        }
    })?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(TriskError::NotFeatureCollection {
            path: path.to_path_buf(),
        });
    };

    let total = collection.features.len();
    let rows: Vec<BoundaryRecord> = collection
        .features
        .into_iter()
        .filter(|feature| {
            feature
                .property(schema.status_field)
                .and_then(|v| v.as_str())
                .is_some_and(|status| status == schema.member_status)
        })
        .filter_map(|feature| {
            let code = schema
                .code_fields
                .iter()
                .find_map(|field| feature.property(field).and_then(|v| v.as_str()))?
                .to_string();
            Some(BoundaryRecord {
                country_iso2: code,
                geometry: feature.geometry?,
            })
        })
        .collect();

    info!(
        path = %path.display(),
        kept = rows.len(),
        skipped = total - rows.len(),
        "loaded boundaries"
    );
    Ok(BoundaryTable::new(rows))
}
