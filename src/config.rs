// config.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dataset::{BoundarySchema, Metric};
use crate::error::{Result, TriskError};

pub const BUILTIN_DASHBOARD_CONFIG: &str = include_str!("data/dashboard.json");

/// Which rows the color scale range is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    /// Rows left after filtering and joining.
    #[default]
    Filtered,
    /// Every loaded asset row.
    Full,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricSpec {
    pub metric: Metric,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub range_source: RangeSource,
    /// Multiplier applied to legend endpoints, e.g. 100 for fractional rates.
    #[serde(default = "unit_scale")]
    pub legend_scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl MetricSpec {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            label: None,
            range_source: RangeSource::Filtered,
            legend_scale: 1.0,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.metric.column())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub assets_path: PathBuf,
    pub boundaries_path: PathBuf,
    pub status_field: String,
    pub member_status: String,
    pub code_fields: Vec<String>,
    pub colormap_samples: usize,
    pub invert_threshold: f64,
    pub map_width: u32,
    pub map_height: u32,
    pub metrics: Vec<MetricSpec>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            assets_path: PathBuf::from("WorldAssets.feather"),
            boundaries_path: PathBuf::from("shapefiles/world-administrative-boundaries.geojson"),
            status_field: "status".to_string(),
            member_status: "Member State".to_string(),
            code_fields: vec!["iso_3166_1_".to_string()],
            colormap_samples: 20,
            invert_threshold: -0.001,
            map_width: 700,
            map_height: 700,
            metrics: Vec::new(),
        }
    }
}

impl DashboardConfig {
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_DASHBOARD_CONFIG).expect("builtin dashboard config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: DashboardConfig = serde_json::from_str(json)?;
        config.normalize();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| TriskError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Fills in every metric missing from `metrics` and drops duplicates,
    /// keeping the first entry.
    fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(Metric::COUNT);
        self.metrics.retain(|spec| {
            if seen.contains(&spec.metric) {
                false
            } else {
                seen.push(spec.metric);
                true
            }
        });
        for metric in Metric::ALL {
            if !seen.contains(&metric) {
                self.metrics.push(MetricSpec::new(metric));
            }
        }
        self.colormap_samples = self.colormap_samples.max(1);
    }

    pub fn metric_spec(&self, metric: Metric) -> MetricSpec {
        self.metrics
            .iter()
            .find(|spec| spec.metric == metric)
            .cloned()
            .unwrap_or_else(|| MetricSpec::new(metric))
    }

    /// Metrics in presentation order.
    pub fn metric_order(&self) -> Vec<Metric> {
        self.metrics.iter().map(|spec| spec.metric).collect()
    }

    pub fn boundary_schema(&self) -> BoundarySchema<'_> {
        BoundarySchema {
            status_field: &self.status_field,
            member_status: &self.member_status,
            code_fields: &self.code_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_metric() {
        let config = DashboardConfig::builtin();
        assert_eq!(config.metrics.len(), Metric::COUNT);
        assert_eq!(config.metric_order()[0], Metric::ProductionPlanCompanyTechnology);
        let pd = config.metric_spec(Metric::Pd);
        assert_eq!(pd.legend_scale, 100.0);
        assert_eq!(pd.range_source, RangeSource::Filtered);
        assert_eq!(config.metric_spec(Metric::Count).legend_scale, 1.0);
        assert_eq!(config.member_status, "Member State");
    }

    #[test]
    fn partial_config_is_completed() {
        let config = DashboardConfig::from_json_str(
            r#"{
                "colormap_samples": 0,
                "metrics": [
                    { "metric": "count", "range_source": "full" },
                    { "metric": "count", "legend_scale": 3.0 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.colormap_samples, 1);
        assert_eq!(config.metrics.len(), Metric::COUNT);
        let count = config.metric_spec(Metric::Count);
        assert_eq!(count.range_source, RangeSource::Full);
        assert_eq!(count.legend_scale, 1.0);
        assert_eq!(count.label(), "count");
        assert_eq!(config.assets_path, PathBuf::from("WorldAssets.feather"));
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let err = DashboardConfig::from_json_str(r#"{ "metrics": [{ "metric": "ebitda" }] }"#);
        assert!(matches!(err, Err(TriskError::Config(_))));
    }
}
