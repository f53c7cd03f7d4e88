// pipeline.rs

use std::collections::BTreeSet;

use tracing::info;

use crate::config::DashboardConfig;
use crate::dataset::{AssetTable, BoundaryTable, Metric};
use crate::filter::{Selection, apply_filters};
use crate::join::join_geometry;
use crate::render::{MapArtifact, render};

/// Result of one filter, join and render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub artifact: MapArtifact,
    pub filtered_rows: usize,
    pub joined_rows: usize,
    pub dropped_codes: BTreeSet<String>,
}

/// Runs the whole pipeline for one selection. Nothing is kept between calls.
pub fn render_selection(
    assets: &AssetTable,
    boundaries: &BoundaryTable,
    config: &DashboardConfig,
    selection: &Selection,
    metric: Metric,
    hover_fields: &[Metric],
) -> RenderOutcome {
    let filtered = apply_filters(assets, selection);
    let joined = join_geometry(&filtered, boundaries);
    let artifact = render(&joined, &config.metric_spec(metric), hover_fields, assets, config);
    info!(
        %metric,
        filtered = filtered.len(),
        joined = joined.len(),
        "rendered selection"
    );
    RenderOutcome {
        filtered_rows: filtered.len(),
        joined_rows: joined.len(),
        dropped_codes: joined.dropped_codes,
        artifact,
    }
}
