// lib.rs
//! Transition-risk choropleth pipeline: load the asset snapshot and country
//! boundaries once, narrow the assets with cascading selections, join them to
//! member-state polygons and color the result by a chosen metric.

pub mod colormap;
pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod html;
pub mod join;
pub mod pipeline;
pub mod render;
pub mod style;

pub use colormap::{Colormap, NEUTRAL_GRAY, Rgb, build_colormap};
pub use config::{DashboardConfig, MetricSpec, RangeSource};
pub use context::AppContext;
pub use dataset::{AssetRecord, AssetTable, BoundaryRecord, BoundaryTable, Metric};
pub use error::{Result, TriskError};
pub use filter::{FieldValue, Selection, SelectionField, apply_filters, cascading_options};
pub use join::{GeoRecord, GeoTable, join_geometry};
pub use pipeline::{RenderOutcome, render_selection};
pub use render::{MapArtifact, render};
