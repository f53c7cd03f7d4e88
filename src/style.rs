// style.rs

use serde::Serialize;

use crate::colormap::{Colormap, Rgb};

pub const STROKE_COLOR: Rgb = Rgb(0x00, 0x00, 0x00);
pub const HIGHLIGHT_COLOR: Rgb = Rgb(0xff, 0x00, 0x00);
pub const FILL_OPACITY: f64 = 0.9;
pub const BORDER_WEIGHT: f64 = 0.1;
pub const HIGHLIGHT_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleState {
    Normal,
    /// Feature under the pointer.
    Highlighted,
}

/// Leaflet-compatible path style of one polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    #[serde(serialize_with = "as_hex")]
    pub fill_color: Rgb,
    pub fill_opacity: f64,
    pub weight: f64,
    pub stroke: bool,
    #[serde(serialize_with = "as_hex")]
    pub color: Rgb,
}

fn as_hex<S: serde::Serializer>(color: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(color)
}

/// Style of a feature holding `value` in `state`.
///
/// The fill never changes with the state; highlighting widens the border
/// and turns it red.
pub fn feature_style(value: Option<f64>, state: StyleState, colormap: &Colormap) -> FeatureStyle {
    let fill_color = colormap.color(value);
    match state {
        StyleState::Normal => FeatureStyle {
            fill_color,
            fill_opacity: FILL_OPACITY,
            weight: BORDER_WEIGHT,
            stroke: true,
            color: STROKE_COLOR,
        },
        StyleState::Highlighted => FeatureStyle {
            fill_color,
            fill_opacity: FILL_OPACITY,
            weight: HIGHLIGHT_WEIGHT,
            stroke: true,
            color: HIGHLIGHT_COLOR,
        },
    }
}
