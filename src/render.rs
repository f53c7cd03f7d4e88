// render.rs

use std::ops::Range;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use plotters::prelude::*;
use tracing::{debug, info};

use crate::colormap::{Colormap, Rgb, build_colormap};
use crate::config::{DashboardConfig, MetricSpec, RangeSource};
use crate::dataset::{AssetTable, Metric};
use crate::error::{Result, TriskError};
use crate::join::GeoTable;
use crate::style::{FeatureStyle, StyleState, feature_style};

const OCEAN: RGBColor = RGBColor(173, 216, 230); // Light blue ocean background
const LEGEND_WIDTH: u32 = 110;

/// Vertical gradient legend. Endpoints are already multiplied by the
/// metric's legend scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub label: String,
    pub vmin: f64,
    pub vmax: f64,
    /// Bottom to top.
    pub colors: Vec<Rgb>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethFeature {
    pub country_iso2: String,
    pub value: Option<f64>,
    pub hover: Vec<(Metric, Option<f64>)>,
    pub style: FeatureStyle,
    pub highlight: FeatureStyle,
    pub geometry: Geometry,
}

/// Self-contained map ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct MapArtifact {
    pub metric: Metric,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub center: (f64, f64),
    pub zoom: u8,
    /// `None` when no rows survived filtering and joining.
    pub layer: Option<Vec<ChoroplethFeature>>,
    pub legend: Option<Legend>,
    pub colormap: Colormap,
    pub value_range: Option<(f64, f64)>,
    pub layer_control: bool,
}

/// Colors `geo_table` by `spec.metric`.
///
/// The scale spans the joined rows or the whole of `full_table`, depending on
/// `spec.range_source`, and is inverted when its minimum falls below the
/// configured threshold.
pub fn render(
    geo_table: &GeoTable<'_>,
    spec: &MetricSpec,
    hover_fields: &[Metric],
    full_table: &AssetTable,
    config: &DashboardConfig,
) -> MapArtifact {
    let metric = spec.metric;
    let value_range = match spec.range_source {
        RangeSource::Filtered => geo_table.metric_range(metric),
        RangeSource::Full => full_table.metric_range(metric),
    };
    let (vmin, vmax) = value_range.unwrap_or((0.0, 0.0));
    let invert = vmin < config.invert_threshold;
    let colormap = build_colormap(vmin, vmax, config.colormap_samples, invert);
    debug!(%metric, vmin, vmax, invert, rows = geo_table.len(), "color scale");

    let layer = (!geo_table.is_empty()).then(|| {
        geo_table
            .rows
            .iter()
            .map(|row| {
                let value = row.asset.metric(metric);
                ChoroplethFeature {
                    country_iso2: row.country_iso2().to_string(),
                    value,
                    hover: hover_fields
                        .iter()
                        .map(|&field| (field, row.asset.metric(field)))
                        .collect(),
                    style: feature_style(value, StyleState::Normal, &colormap),
                    highlight: feature_style(value, StyleState::Highlighted, &colormap),
                    geometry: row.geometry.clone(),
                }
            })
            .collect()
    });

    let legend = match (&layer, value_range) {
        (Some(_), Some((lo, hi))) => Some(Legend {
            label: spec.label().to_string(),
            vmin: spec.legend_scale * lo.abs(),
            vmax: spec.legend_scale * hi.abs(),
            colors: colormap.samples().to_vec(),
        }),
        _ => None,
    };

    MapArtifact {
        metric,
        label: spec.label().to_string(),
        width: config.map_width,
        height: config.map_height,
        center: (0.0, 0.0),
        zoom: 2,
        layer,
        legend,
        colormap,
        value_range,
        layer_control: false,
    }
}

impl MapArtifact {
    pub fn features(&self) -> &[ChoroplethFeature] {
        self.layer.as_deref().unwrap_or_default()
    }

    /// Features with properties for the country code, hover fields, the
    /// metric value and both style variants.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .features()
            .iter()
            .map(|feature| {
                let mut properties = JsonObject::new();
                properties.insert("country_iso2".into(), feature.country_iso2.clone().into());
                for (field, value) in &feature.hover {
                    properties.insert(field.column().into(), json_number(*value));
                }
                properties.insert(self.metric.column().into(), json_number(feature.value));
                properties.insert("style".into(), style_json(&feature.style));
                properties.insert("highlight".into(), style_json(&feature.highlight));
                Feature {
                    bbox: None,
                    geometry: Some(feature.geometry.clone()),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        serde_json::to_string(&self.to_feature_collection()).map_err(TriskError::Encode)
    }

    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?).map_err(|source| {
            TriskError::Write {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!(path = %path.display(), "wrote GeoJSON layer");
        Ok(())
    }

    /// Lon/lat bounds of every feature, `[min_lon, min_lat, max_lon, max_lat]`.
    pub fn bbox(&self) -> Option<[f64; 4]> {
        let mut bbox: Option<[f64; 4]> = None;
        for feature in self.features() {
            for ring in exterior_rings(&feature.geometry) {
                for (lon, lat) in ring {
                    let b = bbox.get_or_insert([lon, lat, lon, lat]);
                    b[0] = b[0].min(lon);
                    b[1] = b[1].min(lat);
                    b[2] = b[2].max(lon);
                    b[3] = b[3].max(lat);
                }
            }
        }
        bbox
    }

    /// Draws the map and legend to an image file (format from the extension).
    pub fn write_png(&self, path: &Path) -> Result<()> {
        let (x_range, y_range) = chart_ranges(self.bbox());
        let root = BitMapBackend::new(path, (self.width + LEGEND_WIDTH, self.height))
            .into_drawing_area();
        root.fill(&OCEAN).map_err(draw_error)?;
        let (map_area, legend_area) = root.split_horizontally(self.width);

        let caption = match &self.layer {
            Some(_) => self.label.clone(),
            None => format!("{} (no matching rows)", self.label),
        };
        let mut chart = ChartBuilder::on(&map_area)
            .margin(10)
            .caption(&caption, ("sans-serif", 24).into_font())
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_error)?;

        for feature in self.features() {
            let fill: RGBColor = feature.style.fill_color.into();
            let stroke: RGBColor = feature.style.color.into();
            for ring in exterior_rings(&feature.geometry) {
                chart
                    .draw_series(std::iter::once(Polygon::new(
                        ring.clone(),
                        fill.mix(feature.style.fill_opacity).filled(),
                    )))
                    .map_err(draw_error)?;
                chart
                    .draw_series(std::iter::once(PathElement::new(ring, stroke.stroke_width(1))))
                    .map_err(draw_error)?;
            }
        }

        if let Some(legend) = &self.legend {
            draw_legend(&legend_area, legend, &self.colormap)?;
        }

        root.present().map_err(draw_error)?;
        info!(path = %path.display(), features = self.features().len(), "wrote map image");
        Ok(())
    }
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    legend: &Legend,
    colormap: &Colormap,
) -> Result<()> {
    let (_, height) = area.dim_in_pixel();
    let top = 40i32;
    let bottom = height as i32 - 40;
    let (x0, x1) = (10i32, 30i32);
    let span = (bottom - top).max(1);
    let (lo, hi) = (colormap.vmin(), colormap.vmax());

    for y in top..bottom {
        let t = (bottom - y) as f64 / span as f64;
        let color: RGBColor = colormap.color(Some(lo + (hi - lo) * t)).into();
        area.draw(&Rectangle::new([(x0, y), (x1, y + 1)], color.filled()))
            .map_err(draw_error)?;
    }
    let font = ("sans-serif", 13).into_font();
    area.draw(&Text::new(format!("{:.2}", legend.vmax), (x1 + 4, top), font.clone()))
        .map_err(draw_error)?;
    area.draw(&Text::new(format!("{:.2}", legend.vmin), (x1 + 4, bottom - 12), font.clone()))
        .map_err(draw_error)?;
    area.draw(&Text::new(legend.metric_caption(), (x0, top - 25), font))
        .map_err(draw_error)?;
    Ok(())
}

impl Legend {
    fn metric_caption(&self) -> String {
        const MAX: usize = 14;
        if self.label.chars().count() <= MAX {
            self.label.clone()
        } else {
            let short: String = self.label.chars().take(MAX - 1).collect();
            format!("{short}…")
        }
    }
}

fn draw_error<E: std::error::Error + Send + Sync>(
    err: plotters::drawing::DrawingAreaErrorKind<E>,
) -> TriskError {
    TriskError::Draw(err.to_string())
}

fn json_number(value: Option<f64>) -> JsonValue {
    value
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn style_json(style: &FeatureStyle) -> JsonValue {
    serde_json::to_value(style).unwrap_or(JsonValue::Null)
}

/// Outer rings of every polygon in `geometry`; holes are ignored.
pub fn exterior_rings(geometry: &Geometry) -> Vec<Vec<(f64, f64)>> {
    let ring = |r: &geojson::LineStringType| r.iter().map(|c| (c[0], c[1])).collect::<Vec<_>>();
    match &geometry.value {
        Value::Polygon(polygon) => polygon.first().map(ring).into_iter().collect(),
        Value::MultiPolygon(multi_polygon) => multi_polygon
            .iter()
            .filter_map(|polygon| polygon.first().map(ring))
            .collect(),
        Value::GeometryCollection(geometries) => {
            geometries.iter().flat_map(exterior_rings).collect()
        }
        _ => Vec::new(),
    }
}

/// Padded lon/lat ranges around `bbox`, or the whole globe.
pub fn chart_ranges(bbox: Option<[f64; 4]>) -> (Range<f64>, Range<f64>) {
    let Some([min_lon, min_lat, max_lon, max_lat]) = bbox else {
        return (-180.0..180.0, -90.0..90.0);
    };
    let padding_percentage = 0.1;
    let epsilon = 0.001;

    let lon_padding = (max_lon - min_lon).max(epsilon) * padding_percentage;
    let lat_padding = (max_lat - min_lat).max(epsilon) * padding_percentage;

    (
        (min_lon - lon_padding).max(-180.0)..(max_lon + lon_padding).min(180.0),
        (min_lat - lat_padding).max(-90.0)..(max_lat + lat_padding).min(90.0),
    )
}
