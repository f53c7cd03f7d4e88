//! Standalone Leaflet page for a [`MapArtifact`].
//!
//! The page pulls Leaflet from a CDN, embeds the artifact's GeoJSON inline and
//! styles every feature from its `style` and `highlight` properties. No layer
//! control is added.

use std::path::Path;

use tracing::info;

use crate::colormap::Rgb;
use crate::error::{Result, TriskError};
use crate::render::{Legend, MapArtifact};

const LEAFLET_VERSION: &str = "1.9.4";

pub fn render_html(artifact: &MapArtifact) -> Result<String> {
    let geojson = if artifact.layer.is_some() {
        script_safe(&artifact.to_geojson_string()?)
    } else {
        "null".to_string()
    };
    let tooltip_fields: Vec<&str> = artifact
        .features()
        .first()
        .map(|f| f.hover.iter().map(|(m, _)| m.column()).collect())
        .unwrap_or_default();
    let tooltip_fields = script_safe(&serde_json::to_string(&tooltip_fields).map_err(TriskError::Encode)?);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.js"></script>
<style>
{css}
</style>
</head>
<body>
<div id="map" style="width: {width}px; height: {height}px;"></div>
{legend}
<script>
const layerData = {geojson};
const tooltipFields = {tooltip_fields};
const map = L.map('map', {{ center: [{lat}, {lon}], zoom: {zoom} }});
L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
if (layerData) {{
  const layer = L.geoJSON(layerData, {{
    style: (feature) => feature.properties.style,
    onEachFeature: (feature, path) => {{
      const rows = ['country_iso2'].concat(tooltipFields).map((key) => {{
        const value = feature.properties[key];
        return '<tr><th>' + key + '</th><td>' + (value === null ? 'n/a' : value) + '</td></tr>';
      }});
      path.bindTooltip('<table>' + rows.join('') + '</table>', {{ sticky: true }});
      path.on('mouseover', () => path.setStyle(feature.properties.highlight));
      path.on('mouseout', () => layer.resetStyle(path));
    }}
  }}).addTo(map);
}}
</script>
</body>
</html>
"#,
        title = html_escape(&artifact.label),
        leaflet = LEAFLET_VERSION,
        css = inline_css(),
        width = artifact.width,
        height = artifact.height,
        legend = artifact.legend.as_ref().map(render_legend).unwrap_or_default(),
        geojson = geojson,
        tooltip_fields = tooltip_fields,
        lat = artifact.center.0,
        lon = artifact.center.1,
        zoom = artifact.zoom,
    ))
}

pub fn write_html(artifact: &MapArtifact, path: &Path) -> Result<()> {
    std::fs::write(path, render_html(artifact)?).map_err(|source| TriskError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote map page");
    Ok(())
}

fn inline_css() -> &'static str {
    r#"body { margin: 0; font-family: sans-serif; display: flex; gap: 12px; }
.legend { display: flex; gap: 6px; align-items: stretch; height: 300px; margin-top: 40px; }
.legend .bar { width: 18px; border: 1px solid #444; }
.legend .ticks { display: flex; flex-direction: column; justify-content: space-between; font-size: 12px; }
.legend .label { writing-mode: vertical-rl; font-size: 12px; }
.leaflet-tooltip table th { text-align: left; padding-right: 6px; }"#
}

fn render_legend(legend: &Legend) -> String {
    format!(
        r#"<div class="legend">
<div class="bar" style="background: linear-gradient(to top, {stops});"></div>
<div class="ticks"><span>{vmax:.2}</span><span>{vmin:.2}</span></div>
<div class="label">{label}</div>
</div>"#,
        stops = gradient_stops(&legend.colors),
        vmax = legend.vmax,
        vmin = legend.vmin,
        label = html_escape(&legend.label),
    )
}

fn gradient_stops(colors: &[Rgb]) -> String {
    match colors {
        [] => "#8c8c8c, #8c8c8c".to_string(),
        [only] => format!("{only}, {only}"),
        _ => colors.iter().map(Rgb::to_string).collect::<Vec<_>>().join(", "),
    }
}

/// Keeps inline JSON from closing the surrounding script element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
        assert_eq!(script_safe(r#"{"a":"</script>"}"#), r#"{"a":"<\/script>"}"#);
    }

    #[test]
    fn single_color_gradient_is_flat() {
        assert_eq!(gradient_stops(&[Rgb(1, 2, 3)]), "#010203, #010203");
    }
}
