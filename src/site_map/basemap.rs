//! Land and border geometry drawn beneath the sites.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geo_types::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use serde_json::Value;

/// Geodetic (lon, lat) geometry. An empty basemap renders as ocean only.
#[derive(Debug, Clone, PartialEq)]
pub struct Basemap {
    pub land: MultiPolygon<f64>,
    pub borders: MultiLineString<f64>,
}

impl Default for Basemap {
    fn default() -> Self {
        Basemap {
            land: MultiPolygon(Vec::new()),
            borders: MultiLineString(Vec::new()),
        }
    }
}

impl Basemap {
    pub fn is_empty(&self) -> bool {
        self.land.0.is_empty() && self.borders.0.is_empty()
    }
}

/// Load a GeoJSON file. Polygon geometries become land, line geometries
/// become borders; everything else is skipped.
pub fn load_geojson(path: &Path) -> Result<Basemap> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let root: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;

    let basemap = parse_geojson(&root)?;
    log::info!(
        "Loaded basemap from {}: {} land polygons, {} border lines",
        path.display(),
        basemap.land.0.len(),
        basemap.borders.0.len()
    );
    Ok(basemap)
}

/// Parse GeoJSON already held in memory.
pub fn parse_geojson(root: &Value) -> Result<Basemap> {
    let mut basemap = Basemap::default();
    collect(root, &mut basemap)?;
    Ok(basemap)
}

fn collect(node: &Value, out: &mut Basemap) -> Result<()> {
    let kind = node.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "FeatureCollection" => {
            let features = node
                .get("features")
                .and_then(Value::as_array)
                .context("FeatureCollection without a features array")?;
            for feature in features {
                collect(feature, out)?;
            }
        }
        "Feature" => {
            if let Some(geometry) = node.get("geometry").filter(|g| !g.is_null()) {
                collect(geometry, out)?;
            }
        }
        "GeometryCollection" => {
            if let Some(geometries) = node.get("geometries").and_then(Value::as_array) {
                for g in geometries {
                    collect(g, out)?;
                }
            }
        }
        "Polygon" => out.land.0.push(polygon(coordinates(node)?)?),
        "MultiPolygon" => {
            for p in array(coordinates(node)?)? {
                out.land.0.push(polygon(p)?);
            }
        }
        "LineString" => out.borders.0.push(line_string(coordinates(node)?)?),
        "MultiLineString" => {
            for l in array(coordinates(node)?)? {
                out.borders.0.push(line_string(l)?);
            }
        }
        "" => bail!("GeoJSON object without a type"),
        other => log::debug!("Skipping GeoJSON geometry of type {other}"),
    }
    Ok(())
}

fn coordinates(node: &Value) -> Result<&Value> {
    node.get("coordinates")
        .context("Geometry without coordinates")
}

fn array(v: &Value) -> Result<&Vec<Value>> {
    v.as_array().context("Expected a coordinate array")
}

fn line_string(v: &Value) -> Result<LineString<f64>> {
    array(v)?
        .iter()
        .map(|p| {
            let p = array(p)?;
            match (p.first().and_then(Value::as_f64), p.get(1).and_then(Value::as_f64)) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => bail!("Invalid position {p:?}"),
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(v: &Value) -> Result<Polygon<f64>> {
    let mut rings = array(v)?.iter().map(line_string);
    let exterior = rings.next().context("Polygon without rings")??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}
