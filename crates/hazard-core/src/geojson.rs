//! Minimal GeoJSON FeatureCollection codec.
//!
//! Geometry is kept as raw JSON so artifacts can re-emit it untouched; it is
//! decoded into `geo` types only when a scorer needs it.

use crate::error::{HazardError, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

fn feature_collection_tag() -> String {
    "FeatureCollection".into()
}

fn feature_tag() -> String {
    "Feature".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_tag")]
    pub kind: String,
    pub features: Vec<Feature>,
    /// Top-level members other than `type`/`features` (`crs`, `name`, ...).
    #[serde(flatten)]
    pub foreign: Map<String, Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_tag(),
            features,
            foreign: Map::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_tag")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    pub fn new(geometry: Option<Value>, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_tag(),
            geometry,
            properties: Some(properties),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// Decodes the geometry member. `Ok(None)` for a null geometry.
    pub fn decode_geometry(&self, layer: &str) -> Result<Option<Geometry<f64>>> {
        match &self.geometry {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => decode_geometry(raw, layer).map(Some),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeometryRepr {
    Point(Vec<f64>),
    MultiPoint(Vec<Vec<f64>>),
    LineString(Vec<Vec<f64>>),
    MultiLineString(Vec<Vec<Vec<f64>>>),
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

/// Decodes a GeoJSON geometry object. Positions are cut to their first two
/// ordinates, so `[x, y, z]` slope vertices become planar coordinates.
pub fn decode_geometry(raw: &Value, layer: &str) -> Result<Geometry<f64>> {
    let repr: GeometryRepr = serde_json::from_value(raw.clone())
        .map_err(|e| HazardError::schema(layer, format!("unsupported geometry: {e}")))?;

    let geometry = match repr {
        GeometryRepr::Point(p) => Geometry::Point(Point::from(position(&p, layer)?)),
        GeometryRepr::MultiPoint(ps) => Geometry::MultiPoint(MultiPoint::new(
            ps.iter()
                .map(|p| position(p, layer).map(Point::from))
                .collect::<Result<_>>()?,
        )),
        GeometryRepr::LineString(ps) => Geometry::LineString(line_string(&ps, layer)?),
        GeometryRepr::MultiLineString(ls) => Geometry::MultiLineString(MultiLineString::new(
            ls.iter()
                .map(|l| line_string(l, layer))
                .collect::<Result<_>>()?,
        )),
        GeometryRepr::Polygon(rings) => Geometry::Polygon(polygon(&rings, layer)?),
        GeometryRepr::MultiPolygon(polys) => Geometry::MultiPolygon(MultiPolygon::new(
            polys
                .iter()
                .map(|rings| polygon(rings, layer))
                .collect::<Result<_>>()?,
        )),
    };
    Ok(geometry)
}

fn position(raw: &[f64], layer: &str) -> Result<Coord<f64>> {
    match raw {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        [_, _, ..] => Err(HazardError::schema(layer, "non-finite coordinate")),
        _ => Err(HazardError::schema(
            layer,
            format!("position needs at least 2 ordinates, got {}", raw.len()),
        )),
    }
}

fn line_string(raw: &[Vec<f64>], layer: &str) -> Result<LineString<f64>> {
    let coords = raw
        .iter()
        .map(|p| position(p, layer))
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn polygon(rings: &[Vec<Vec<f64>>], layer: &str) -> Result<Polygon<f64>> {
    let mut rings = rings.iter();
    let exterior = match rings.next() {
        Some(ring) => line_string(ring, layer)?,
        None => return Err(HazardError::schema(layer, "polygon without exterior ring")),
    };
    let interiors = rings
        .map(|ring| line_string(ring, layer))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Polygonal geometry as a `MultiPolygon`; anything else is a schema error.
pub fn into_multi_polygon(geometry: Geometry<f64>, layer: &str) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) => Ok(mp),
        other => Err(HazardError::schema(
            layer,
            format!("expected polygonal geometry, got {}", geometry_name(&other)),
        )),
    }
}

pub fn into_line_strings(geometry: Geometry<f64>, layer: &str) -> Result<Vec<LineString<f64>>> {
    match geometry {
        Geometry::LineString(l) => Ok(vec![l]),
        Geometry::MultiLineString(ml) => Ok(ml.0),
        other => Err(HazardError::schema(
            layer,
            format!("expected linear geometry, got {}", geometry_name(&other)),
        )),
    }
}

pub fn into_points(geometry: Geometry<f64>, layer: &str) -> Result<Vec<Point<f64>>> {
    match geometry {
        Geometry::Point(p) => Ok(vec![p]),
        Geometry::MultiPoint(mp) => Ok(mp.0),
        other => Err(HazardError::schema(
            layer,
            format!("expected point geometry, got {}", geometry_name(&other)),
        )),
    }
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
