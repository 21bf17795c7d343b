use crate::config::SourceSchema;
use crate::error::{HazardError, Result};
use crate::geojson::{into_multi_polygon, FeatureCollection};
use geo::{Area, MultiPolygon};
use serde_json::Value;
use std::collections::HashMap;

const REGION_LAYER: &str = "regions";

/// A named administrative village.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    boundary: MultiPolygon<f64>,
    /// Square meters, as carried by the source data.
    area_m2: f64,
    planar_area: f64,
    /// Source geometry, re-emitted verbatim by the artifact writers.
    raw_geometry: Value,
}

impl Region {
    pub fn new(
        name: impl Into<String>,
        boundary: MultiPolygon<f64>,
        area_m2: f64,
        raw_geometry: Value,
    ) -> Result<Self> {
        let name = name.into();
        if !area_m2.is_finite() || area_m2 <= 0.0 {
            return Err(HazardError::InvalidRegion {
                name,
                reason: format!("area must be positive, got {area_m2}"),
            });
        }
        let planar_area = boundary.unsigned_area();
        if !planar_area.is_finite() || planar_area <= 0.0 {
            return Err(HazardError::InvalidRegion {
                name,
                reason: "boundary encloses no area".into(),
            });
        }
        Ok(Self {
            name,
            boundary,
            area_m2,
            planar_area,
            raw_geometry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn boundary(&self) -> &MultiPolygon<f64> {
        &self.boundary
    }

    pub fn area_m2(&self) -> f64 {
        self.area_m2
    }

    pub fn planar_area(&self) -> f64 {
        self.planar_area
    }

    pub fn raw_geometry(&self) -> &Value {
        &self.raw_geometry
    }
}

/// The partition of the study area. Immutable once loaded; iteration order is
/// the source feature order.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
    index: HashMap<String, usize>,
}

impl RegionSet {
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut index = HashMap::with_capacity(regions.len());
        for (i, region) in regions.iter().enumerate() {
            if index.insert(region.name.clone(), i).is_some() {
                return Err(HazardError::DuplicateRegion(region.name.clone()));
            }
        }
        Ok(Self { regions, index })
    }

    pub fn from_features(collection: &FeatureCollection, schema: &SourceSchema) -> Result<Self> {
        let mut regions = Vec::with_capacity(collection.features.len());
        for (i, feature) in collection.features.iter().enumerate() {
            let name = feature
                .property(&schema.region_name_key)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    HazardError::schema(
                        REGION_LAYER,
                        format!("feature {i} has no string `{}`", schema.region_name_key),
                    )
                })?;
            let area = feature
                .property(&schema.region_area_key)
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    HazardError::schema(
                        REGION_LAYER,
                        format!("region {name} has no numeric `{}`", schema.region_area_key),
                    )
                })?;
            let geometry = feature.decode_geometry(REGION_LAYER)?.ok_or_else(|| {
                HazardError::schema(REGION_LAYER, format!("region {name} has null geometry"))
            })?;
            let boundary = into_multi_polygon(geometry, REGION_LAYER)?;
            let raw = feature.geometry.clone().unwrap_or(Value::Null);
            regions.push(Region::new(name, boundary, area, raw)?);
        }
        tracing::info!(regions = regions.len(), "loaded region partition");
        Self::new(regions)
    }

    pub fn get(&self, name: &str) -> Result<&Region> {
        self.index
            .get(name)
            .map(|&i| &self.regions[i])
            .ok_or_else(|| HazardError::MissingRegion(name.to_string()))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(Region::name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
