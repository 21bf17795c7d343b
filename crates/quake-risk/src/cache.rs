use crate::aggregator::VulnerabilityIndex;
use crate::export::vulnerability_collection;
use hazard_core::geojson::FeatureCollection;
use hazard_core::{HazardError, RegionSet, Result, ScoreVector};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const VULNERABILITY_PROPERTY: &str = "vulnerability";

const CACHE_LAYER: &str = "vulnerability cache";

/// The vulnerability GeoJSON artifact, reused as a cache across runs.
#[derive(Debug, Clone)]
pub struct VulnerabilityCache {
    path: PathBuf,
    name_key: String,
}

impl VulnerabilityCache {
    pub fn new(path: impl Into<PathBuf>, name_key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name_key: name_key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the persisted values as-is. Every region must appear, and every
    /// name in the artifact must be a known region.
    pub fn load(&self, regions: &RegionSet) -> Result<VulnerabilityIndex> {
        let collection = FeatureCollection::read(&self.path)?;
        let mut pairs = Vec::with_capacity(collection.features.len());
        for (i, feature) in collection.features.iter().enumerate() {
            let name = feature
                .property(&self.name_key)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    HazardError::schema(
                        CACHE_LAYER,
                        format!("feature {i} has no string `{}`", self.name_key),
                    )
                })?;
            let value = feature
                .property(VULNERABILITY_PROPERTY)
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    HazardError::schema(
                        CACHE_LAYER,
                        format!("region {name} has no numeric `{VULNERABILITY_PROPERTY}`"),
                    )
                })?;
            pairs.push((name.to_string(), value));
        }
        let scores = ScoreVector::from_pairs(pairs);
        scores.ensure_covers(regions)?;
        Ok(VulnerabilityIndex::new(scores))
    }

    pub fn store(&self, regions: &RegionSet, index: &VulnerabilityIndex) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        vulnerability_collection(regions, &self.name_key, index)?.write(&self.path)
    }
}
