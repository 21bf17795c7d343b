use serde::{Deserialize, Serialize};

/// What a zero-variance score vector normalizes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Every region maps to 0.0.
    #[default]
    Zero,
    /// Every region maps to 0.5.
    Half,
    /// Refuse with `HazardError::DegenerateNormalization`.
    Fail,
}

/// Denominator used when converting overlap area into a per-region fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AreaBasis {
    /// Planar area of the region geometry, in the same units as the overlap.
    #[default]
    Geometric,
    /// The `AREA` attribute carried by the region source data.
    Authoritative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub workers: usize,
    pub min_building_age: f64,
    pub degenerate: DegeneratePolicy,
    pub area_basis: AreaBasis,
    /// Decimal places kept after each min-max normalization; `None` keeps
    /// full precision.
    pub normalized_precision: Option<u32>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            min_building_age: 20.0,
            degenerate: DegeneratePolicy::Zero,
            area_basis: AreaBasis::Geometric,
            normalized_precision: None,
        }
    }
}

/// Property keys used by the source GeoJSON layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSchema {
    pub region_name_key: String,
    pub region_area_key: String,
    pub slope_level_key: String,
    pub building_age_key: String,
    pub liquefaction_class_key: String,
}

impl SourceSchema {
    pub fn default_for_taipei() -> Self {
        Self {
            region_name_key: "VNAME".into(),
            region_area_key: "AREA".into(),
            slope_level_key: "level".into(),
            building_age_key: "age_2021".into(),
            liquefaction_class_key: "class".into(),
        }
    }
}

impl Default for SourceSchema {
    fn default() -> Self {
        Self::default_for_taipei()
    }
}
