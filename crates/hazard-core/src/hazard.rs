use crate::config::{ScoringConfig, SourceSchema};
use crate::error::{HazardError, Result};
use crate::geojson::{into_line_strings, into_multi_polygon, into_points, FeatureCollection};
use geo::{LineString, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SLOPE_LAYER: &str = "slopes";
pub const BUILDING_LAYER: &str = "buildings";
pub const LIQUEFACTION_LAYER: &str = "liquefaction";

/// Patrol classification of an artificial slope, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlopeLevel {
    /// 第一類: immediate danger.
    Immediate,
    /// 第二類: potential danger.
    Potential,
    /// 第三類: evident signs.
    Evident,
    /// 第四類: slight signs.
    Slight,
    /// 第五類: no visible sign.
    NoSign,
}

impl SlopeLevel {
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim() {
            "第一類" | "level-1" => Ok(SlopeLevel::Immediate),
            "第二類" | "level-2" => Ok(SlopeLevel::Potential),
            "第三類" | "level-3" => Ok(SlopeLevel::Evident),
            "第四類" | "level-4" => Ok(SlopeLevel::Slight),
            "第五類" | "level-5" => Ok(SlopeLevel::NoSign),
            other => Err(HazardError::schema(
                SLOPE_LAYER,
                format!("unknown slope level {other:?}"),
            )),
        }
    }

    pub fn is_scored(self) -> bool {
        self != SlopeLevel::NoSign
    }
}

/// Soil liquefaction potential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquefactionClass {
    High,
    Medium,
    Low,
}

impl LiquefactionClass {
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim() {
            "高" | "high" => Ok(LiquefactionClass::High),
            "中" | "medium" => Ok(LiquefactionClass::Medium),
            "低" | "low" => Ok(LiquefactionClass::Low),
            other => Err(HazardError::schema(
                LIQUEFACTION_LAYER,
                format!("unknown liquefaction class {other:?}"),
            )),
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            LiquefactionClass::High => 3.0,
            LiquefactionClass::Medium => 2.0,
            LiquefactionClass::Low => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinearHazard {
    pub line: LineString<f64>,
    pub level: SlopeLevel,
}

#[derive(Debug, Clone)]
pub struct PointHazard {
    pub point: Point<f64>,
    pub age_years: f64,
}

#[derive(Debug, Clone)]
pub struct AreaHazard {
    pub polygon: MultiPolygon<f64>,
    pub class: LiquefactionClass,
}

/// The three hazard layers after ingestion filtering.
#[derive(Debug, Clone, Default)]
pub struct HazardLayers {
    pub slopes: Vec<LinearHazard>,
    pub buildings: Vec<PointHazard>,
    pub liquefaction: Vec<AreaHazard>,
}

fn string_property<'a>(
    value: Option<&'a Value>,
    layer: &str,
    key: &str,
    index: usize,
) -> Result<&'a str> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| HazardError::schema(layer, format!("feature {index} has no string `{key}`")))
}

/// Slope lines, minus the no-visible-sign class. Multi-part lines are split
/// into one hazard per part.
pub fn load_linear_hazards(
    collection: &FeatureCollection,
    schema: &SourceSchema,
) -> Result<Vec<LinearHazard>> {
    let mut hazards = Vec::new();
    let mut excluded = 0usize;
    for (i, feature) in collection.features.iter().enumerate() {
        let label = string_property(
            feature.property(&schema.slope_level_key),
            SLOPE_LAYER,
            &schema.slope_level_key,
            i,
        )?;
        let level = SlopeLevel::from_label(label)?;
        if !level.is_scored() {
            excluded += 1;
            continue;
        }
        let geometry = feature
            .decode_geometry(SLOPE_LAYER)?
            .ok_or_else(|| HazardError::schema(SLOPE_LAYER, format!("feature {i} has null geometry")))?;
        for line in into_line_strings(geometry, SLOPE_LAYER)? {
            hazards.push(LinearHazard { line, level });
        }
    }
    tracing::info!(kept = hazards.len(), excluded, "loaded slope hazards");
    Ok(hazards)
}

/// Building points older than `config.min_building_age`. Features with a null
/// geometry are discarded.
pub fn load_point_hazards(
    collection: &FeatureCollection,
    schema: &SourceSchema,
    config: &ScoringConfig,
) -> Result<Vec<PointHazard>> {
    let mut hazards = Vec::new();
    let mut no_geometry = 0usize;
    let mut too_young = 0usize;
    for (i, feature) in collection.features.iter().enumerate() {
        let Some(geometry) = feature.decode_geometry(BUILDING_LAYER)? else {
            no_geometry += 1;
            continue;
        };
        let age_years = feature
            .property(&schema.building_age_key)
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                HazardError::schema(
                    BUILDING_LAYER,
                    format!("feature {i} has no numeric `{}`", schema.building_age_key),
                )
            })?;
        if age_years <= config.min_building_age {
            too_young += 1;
            continue;
        }
        for point in into_points(geometry, BUILDING_LAYER)? {
            hazards.push(PointHazard { point, age_years });
        }
    }
    tracing::info!(
        kept = hazards.len(),
        no_geometry,
        too_young,
        min_age = config.min_building_age,
        "loaded building hazards"
    );
    Ok(hazards)
}

/// Liquefaction polygons paired with their class, in source order.
pub fn load_area_hazards(
    collection: &FeatureCollection,
    schema: &SourceSchema,
) -> Result<Vec<AreaHazard>> {
    let mut hazards = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.iter().enumerate() {
        let label = string_property(
            feature.property(&schema.liquefaction_class_key),
            LIQUEFACTION_LAYER,
            &schema.liquefaction_class_key,
            i,
        )?;
        let class = LiquefactionClass::from_label(label)?;
        let geometry = feature.decode_geometry(LIQUEFACTION_LAYER)?.ok_or_else(|| {
            HazardError::schema(LIQUEFACTION_LAYER, format!("feature {i} has null geometry"))
        })?;
        let polygon = into_multi_polygon(geometry, LIQUEFACTION_LAYER)?;
        hazards.push(AreaHazard { polygon, class });
    }
    tracing::info!(kept = hazards.len(), "loaded liquefaction hazards");
    Ok(hazards)
}
