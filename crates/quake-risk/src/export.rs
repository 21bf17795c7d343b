//! GeoJSON and CSV artifacts written at the end of a run.

use crate::aggregator::VulnerabilityIndex;
use crate::cache::VULNERABILITY_PROPERTY;
use crate::population::PopulationDensityIndex;
use crate::risk::{RiskMatrix, RISK_PRECISION, SCENARIOS};
use hazard_core::geojson::{Feature, FeatureCollection};
use hazard_core::{round_to, Region, RegionSet, Result};
use serde_json::{Map, Value};
use std::io::Write;

pub const POP_DENSITY_PROPERTY: &str = "POP_DENSITY";

/// One feature per region with its source geometry and `{name_key: name}`,
/// plus whatever `decorate` adds.
pub fn region_collection<F>(regions: &RegionSet, name_key: &str, mut decorate: F) -> Result<FeatureCollection>
where
    F: FnMut(&Region, &mut Map<String, Value>) -> Result<()>,
{
    let mut features = Vec::with_capacity(regions.len());
    for region in regions {
        let mut properties = Map::new();
        properties.insert(name_key.to_string(), Value::from(region.name()));
        decorate(region, &mut properties)?;
        features.push(Feature::new(Some(region.raw_geometry().clone()), properties));
    }
    Ok(FeatureCollection::new(features))
}

pub fn vulnerability_collection(
    regions: &RegionSet,
    name_key: &str,
    index: &VulnerabilityIndex,
) -> Result<FeatureCollection> {
    region_collection(regions, name_key, |region, props| {
        props.insert(VULNERABILITY_PROPERTY.into(), Value::from(index.get(region.name())?));
        Ok(())
    })
}

pub fn risk_collection(regions: &RegionSet, name_key: &str, matrix: &RiskMatrix) -> Result<FeatureCollection> {
    region_collection(regions, name_key, |region, props| {
        let row = matrix.row(region.name())?;
        for (scenario, value) in SCENARIOS.iter().zip(row.values) {
            props.insert(scenario.label.into(), Value::from(round_to(value, RISK_PRECISION)));
        }
        Ok(())
    })
}

pub fn density_collection(
    regions: &RegionSet,
    name_key: &str,
    density: &PopulationDensityIndex,
) -> Result<FeatureCollection> {
    region_collection(regions, name_key, |region, props| {
        props.insert(POP_DENSITY_PROPERTY.into(), Value::from(density.density(region.name())?));
        Ok(())
    })
}

/// `vname,intensity_4級,...` then one row per region, rounded.
pub fn write_risk_table<W: Write>(writer: W, matrix: &RiskMatrix) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["vname".to_string()];
    header.extend(SCENARIOS.iter().map(|s| format!("intensity_{}", s.label)));
    out.write_record(&header)?;

    for row in matrix.rows() {
        let mut record = vec![row.region.clone()];
        record.extend(
            row.values
                .iter()
                .map(|v| round_to(*v, RISK_PRECISION).to_string()),
        );
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}
