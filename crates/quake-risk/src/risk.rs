//! Region × scenario risk matrix.

use crate::aggregator::VulnerabilityIndex;
use crate::population::PopulationDensityIndex;
use hazard_core::{round_to, HazardError, RegionSet, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Decimal places kept in persisted risk values.
pub const RISK_PRECISION: u32 = 5;

/// One earthquake intensity level and its weight fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scenario {
    pub label: &'static str,
    pub weight: f64,
}

/// Intensity scenarios in increasing weight order.
pub const SCENARIOS: [Scenario; 6] = [
    Scenario { label: "4級", weight: 0.0 },
    Scenario { label: "5弱", weight: 1.0 / 6.0 },
    Scenario { label: "5強", weight: 2.0 / 6.0 },
    Scenario { label: "6弱", weight: 3.0 / 6.0 },
    Scenario { label: "6強", weight: 4.0 / 6.0 },
    Scenario { label: "7級", weight: 5.0 / 6.0 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn classify(risk: f64) -> Self {
        if risk < 0.25 {
            RiskBand::Low
        } else if risk < 0.5 {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskRow {
    pub region: String,
    /// Unrounded, indexed like `SCENARIOS`.
    pub values: [f64; SCENARIOS.len()],
}

/// How many regions fall in each band for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioBands {
    pub scenario: &'static str,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RiskMatrix {
    rows: Vec<RiskRow>,
    index: HashMap<String, usize>,
}

impl RiskMatrix {
    pub fn rows(&self) -> &[RiskRow] {
        &self.rows
    }

    pub fn row(&self, region: &str) -> Result<&RiskRow> {
        self.index
            .get(region)
            .map(|&i| &self.rows[i])
            .ok_or_else(|| HazardError::MissingRegion(region.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn band_summary(&self) -> Vec<ScenarioBands> {
        SCENARIOS
            .iter()
            .enumerate()
            .map(|(i, scenario)| {
                let mut bands = ScenarioBands {
                    scenario: scenario.label,
                    low: 0,
                    medium: 0,
                    high: 0,
                };
                for row in &self.rows {
                    match RiskBand::classify(round_to(row.values[i], RISK_PRECISION)) {
                        RiskBand::Low => bands.low += 1,
                        RiskBand::Medium => bands.medium += 1,
                        RiskBand::High => bands.high += 1,
                    }
                }
                bands
            })
            .collect()
    }
}

/// `risk = (density_index + vulnerability + weight) / 3` for every region and
/// scenario. Always recomputed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskIndexCalculator;

impl RiskIndexCalculator {
    pub fn compute(
        &self,
        regions: &RegionSet,
        vulnerability: &VulnerabilityIndex,
        density: &PopulationDensityIndex,
    ) -> Result<RiskMatrix> {
        let mut rows = Vec::with_capacity(regions.len());
        let mut index = HashMap::with_capacity(regions.len());
        for name in regions.names() {
            let v = vulnerability.get(name)?;
            let d = density.index(name)?;
            let values = SCENARIOS.map(|s| (d + v + s.weight) / 3.0);
            index.insert(name.to_string(), rows.len());
            rows.push(RiskRow {
                region: name.to_string(),
                values,
            });
        }
        tracing::info!(regions = rows.len(), scenarios = SCENARIOS.len(), "risk matrix computed");
        Ok(RiskMatrix { rows, index })
    }
}
