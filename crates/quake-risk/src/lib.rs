mod aggregator;
mod cache;
mod export;
mod population;
mod report;
mod risk;

#[cfg(test)]
mod tests;

pub use aggregator::{VulnerabilityAggregator, VulnerabilityIndex, VulnerabilityOutcome};
pub use hazard_core::round_to;
pub use cache::{VulnerabilityCache, VULNERABILITY_PROPERTY};
pub use export::{
    density_collection, region_collection, risk_collection, vulnerability_collection,
    write_risk_table, POP_DENSITY_PROPERTY,
};
pub use population::{NameAlias, PopulationDensityIndex, PopulationTable, PopulationTableLayout};
pub use report::RunReport;
pub use risk::{
    RiskBand, RiskIndexCalculator, RiskMatrix, RiskRow, Scenario, ScenarioBands,
    RISK_PRECISION, SCENARIOS,
};
