use anyhow::Context;
use hazard_core::{ScoringConfig, SourceSchema};
use quake_risk::PopulationTableLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub regions: PathBuf,
    pub slopes: PathBuf,
    pub buildings: PathBuf,
    pub liquefaction: PathBuf,
    pub population: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            regions: "data/village.geojson".into(),
            slopes: "data/slope.geojson".into(),
            buildings: "data/building_age.geojson".into(),
            liquefaction: "data/liquefaction.geojson".into(),
            population: "data/population.csv".into(),
        }
    }
}

/// File names of the artifacts, relative to `output_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    pub vulnerability: String,
    pub risk: String,
    pub risk_table: String,
    pub density: String,
    pub report: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            vulnerability: "village_vulnerability.geojson".into(),
            risk: "village_risk.geojson".into(),
            risk_table: "village_risk.csv".into(),
            density: "village_pop_density.geojson".into(),
            report: "run_report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub inputs: InputPaths,
    pub output_dir: PathBuf,
    pub artifacts: ArtifactNames,
    pub schema: SourceSchema,
    pub scoring: ScoringConfig,
    pub population: PopulationTableLayout,
}

impl PipelineConfig {
    pub fn from_json(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn artifact(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.scoring.workers > 0, "scoring.workers must be at least 1");
        anyhow::ensure!(self.population.stride > 0, "population.stride must be at least 1");
        anyhow::ensure!(
            self.scoring.min_building_age.is_finite(),
            "scoring.min_building_age must be finite"
        );
        Ok(())
    }
}
