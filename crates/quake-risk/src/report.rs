use crate::aggregator::VulnerabilityOutcome;
use crate::risk::{RiskMatrix, ScenarioBands};
use chrono::{NaiveDate, Utc};
use hazard_core::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Summary of one pipeline run, written next to the artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub date: NaiveDate,
    pub regions: usize,
    pub vulnerability_cached: bool,
    /// `None` when the cache short-circuited scoring.
    pub unmatched_points: Option<u64>,
    pub bands: Vec<ScenarioBands>,
    pub artifacts: Vec<String>,
}

impl RunReport {
    pub fn new(outcome: &VulnerabilityOutcome, matrix: &RiskMatrix) -> Self {
        Self {
            date: Utc::now().date_naive(),
            regions: matrix.len(),
            vulnerability_cached: outcome.is_cached(),
            unmatched_points: outcome.layers().map(|l| l.unmatched_points),
            bands: matrix.band_summary(),
            artifacts: Vec::new(),
        }
    }

    pub fn record_artifact(&mut self, path: &Path) {
        self.artifacts.push(path.display().to_string());
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
