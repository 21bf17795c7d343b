use crate::PipelineMetrics;
use quake_risk::{RiskBand, RiskMatrix, VulnerabilityOutcome};
use std::time::Instant;

pub fn observe_outcome(metrics: &PipelineMetrics, outcome: &VulnerabilityOutcome) {
    match outcome.layers() {
        Some(layers) => metrics.unmatched_points.set(layers.unmatched_points as f64),
        None => metrics.vulnerability_cache_hits.inc(),
    }
    for (region, value) in outcome.index().scores().iter() {
        metrics
            .region_vulnerability
            .with_label_values(&[region])
            .set(value);
    }
}

pub fn observe_matrix(metrics: &PipelineMetrics, matrix: &RiskMatrix) {
    metrics.regions.set(matrix.len() as f64);
    for bands in matrix.band_summary() {
        for (band, count) in [
            (RiskBand::Low, bands.low),
            (RiskBand::Medium, bands.medium),
            (RiskBand::High, bands.high),
        ] {
            metrics
                .risk_band_regions
                .with_label_values(&[bands.scenario, band.as_str()])
                .set(count as f64);
        }
    }
}

/// Records the elapsed seconds for `stage` when dropped.
pub struct StageTimer<'a> {
    metrics: &'a PipelineMetrics,
    stage: &'static str,
    started: Instant,
}

impl<'a> StageTimer<'a> {
    pub fn start(metrics: &'a PipelineMetrics, stage: &'static str) -> Self {
        Self {
            metrics,
            stage,
            started: Instant::now(),
        }
    }
}

impl Drop for StageTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.metrics
            .stage_seconds
            .with_label_values(&[self.stage])
            .set(elapsed);
        tracing::debug!(stage = self.stage, seconds = elapsed, "stage finished");
    }
}
