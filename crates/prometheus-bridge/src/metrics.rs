use anyhow::Context;
use prometheus::{Encoder, Gauge, GaugeVec, IntCounter, Opts, Registry, TextEncoder};
use std::fs;
use std::path::Path;

/// Pipeline gauges, registered on a registry owned by this struct rather than
/// the process-wide default one.
pub struct PipelineMetrics {
    registry: Registry,
    pub features_loaded: GaugeVec,
    pub regions: Gauge,
    pub unmatched_points: Gauge,
    pub stage_seconds: GaugeVec,
    pub vulnerability_cache_hits: IntCounter,
    pub region_vulnerability: GaugeVec,
    pub risk_band_regions: GaugeVec,
}

impl PipelineMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("quake_risk".into()), None)?;

        let features_loaded = GaugeVec::new(
            Opts::new("features_loaded", "Hazard features kept after filtering, per layer"),
            &["layer"],
        )?;
        let regions = Gauge::new("regions", "Villages in the region partition")?;
        let unmatched_points = Gauge::new(
            "unmatched_points",
            "Building points not contained by any village",
        )?;
        let stage_seconds = GaugeVec::new(
            Opts::new("stage_seconds", "Wall time of the last run of each pipeline stage"),
            &["stage"],
        )?;
        let vulnerability_cache_hits = IntCounter::new(
            "vulnerability_cache_hits_total",
            "Runs that reused the persisted vulnerability index",
        )?;
        let region_vulnerability = GaugeVec::new(
            Opts::new("region_vulnerability", "Vulnerability index per village"),
            &["region"],
        )?;
        let risk_band_regions = GaugeVec::new(
            Opts::new("risk_band_regions", "Villages per risk band and intensity scenario"),
            &["scenario", "band"],
        )?;

        registry.register(Box::new(features_loaded.clone()))?;
        registry.register(Box::new(regions.clone()))?;
        registry.register(Box::new(unmatched_points.clone()))?;
        registry.register(Box::new(stage_seconds.clone()))?;
        registry.register(Box::new(vulnerability_cache_hits.clone()))?;
        registry.register(Box::new(region_vulnerability.clone()))?;
        registry.register(Box::new(risk_band_regions.clone()))?;

        Ok(Self {
            registry,
            features_loaded,
            regions,
            unmatched_points,
            stage_seconds,
            vulnerability_cache_hits,
            region_vulnerability,
            risk_band_regions,
        })
    }

    pub fn set_features_loaded(&self, layer: &str, count: usize) {
        self.features_loaded
            .with_label_values(&[layer])
            .set(count as f64);
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("encoding metrics")?;
        String::from_utf8(buffer).context("metrics exposition is not UTF-8")
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let text = self.render()?;
        fs::write(path, text).with_context(|| format!("writing metrics to {}", path.display()))
    }
}
