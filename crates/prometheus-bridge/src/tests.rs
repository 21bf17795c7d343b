use crate::{observe_matrix, observe_outcome, PipelineMetrics, StageTimer};
use geo::{LineString, MultiPolygon, Polygon};
use hazard_core::{Region, RegionSet, ScoreVector};
use hazard_scorers::LayerScores;
use quake_risk::{PopulationDensityIndex, RiskIndexCalculator, VulnerabilityIndex, VulnerabilityOutcome};
use serde_json::Value;

fn regions() -> RegionSet {
    let cell = |name: &str, x0: f64| {
        let ring = LineString::from(vec![(x0, 0.0), (x0 + 1.0, 0.0), (x0 + 1.0, 1.0), (x0, 1.0), (x0, 0.0)]);
        Region::new(name, MultiPolygon::new(vec![Polygon::new(ring, vec![])]), 1e6, Value::Null).unwrap()
    };
    RegionSet::new(vec![cell("north", 0.0), cell("south", 1.0)]).unwrap()
}

fn index() -> VulnerabilityIndex {
    VulnerabilityIndex::new(ScoreVector::from_pairs([("north", 1.0), ("south", 0.0)]))
}

#[test]
fn separate_instances_do_not_collide() {
    let first = PipelineMetrics::new().unwrap();
    let second = PipelineMetrics::new().unwrap();
    first.regions.set(3.0);
    assert_eq!(second.regions.get(), 0.0);
}

#[test]
fn cached_outcome_counts_a_hit() {
    let metrics = PipelineMetrics::new().unwrap();
    observe_outcome(&metrics, &VulnerabilityOutcome::Cached(index()));

    assert_eq!(metrics.vulnerability_cache_hits.get(), 1);
    assert_eq!(metrics.region_vulnerability.with_label_values(&["north"]).get(), 1.0);
}

#[test]
fn computed_outcome_records_unmatched_points() {
    let metrics = PipelineMetrics::new().unwrap();
    let zero = ScoreVector::from_pairs([("north", 0.0), ("south", 0.0)]);
    let outcome = VulnerabilityOutcome::Computed {
        index: index(),
        layers: LayerScores {
            slope: zero.clone(),
            building: zero.clone(),
            liquefaction: zero,
            unmatched_points: 17,
        },
    };
    observe_outcome(&metrics, &outcome);

    assert_eq!(metrics.vulnerability_cache_hits.get(), 0);
    assert_eq!(metrics.unmatched_points.get(), 17.0);
}

#[test]
fn matrix_band_counts_are_exported() {
    let regions = regions();
    let density = PopulationDensityIndex::from_index(
        &regions,
        ScoreVector::from_pairs([("north", 1.0), ("south", 0.0)]),
    )
    .unwrap();
    let matrix = RiskIndexCalculator.compute(&regions, &index(), &density).unwrap();

    let metrics = PipelineMetrics::new().unwrap();
    observe_matrix(&metrics, &matrix);
    {
        let _timer = StageTimer::start(&metrics, "risk");
    }

    assert_eq!(metrics.regions.get(), 2.0);
    assert_eq!(metrics.risk_band_regions.with_label_values(&["4級", "low"]).get(), 1.0);
    assert_eq!(metrics.risk_band_regions.with_label_values(&["4級", "high"]).get(), 1.0);

    let text = metrics.render().unwrap();
    assert!(text.contains("quake_risk_risk_band_regions"));
    assert!(text.contains("quake_risk_stage_seconds{stage=\"risk\"}"));
}
