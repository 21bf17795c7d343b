use crate::{AreaHazardScorer, LinearHazardScorer, PointHazardScorer};
use hazard_core::{HazardLayers, Normalizer, RegionSet, Result, ScoreVector, ScoringConfig};

/// The three normalized layer scores that feed the vulnerability index.
#[derive(Debug, Clone)]
pub struct LayerScores {
    pub slope: ScoreVector,
    pub building: ScoreVector,
    pub liquefaction: ScoreVector,
    pub unmatched_points: u64,
}

/// Runs the three scorers and min-max normalizes each output.
pub fn score_layers(
    regions: &RegionSet,
    layers: &HazardLayers,
    config: &ScoringConfig,
) -> Result<LayerScores> {
    let _span = tracing::info_span!("score_layers", regions = regions.len()).entered();
    let normalizer = Normalizer::from_config(config);

    let slope = LinearHazardScorer.score(regions, &layers.slopes)?;
    let slope = normalizer.normalize(slope)?;

    let tally = PointHazardScorer::new(config.workers).score(regions, &layers.buildings)?;
    let building = normalizer.normalize(tally.scores)?;

    let liquefaction =
        AreaHazardScorer::new(config.area_basis).score(regions, &layers.liquefaction)?;
    let liquefaction = normalizer.normalize(liquefaction)?;

    tracing::info!(
        slopes = layers.slopes.len(),
        buildings = tally.matched,
        liquefaction = layers.liquefaction.len(),
        "hazard layers scored"
    );
    Ok(LayerScores {
        slope,
        building,
        liquefaction,
        unmatched_points: tally.unmatched,
    })
}
