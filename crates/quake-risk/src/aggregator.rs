use crate::cache::VulnerabilityCache;
use hazard_core::{DegeneratePolicy, Normalizer, RegionSet, Result, ScoreVector};
use hazard_scorers::LayerScores;

/// Combined, normalized hazard score per region, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityIndex(ScoreVector);

impl VulnerabilityIndex {
    pub fn new(scores: ScoreVector) -> Self {
        Self(scores)
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        self.0.get(name)
    }

    pub fn scores(&self) -> &ScoreVector {
        &self.0
    }
}

/// Where this run's vulnerability index came from.
#[derive(Debug, Clone)]
pub enum VulnerabilityOutcome {
    /// Loaded from the persisted artifact; no scorer ran.
    Cached(VulnerabilityIndex),
    Computed {
        index: VulnerabilityIndex,
        layers: LayerScores,
    },
}

impl VulnerabilityOutcome {
    pub fn index(&self) -> &VulnerabilityIndex {
        match self {
            VulnerabilityOutcome::Cached(index) => index,
            VulnerabilityOutcome::Computed { index, .. } => index,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, VulnerabilityOutcome::Cached(_))
    }

    pub fn layers(&self) -> Option<&LayerScores> {
        match self {
            VulnerabilityOutcome::Cached(_) => None,
            VulnerabilityOutcome::Computed { layers, .. } => Some(layers),
        }
    }
}

pub struct VulnerabilityAggregator {
    normalizer: Normalizer,
    cache: Option<VulnerabilityCache>,
}

impl VulnerabilityAggregator {
    pub fn new(policy: DegeneratePolicy) -> Self {
        Self {
            normalizer: Normalizer::new(policy),
            cache: None,
        }
    }

    pub fn with_precision(mut self, places: Option<u32>) -> Self {
        self.normalizer = self.normalizer.with_precision(places);
        self
    }

    pub fn with_cache(mut self, cache: VulnerabilityCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Arithmetic mean of the three normalized layers, min-max normalized a
    /// second time.
    pub fn combine(&self, regions: &RegionSet, layers: &LayerScores) -> Result<VulnerabilityIndex> {
        let mut combined = Vec::with_capacity(regions.len());
        for name in regions.names() {
            let sum = layers.slope.get(name)?
                + layers.building.get(name)?
                + layers.liquefaction.get(name)?;
            combined.push((name, sum / 3.0));
        }
        let scores = self.normalizer.normalize(ScoreVector::from_pairs(combined))?;
        Ok(VulnerabilityIndex(scores))
    }

    /// Returns the persisted index when the cache artifact exists, without
    /// calling `score`. Otherwise scores the layers, combines them and
    /// persists the result. The artifact is never checked against the
    /// hazard inputs.
    pub fn resolve<F>(&self, regions: &RegionSet, score: F) -> Result<VulnerabilityOutcome>
    where
        F: FnOnce() -> Result<LayerScores>,
    {
        if let Some(cache) = self.cache.as_ref().filter(|c| c.exists()) {
            tracing::info!(path = %cache.path().display(), "using persisted vulnerability index");
            return Ok(VulnerabilityOutcome::Cached(cache.load(regions)?));
        }

        let layers = score()?;
        let index = self.combine(regions, &layers)?;
        if let Some(cache) = &self.cache {
            cache.store(regions, &index)?;
            tracing::info!(path = %cache.path().display(), "persisted vulnerability index");
        }
        Ok(VulnerabilityOutcome::Computed { index, layers })
    }
}
