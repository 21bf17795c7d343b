use crate::config::{DegeneratePolicy, ScoringConfig};
use crate::error::{HazardError, Result};
use crate::region::RegionSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-region score for one hazard layer (or a combination of layers).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreVector {
    values: BTreeMap<String, f64>,
}

impl ScoreVector {
    /// One zero entry per region.
    pub fn zeroed(regions: &RegionSet) -> Self {
        Self {
            values: regions.names().map(|n| (n.to_string(), 0.0)).collect(),
        }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn add(&mut self, name: &str, amount: f64) -> Result<()> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| HazardError::MissingRegion(name.to_string()))?;
        *slot += amount;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| HazardError::MissingRegion(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.values().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.values().copied().reduce(f64::max)
    }

    /// Fails with `MissingRegion` unless every region has an entry.
    pub fn ensure_covers(&self, regions: &RegionSet) -> Result<()> {
        for name in regions.names() {
            if !self.values.contains_key(name) {
                return Err(HazardError::MissingRegion(name.to_string()));
            }
        }
        for name in self.values.keys() {
            if !regions.contains(name) {
                return Err(HazardError::MissingRegion(name.clone()));
            }
        }
        Ok(())
    }
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

/// Min-max rescaling onto `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    policy: DegeneratePolicy,
    precision: Option<u32>,
}

impl Normalizer {
    pub fn new(policy: DegeneratePolicy) -> Self {
        Self {
            policy,
            precision: None,
        }
    }

    /// Rounds every normalized value to `places` decimals when set.
    pub fn with_precision(mut self, places: Option<u32>) -> Self {
        self.precision = places;
        self
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.degenerate).with_precision(config.normalized_precision)
    }

    pub fn policy(&self) -> DegeneratePolicy {
        self.policy
    }

    /// `(v - min) / (max - min)` over the whole vector, rewritten in place.
    /// A vector whose values are all equal is resolved by the configured
    /// `DegeneratePolicy`.
    pub fn normalize(&self, mut scores: ScoreVector) -> Result<ScoreVector> {
        let (Some(min), Some(max)) = (scores.min(), scores.max()) else {
            return Ok(scores);
        };
        if !min.is_finite() || !max.is_finite() {
            return Err(HazardError::schema(
                "scores",
                format!("non-finite score range [{min}, {max}]"),
            ));
        }

        let span = max - min;
        if span == 0.0 {
            let fill = match self.policy {
                DegeneratePolicy::Zero => 0.0,
                DegeneratePolicy::Half => 0.5,
                DegeneratePolicy::Fail => {
                    return Err(HazardError::DegenerateNormalization {
                        len: scores.len(),
                        value: min,
                    })
                }
            };
            tracing::debug!(len = scores.len(), value = min, fill, "degenerate normalization");
            scores.values.values_mut().for_each(|v| *v = fill);
            return Ok(scores);
        }

        for v in scores.values.values_mut() {
            let scaled = ((*v - min) / span).clamp(0.0, 1.0);
            *v = match self.precision {
                Some(places) => round_to(scaled, places),
                None => scaled,
            };
        }
        Ok(scores)
    }
}
