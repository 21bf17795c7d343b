use geo::{Area, BooleanOps, Intersects};
use hazard_core::{AreaBasis, AreaHazard, RegionSet, Result, ScoreVector};

/// Scores regions by class-weighted fractional overlap with liquefaction
/// polygons.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaHazardScorer {
    basis: AreaBasis,
}

impl AreaHazardScorer {
    pub fn new(basis: AreaBasis) -> Self {
        Self { basis }
    }

    /// Adds `weight(class) * overlap / region_area` per intersecting polygon.
    /// Overlapping hazard polygons accumulate, so a region can exceed the
    /// single-class weight.
    pub fn score(&self, regions: &RegionSet, hazards: &[AreaHazard]) -> Result<ScoreVector> {
        let mut scores = ScoreVector::zeroed(regions);
        for region in regions {
            let boundary = region.boundary();
            let region_area = match self.basis {
                AreaBasis::Geometric => region.planar_area(),
                AreaBasis::Authoritative => region.area_m2(),
            };
            for hazard in hazards {
                if !boundary.intersects(&hazard.polygon) {
                    continue;
                }
                let overlap = boundary.intersection(&hazard.polygon).unsigned_area();
                scores.add(region.name(), hazard.class.weight() * overlap / region_area)?;
            }
        }
        tracing::debug!(polygons = hazards.len(), basis = ?self.basis, "scored liquefaction hazards");
        Ok(scores)
    }
}
