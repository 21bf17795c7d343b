use crate::split::split_at_boundary;
use geo::{Contains, EuclideanLength, Intersects, LineString, Point};
use hazard_core::{LinearHazard, RegionSet, Result, ScoreVector};

/// Scores regions by the length of slope line that lies inside them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearHazardScorer;

impl LinearHazardScorer {
    /// Raw summed length per region. Each line is cut at the region boundary
    /// and a piece counts for the region that contains its interior sample
    /// point. Cut points may fall a rounding step outside a slanted edge, so
    /// piece endpoints never decide membership. A piece running along the
    /// boundary itself adds nothing.
    pub fn score(&self, regions: &RegionSet, hazards: &[LinearHazard]) -> Result<ScoreVector> {
        let mut scores = ScoreVector::zeroed(regions);
        let mut uncontained = 0usize;

        for region in regions {
            let boundary = region.boundary();
            for hazard in hazards.iter().filter(|h| h.level.is_scored()) {
                if !hazard.line.intersects(boundary) {
                    continue;
                }
                let mut contributed = false;
                for piece in split_at_boundary(&hazard.line, boundary) {
                    let inside = interior_sample(&piece).is_some_and(|p| boundary.contains(&p));
                    if inside {
                        scores.add(region.name(), piece.euclidean_length())?;
                        contributed = true;
                    }
                }
                if !contributed {
                    uncontained += 1;
                }
            }
        }

        tracing::debug!(
            lines = hazards.len(),
            uncontained,
            total_length = scores.total(),
            "scored slope hazards"
        );
        Ok(scores)
    }
}

/// Midpoint of the longest segment of `piece`.
fn interior_sample(piece: &LineString<f64>) -> Option<Point<f64>> {
    piece
        .lines()
        .max_by(|a, b| a.euclidean_length().total_cmp(&b.euclidean_length()))
        .map(|segment| Point::from((segment.start + segment.end) / 2.0))
}
