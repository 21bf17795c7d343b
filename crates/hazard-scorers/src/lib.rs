mod area;
mod layers;
mod linear;
mod partition;
mod point;
mod split;


pub use area::AreaHazardScorer;
pub use layers::{score_layers, LayerScores};
pub use linear::LinearHazardScorer;
pub use partition::fair_partition;
pub use point::{PointHazardScorer, PointTally};
pub use split::split_at_boundary;
