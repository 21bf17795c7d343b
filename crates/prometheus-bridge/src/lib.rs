mod metrics;
mod observe;

#[cfg(test)]
mod tests;

pub use metrics::PipelineMetrics;
pub use observe::{observe_matrix, observe_outcome, StageTimer};
