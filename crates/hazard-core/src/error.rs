use std::io;
use thiserror::Error;

/// Errors raised while loading, scoring or combining hazard layers.
#[derive(Debug, Error)]
pub enum HazardError {
    #[error("input schema error in {layer}: {detail}")]
    InputSchema { layer: String, detail: String },
    #[error("region not found: {0}")]
    MissingRegion(String),
    #[error("duplicate region name: {0}")]
    DuplicateRegion(String),
    #[error("invalid region {name}: {reason}")]
    InvalidRegion { name: String, reason: String },
    #[error("degenerate normalization: all {len} values equal {value}")]
    DegenerateNormalization { len: usize, value: f64 },
    #[error("point scoring worker {worker} failed: {reason}")]
    WorkerFailure { worker: usize, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl HazardError {
    pub fn schema(layer: impl Into<String>, detail: impl Into<String>) -> Self {
        HazardError::InputSchema {
            layer: layer.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HazardError>;
