use std::io;
use thiserror::Error;

/// Construction-time failure of a simulation. Never raised mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConfiguration {
    #[error("requested {requested} cars but the road only has {capacity} cells")]
    TooManyCars { requested: usize, capacity: usize },
    #[error("grid {rows}x{cols} is smaller than the minimum {min}x{min}")]
    GridTooSmall { rows: usize, cols: usize, min: usize },
}

/// Failure while loading or validating an experiment configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(&'static str),
}

/// Failure of an experiment sweep.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Configuration(#[from] InvalidConfiguration),
    #[error("csv output failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("output failed: {0}")]
    Io(#[from] io::Error),
    #[error("run with {total_cars} cars did not empty the grid within {steps} steps")]
    RunDidNotFinish { total_cars: usize, steps: u64 },
}
