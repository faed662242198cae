// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Duplicate region: {0}")]
    DuplicateRegion(String),

    #[error("Regions {first:?} and {second:?} both report to metric {metric}")]
    MetricNameCollision {
        metric: String,
        first: String,
        second: String,
    },

    #[error("Invalid region name: {0:?}")]
    InvalidRegionName(String),

    #[error("Interval must be positive")]
    ZeroInterval,

    #[error("No regions configured")]
    NoRegions,

    #[error("Unknown probe operation: {0}")]
    UnknownProbeOperation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
