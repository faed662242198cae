// Domain Layer - Configuration entities and their invariants

pub mod error;
pub mod region;
pub mod settings;

// Re-exports
pub use error::DomainError;
pub use region::{metric_name, Credentials, RegionConfig};
pub use settings::{
    GlobalConfig, MetricsTarget, MonitorConfig, ProbeOperation, DEFAULT_METRIC_PREFIX,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_STATSD_HOST, DEFAULT_STATSD_PORT,
};
