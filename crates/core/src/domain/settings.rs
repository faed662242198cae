// Global settings shared read-only by every region job

use super::error::{DomainError, Result};
use super::region::{metric_name, RegionConfig};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// StatsD host used when the configuration leaves it unset
pub const DEFAULT_STATSD_HOST: &str = "localhost";

/// Standard StatsD UDP port
pub const DEFAULT_STATSD_PORT: u16 = 8125;

/// Metric series prefix (`uptime.<region>`)
pub const DEFAULT_METRIC_PREFIX: &str = "uptime";

/// Upper bound on a single identity or probe HTTP call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The Heat API call that is timed on every firing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeOperation {
    /// `GET /stacks`
    #[default]
    StackList,
    /// `GET /build_info`, a lightweight call that skips the database
    BuildInfo,
}

impl ProbeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOperation::StackList => "stack_list",
            ProbeOperation::BuildInfo => "build_info",
        }
    }
}

impl fmt::Display for ProbeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stack_list" | "stacks" => Ok(ProbeOperation::StackList),
            "build_info" => Ok(ProbeOperation::BuildInfo),
            other => Err(DomainError::UnknownProbeOperation(other.to_string())),
        }
    }
}

/// Where timings are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsTarget {
    pub host: String,
    pub port: u16,
}

impl MetricsTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, suitable for socket address resolution
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for MetricsTarget {
    fn default() -> Self {
        Self::new(DEFAULT_STATSD_HOST, DEFAULT_STATSD_PORT)
    }
}

/// Settings from the default section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    auth_url: String,
    interval: Duration,
    metrics: MetricsTarget,
    metric_prefix: String,
    probe: ProbeOperation,
    request_timeout: Duration,
}

impl GlobalConfig {
    /// Create settings with defaults for every optional value
    ///
    /// # Errors
    /// - `DomainError::ZeroInterval` if `interval` is zero
    /// - `DomainError::ValidationError` if `auth_url` is empty
    pub fn new(auth_url: impl Into<String>, interval: Duration) -> Result<Self> {
        let auth_url = auth_url.into();
        if auth_url.trim().is_empty() {
            return Err(DomainError::ValidationError("auth_url is empty".into()));
        }
        if interval.is_zero() {
            return Err(DomainError::ZeroInterval);
        }
        Ok(Self {
            auth_url,
            interval,
            metrics: MetricsTarget::default(),
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
            probe: ProbeOperation::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_metrics(mut self, metrics: MetricsTarget) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_metric_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metric_prefix = prefix.into();
        self
    }

    pub fn with_probe(mut self, probe: ProbeOperation) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(DomainError::ValidationError(
                "request timeout must be positive".into(),
            ));
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn metrics(&self) -> &MetricsTarget {
        &self.metrics
    }

    pub fn metric_prefix(&self) -> &str {
        &self.metric_prefix
    }

    pub fn probe(&self) -> ProbeOperation {
        self.probe
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// A fully validated configuration set: what the core runs from
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    global: GlobalConfig,
    regions: Vec<RegionConfig>,
}

impl MonitorConfig {
    /// Validate the region set. Order is preserved.
    ///
    /// # Errors
    /// - `DomainError::NoRegions` for an empty set
    /// - `DomainError::DuplicateRegion` if two regions share a name
    /// - `DomainError::MetricNameCollision` if two names map to one series
    pub fn new(global: GlobalConfig, regions: Vec<RegionConfig>) -> Result<Self> {
        if regions.is_empty() {
            return Err(DomainError::NoRegions);
        }

        let mut seen = HashSet::with_capacity(regions.len());
        let mut metrics: HashMap<String, &str> = HashMap::with_capacity(regions.len());
        for region in &regions {
            if !seen.insert(region.name()) {
                return Err(DomainError::DuplicateRegion(region.name().to_string()));
            }
            let metric = metric_name(global.metric_prefix(), region.name());
            if let Some(first) = metrics.get(&metric) {
                return Err(DomainError::MetricNameCollision {
                    metric,
                    first: first.to_string(),
                    second: region.name().to_string(),
                });
            }
            metrics.insert(metric, region.name());
        }

        Ok(Self { global, regions })
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn regions(&self) -> &[RegionConfig] {
        &self.regions
    }

    pub fn into_parts(self) -> (GlobalConfig, Vec<RegionConfig>) {
        (self.global, self.regions)
    }
}
