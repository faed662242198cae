// Region Job - authenticate, time one Heat call, emit the timing

use super::context::MonitorContext;
use super::scheduler::{ScheduledJob, Scheduler};
use crate::domain::{metric_name, RegionConfig};
use crate::error::Result;
use crate::port::{AuthToken, ProbeResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// The per-region unit of work
pub struct RegionJob {
    region: RegionConfig,
    metric: String,
    context: Arc<MonitorContext>,
}

impl RegionJob {
    pub fn new(context: Arc<MonitorContext>, region: RegionConfig) -> Self {
        let metric = metric_name(context.global().metric_prefix(), region.name());
        Self {
            region,
            metric,
            context,
        }
    }

    pub fn region(&self) -> &RegionConfig {
        &self.region
    }

    /// Series this job emits to
    pub fn metric_name(&self) -> &str {
        &self.metric
    }

    /// One firing: credential exchange, timed probe, metric emission
    ///
    /// Returns the measured latency. Authentication and probe failures abort
    /// the firing before anything is emitted; an emission failure does not.
    ///
    /// # Errors
    /// - AppError::Authentication if the token exchange fails
    /// - AppError::Probe if the timed call fails
    pub async fn run_once(&self) -> Result<Duration> {
        let global = self.context.global();

        let token = self
            .context
            .resolver()
            .resolve(global.auth_url(), self.region.credentials())
            .await?;

        let elapsed = self.measure(&token).await?;

        if let Err(e) = self.context.emitter().timing(&self.metric, elapsed).await {
            debug!(metric = %self.metric, error = %e, "Metric emission failed");
        }

        info!(
            region = %self.region.name(),
            metric = %self.metric,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Probe succeeded"
        );
        Ok(elapsed)
    }

    /// Time the probe call alone; the token exchange is not measured
    async fn measure(&self, token: &AuthToken) -> ProbeResult {
        let operation = self.context.global().probe();
        let started = Instant::now();
        let outcome = self
            .context
            .probe()
            .probe(self.region.heat_url(), token, operation)
            .await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(()) => Ok(elapsed),
            Err(e) => {
                debug!(
                    operation = %operation,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Probe failed"
                );
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ScheduledJob for RegionJob {
    fn name(&self) -> &str {
        self.region.name()
    }

    async fn fire(&self) -> Result<()> {
        self.run_once().await.map(|_| ())
    }
}

/// One job per region, all sharing `context`
pub fn build_jobs(context: &Arc<MonitorContext>, regions: &[RegionConfig]) -> Vec<RegionJob> {
    regions
        .iter()
        .cloned()
        .map(|region| RegionJob::new(Arc::clone(context), region))
        .collect()
}

/// Register one job per region at the global interval
///
/// # Errors
/// - AppError::Scheduler if a region name is already registered
pub fn schedule_regions(
    scheduler: &mut Scheduler,
    context: &Arc<MonitorContext>,
    regions: &[RegionConfig],
) -> Result<usize> {
    let interval = context.global().interval();
    let jobs = build_jobs(context, regions);
    let count = jobs.len();
    for job in jobs {
        scheduler.register(Arc::new(job), interval)?;
    }
    Ok(count)
}
