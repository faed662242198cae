//! Heat Uptime - Main Entry Point
//! Times one Heat API call per region on a fixed interval and reports it to StatsD

mod logging;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

// Import workspace crates
use uptime_core::application::region_job::schedule_regions;
use uptime_core::application::scheduler::constants::DEFAULT_SHUTDOWN_GRACE_PERIOD;
use uptime_core::application::{MonitorContext, Scheduler};
use uptime_infra_config::DEFAULT_CONFIG_PATH;
use uptime_infra_openstack::{http_client, HeatProbe, KeystoneResolver};
use uptime_infra_statsd::StatsdEmitter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status when a second signal interrupts a graceful shutdown
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "heat-uptime")]
#[command(about = "Get uptime metrics for Heat endpoints", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    let log_guard = logging::init()?;
    info!("Heat uptime v{} starting...", VERSION);

    // 2. Load configuration (fatal on any error, before anything is scheduled)
    let config_path = shellexpand::tilde(&cli.config).into_owned();
    let config = uptime_infra_config::load(Path::new(&config_path))
        .inspect_err(|e| error!(path = %config_path, error = %e, "Configuration rejected"))
        .with_context(|| format!("failed to load configuration from {config_path}"))?;
    let (global, regions) = config.into_parts();

    // 3. Setup dependencies (DI wiring)
    let client = http_client(global.request_timeout())?;
    let resolver = Arc::new(KeystoneResolver::new(client.clone()));
    let probe = Arc::new(HeatProbe::new(client));
    let emitter = Arc::new(StatsdEmitter::bind(global.metrics()).await?);
    info!(
        statsd = %emitter.target(),
        auth_url = %global.auth_url(),
        probe = %global.probe(),
        "Adapters ready"
    );

    let context = Arc::new(MonitorContext::new(global, resolver, probe, emitter));

    // 4. One job per region
    let mut scheduler = Scheduler::new().with_grace_period(DEFAULT_SHUTDOWN_GRACE_PERIOD);
    schedule_regions(&mut scheduler, &context, &regions)?;
    for job in scheduler.jobs() {
        info!(
            region = %job.name,
            interval_secs = job.interval.as_secs(),
            "Region scheduled"
        );
    }

    // 5. Start firing in the background
    scheduler.start()?;
    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    let signal = signals::shutdown_requested()
        .await
        .context("failed to listen for shutdown signals")?;
    info!(signal, "Shutdown signal received. Stopping scheduler...");

    // 7. Graceful shutdown; a second signal forces exit
    tokio::select! {
        _ = scheduler.shutdown() => {}
        second = signals::shutdown_requested() => {
            warn!(signal = ?second.ok(), "Second signal received, forcing exit");
            // Flush buffered log lines; process::exit skips destructors
            drop(log_guard);
            std::process::exit(FORCED_EXIT_CODE);
        }
    }

    info!("Shutdown complete.");
    Ok(())
}
