//! Shared fixtures for the cross-crate scenario tests

use std::sync::Arc;
use uptime_core::application::region_job::schedule_regions;
use uptime_core::application::{MonitorContext, Scheduler};
use uptime_core::port::credential_resolver::mocks::FakeResolver;
use uptime_core::port::metric_emitter::mocks::RecordingEmitter;
use uptime_core::port::stack_probe::mocks::FakeProbe;

pub const WEST_URL: &str = "http://orc-west.example/v1/t";
pub const EAST_URL: &str = "http://orc-east.example/v1/t";

/// One region, 30 second interval
pub const WEST_ONLY: &str = "\
[DEFAULT]
auth_url = http://id.example/v2
interval = 30

[west]
username = west-user
password = p
tenant = t
heat_url = http://orc-west.example/v1/t
";

/// Two regions with distinct accounts and endpoints
pub const WEST_AND_EAST: &str = "\
[DEFAULT]
auth_url = http://id.example/v2
interval = 30
tenant = shared

[west]
username = west-user
password = p
heat_url = http://orc-west.example/v1/t

[east]
username = east-user
password = p
heat_url = http://orc-east.example/v1/t
";

/// A scheduler wired to in-memory fakes
pub struct Harness {
    pub scheduler: Scheduler,
    pub resolver: Arc<FakeResolver>,
    pub probe: FakeProbe,
    pub emitter: RecordingEmitter,
}

impl Harness {
    /// Parse `config_text` and register one job per region (not started)
    pub fn new(config_text: &str, probe: FakeProbe) -> Self {
        let config = uptime_infra_config::parse_str(config_text).expect("valid config");
        let (global, regions) = config.into_parts();

        let resolver = Arc::new(FakeResolver::new());
        let emitter = RecordingEmitter::new();
        let context = Arc::new(MonitorContext::new(
            global,
            resolver.clone(),
            Arc::new(probe.clone()),
            Arc::new(emitter.clone()),
        ));

        let mut scheduler = Scheduler::new();
        schedule_regions(&mut scheduler, &context, &regions).expect("regions registered");

        Self {
            scheduler,
            resolver,
            probe,
            emitter,
        }
    }

    /// Parse, register and start
    pub fn started(config_text: &str, probe: FakeProbe) -> Self {
        let harness = Self::new(config_text, probe);
        harness.scheduler.start().expect("scheduler started");
        harness
    }
}
