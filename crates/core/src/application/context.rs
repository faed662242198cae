// Monitor context: everything a firing needs, built once at startup

use crate::domain::GlobalConfig;
use crate::port::{CredentialResolver, MetricEmitter, StackProbe};
use std::sync::Arc;

/// Shared, read-only state handed to every region job
///
/// Replaces process-wide singletons: the daemon builds one and clones the
/// `Arc` into each job.
pub struct MonitorContext {
    global: GlobalConfig,
    resolver: Arc<dyn CredentialResolver>,
    probe: Arc<dyn StackProbe>,
    emitter: Arc<dyn MetricEmitter>,
}

impl MonitorContext {
    pub fn new(
        global: GlobalConfig,
        resolver: Arc<dyn CredentialResolver>,
        probe: Arc<dyn StackProbe>,
        emitter: Arc<dyn MetricEmitter>,
    ) -> Self {
        Self {
            global,
            resolver,
            probe,
            emitter,
        }
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn resolver(&self) -> &dyn CredentialResolver {
        self.resolver.as_ref()
    }

    pub fn probe(&self) -> &dyn StackProbe {
        self.probe.as_ref()
    }

    pub fn emitter(&self) -> &dyn MetricEmitter {
        self.emitter.as_ref()
    }
}
