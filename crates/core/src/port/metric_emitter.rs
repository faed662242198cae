// Metric Emitter Port
// Fire-and-forget timing sink

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Emission failures. Never fatal to a job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("cannot resolve metrics backend {0}")]
    Unresolvable(String),

    #[error("failed to send metric: {0}")]
    Io(String),
}

/// Metric emitter port
///
/// Implementations:
/// - StatsdEmitter (infra-statsd): StatsD timing over UDP
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricEmitter: Send + Sync {
    /// Record `elapsed` under the series `name`. No acknowledgement.
    async fn timing(&self, name: &str, elapsed: Duration) -> Result<(), EmitError>;
}

// ============================================================================
// Fake Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Emitter that keeps every sample in memory
    #[derive(Default, Clone)]
    pub struct RecordingEmitter {
        samples: Arc<Mutex<Vec<(String, Duration)>>>,
        failing: Arc<Mutex<bool>>,
    }

    impl RecordingEmitter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every following emission fail (samples are still recorded)
        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }

        pub fn samples(&self) -> Vec<(String, Duration)> {
            self.samples.lock().unwrap().clone()
        }

        /// Samples recorded for one series
        pub fn samples_for(&self, name: &str) -> Vec<Duration> {
            self.samples
                .lock()
                .unwrap()
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, d)| *d)
                .collect()
        }
    }

    #[async_trait]
    impl MetricEmitter for RecordingEmitter {
        async fn timing(&self, name: &str, elapsed: Duration) -> Result<(), EmitError> {
            self.samples
                .lock()
                .unwrap()
                .push((name.to_string(), elapsed));
            if *self.failing.lock().unwrap() {
                return Err(EmitError::Io("connection refused".into()));
            }
            Ok(())
        }
    }
}
