// Stack Probe Port
// The single read-only Heat call whose latency is measured

use super::credential_resolver::AuthToken;
use crate::domain::ProbeOperation;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Outcome of one timed probe: elapsed time or the reason it failed
pub type ProbeResult = Result<Duration, ProbeError>;

/// Probe failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("orchestration service returned HTTP {status}")]
    Status { status: u16 },

    #[error("orchestration request timed out")]
    Timeout,

    #[error("orchestration request failed: {0}")]
    Transport(String),
}

/// Stack probe port
///
/// Implementations:
/// - HeatProbe (infra-openstack): `GET /stacks` or `GET /build_info`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackProbe: Send + Sync {
    /// Perform `operation` against `endpoint`; the payload is discarded
    async fn probe(
        &self,
        endpoint: &str,
        token: &AuthToken,
        operation: ProbeOperation,
    ) -> Result<(), ProbeError>;
}

// ============================================================================
// Fake Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// One recorded probe invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ProbeCall {
        pub endpoint: String,
        pub token: String,
        pub operation: ProbeOperation,
    }

    #[derive(Default)]
    struct ProbeState {
        delay: Duration,
        failing: HashSet<String>,
        panicking: HashSet<String>,
        calls: Vec<ProbeCall>,
        in_flight: HashMap<String, usize>,
        max_in_flight: HashMap<String, usize>,
    }

    /// Probe with scriptable latency and per-endpoint failures
    ///
    /// Tracks the peak number of concurrent calls per endpoint so tests can
    /// assert that firings of one job never overlap.
    #[derive(Default, Clone)]
    pub struct FakeProbe {
        state: Arc<Mutex<ProbeState>>,
    }

    impl FakeProbe {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every call sleeps for `delay` (tokio clock) before answering
        pub fn with_delay(self, delay: Duration) -> Self {
            self.state.lock().unwrap().delay = delay;
            self
        }

        /// Answer HTTP 503 for `endpoint`
        pub fn fail_for(&self, endpoint: impl Into<String>) {
            self.state.lock().unwrap().failing.insert(endpoint.into());
        }

        /// Panic inside the call for `endpoint` (panic isolation testing)
        pub fn panic_for(&self, endpoint: impl Into<String>) {
            self.state.lock().unwrap().panicking.insert(endpoint.into());
        }

        pub fn calls(&self) -> Vec<ProbeCall> {
            self.state.lock().unwrap().calls.clone()
        }

        pub fn calls_to(&self, endpoint: &str) -> usize {
            self.state
                .lock()
                .unwrap()
                .calls
                .iter()
                .filter(|c| c.endpoint == endpoint)
                .count()
        }

        /// Highest number of simultaneous calls ever seen for `endpoint`
        pub fn max_in_flight(&self, endpoint: &str) -> usize {
            self.state
                .lock()
                .unwrap()
                .max_in_flight
                .get(endpoint)
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl StackProbe for FakeProbe {
        async fn probe(
            &self,
            endpoint: &str,
            token: &AuthToken,
            operation: ProbeOperation,
        ) -> Result<(), ProbeError> {
            let delay = {
                let mut state = self.state.lock().unwrap();
                state.calls.push(ProbeCall {
                    endpoint: endpoint.to_string(),
                    token: token.secret().to_string(),
                    operation,
                });
                let current = {
                    let n = state.in_flight.entry(endpoint.to_string()).or_insert(0);
                    *n += 1;
                    *n
                };
                let peak = state.max_in_flight.entry(endpoint.to_string()).or_insert(0);
                *peak = (*peak).max(current);
                state.delay
            };

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let (panics, fails) = {
                let mut state = self.state.lock().unwrap();
                if let Some(n) = state.in_flight.get_mut(endpoint) {
                    *n -= 1;
                }
                (
                    state.panicking.contains(endpoint),
                    state.failing.contains(endpoint),
                )
            };

            if panics {
                panic!("probe exploded for {endpoint}");
            }
            if fails {
                return Err(ProbeError::Status { status: 503 });
            }
            Ok(())
        }
    }
}
