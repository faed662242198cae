// Heat stack probe
use async_trait::async_trait;
use tracing::debug;

use crate::client::join_url;
use uptime_core::domain::ProbeOperation;
use uptime_core::port::{AuthToken, ProbeError, StackProbe};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Probe that issues one read-only Heat API call
#[derive(Clone)]
pub struct HeatProbe {
    client: reqwest::Client,
}

impl HeatProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Path below the Heat endpoint for `operation`
    pub fn path(operation: ProbeOperation) -> &'static str {
        match operation {
            ProbeOperation::StackList => "stacks",
            ProbeOperation::BuildInfo => "build_info",
        }
    }
}

#[async_trait]
impl StackProbe for HeatProbe {
    async fn probe(
        &self,
        endpoint: &str,
        token: &AuthToken,
        operation: ProbeOperation,
    ) -> Result<(), ProbeError> {
        let url = join_url(endpoint, Self::path(operation));
        debug!(url = %url, operation = %operation, "Probing Heat");

        let response = self
            .client
            .get(&url)
            .header(AUTH_TOKEN_HEADER, token.secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(probe_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                status: status.as_u16(),
            });
        }

        // Drain the payload: transfer time is part of the measurement
        let body = response.bytes().await.map_err(probe_error)?;
        debug!(bytes = body.len(), "Heat responded");
        Ok(())
    }
}

fn probe_error(e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout
    } else {
        ProbeError::Transport(e.to_string())
    }
}
