// Region entity: one monitored Heat endpoint and the account used to reach it

use super::error::{DomainError, Result};
use std::fmt;

/// Characters with meaning in the StatsD line protocol
const RESERVED_METRIC_CHARS: [char; 3] = [':', '|', '@'];

/// Username / password / tenant triple exchanged for a token
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub tenant: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            tenant: tenant.into(),
        }
    }
}

// Passwords must never reach the logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// One configured region. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    name: String,
    credentials: Credentials,
    heat_url: String,
}

impl RegionConfig {
    /// Create a region, rejecting empty or whitespace-only names
    pub fn new(
        name: impl Into<String>,
        credentials: Credentials,
        heat_url: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidRegionName(name));
        }
        let heat_url = heat_url.into();
        if heat_url.trim().is_empty() {
            return Err(DomainError::ValidationError(format!(
                "region {name}: heat_url is empty"
            )));
        }
        Ok(Self {
            name,
            credentials,
            heat_url,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn heat_url(&self) -> &str {
        &self.heat_url
    }
}

/// Metric series name for a region: `<prefix>.<region>`
///
/// Deterministic, so a region always lands in the same series. Protocol
/// characters and whitespace in the region are replaced with `_`.
pub fn metric_name(prefix: &str, region: &str) -> String {
    let region: String = region
        .chars()
        .map(|c| {
            if c.is_whitespace() || RESERVED_METRIC_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    if prefix.is_empty() {
        region
    } else {
        format!("{prefix}.{region}")
    }
}
