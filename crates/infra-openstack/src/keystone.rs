// Keystone credential resolver (password grant, v2.0 and v3)
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{excerpt, join_url};
use uptime_core::domain::Credentials;
use uptime_core::port::{AuthError, AuthToken, CredentialResolver};

/// Header carrying the issued token in Keystone v3 responses
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Domain used for both user and project in v3 requests
const DEFAULT_DOMAIN_ID: &str = "default";

/// Keystone API flavour, chosen from the auth URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityVersion {
    V2,
    V3,
}

impl IdentityVersion {
    /// `.../v3` selects v3; anything else is treated as v2.0
    pub fn detect(auth_url: &str) -> Self {
        if auth_url.trim_end_matches('/').ends_with("/v3") {
            IdentityVersion::V3
        } else {
            IdentityVersion::V2
        }
    }
}

/// Resolver that exchanges a password for a token with Keystone
#[derive(Clone)]
pub struct KeystoneResolver {
    client: reqwest::Client,
}

impl KeystoneResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn resolve_v2(
        &self,
        auth_url: &str,
        credentials: &Credentials,
    ) -> Result<AuthToken, AuthError> {
        let body = V2Request {
            auth: V2Auth {
                tenant_name: &credentials.tenant,
                password_credentials: V2PasswordCredentials {
                    username: &credentials.username,
                    password: &credentials.password,
                },
            },
        };

        let response = self
            .client
            .post(join_url(auth_url, "tokens"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;

        let body = response.bytes().await.map_err(transport_error)?;
        let parsed: V2Response = serde_json::from_slice(&body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        Ok(AuthToken::new(parsed.access.token.id))
    }

    async fn resolve_v3(
        &self,
        auth_url: &str,
        credentials: &Credentials,
    ) -> Result<AuthToken, AuthError> {
        let domain = V3Domain {
            id: DEFAULT_DOMAIN_ID,
        };
        let body = V3Request {
            auth: V3Auth {
                identity: V3Identity {
                    methods: ["password"],
                    password: V3Password {
                        user: V3User {
                            name: &credentials.username,
                            domain: domain.clone(),
                            password: &credentials.password,
                        },
                    },
                },
                scope: V3Scope {
                    project: V3Project {
                        name: &credentials.tenant,
                        domain,
                    },
                },
            },
        };

        let response = self
            .client
            .post(join_url(auth_url, "auth/tokens"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;

        response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(AuthToken::new)
            .ok_or_else(|| AuthError::InvalidResponse(format!("missing {SUBJECT_TOKEN_HEADER} header")))
    }
}

#[async_trait]
impl CredentialResolver for KeystoneResolver {
    async fn resolve(
        &self,
        auth_url: &str,
        credentials: &Credentials,
    ) -> Result<AuthToken, AuthError> {
        let version = IdentityVersion::detect(auth_url);
        debug!(
            auth_url = %auth_url,
            username = %credentials.username,
            tenant = %credentials.tenant,
            version = ?version,
            "Requesting token"
        );

        match version {
            IdentityVersion::V2 => self.resolve_v2(auth_url, credentials).await,
            IdentityVersion::V3 => self.resolve_v3(auth_url, credentials).await,
        }
    }
}

fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Transport(e.to_string())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Rejected {
        status: status.as_u16(),
        message: excerpt(&body),
    })
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct V2Request<'a> {
    auth: V2Auth<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct V2Auth<'a> {
    tenant_name: &'a str,
    password_credentials: V2PasswordCredentials<'a>,
}

#[derive(Serialize)]
struct V2PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct V2Response {
    access: V2Access,
}

#[derive(Deserialize)]
struct V2Access {
    token: V2Token,
}

#[derive(Deserialize)]
struct V2Token {
    id: String,
}

#[derive(Serialize)]
struct V3Request<'a> {
    auth: V3Auth<'a>,
}

#[derive(Serialize)]
struct V3Auth<'a> {
    identity: V3Identity<'a>,
    scope: V3Scope<'a>,
}

#[derive(Serialize)]
struct V3Identity<'a> {
    methods: [&'static str; 1],
    password: V3Password<'a>,
}

#[derive(Serialize)]
struct V3Password<'a> {
    user: V3User<'a>,
}

#[derive(Serialize)]
struct V3User<'a> {
    name: &'a str,
    domain: V3Domain,
    password: &'a str,
}

#[derive(Serialize)]
struct V3Scope<'a> {
    project: V3Project<'a>,
}

#[derive(Serialize)]
struct V3Project<'a> {
    name: &'a str,
    domain: V3Domain,
}

#[derive(Serialize, Clone)]
struct V3Domain {
    id: &'static str,
}
