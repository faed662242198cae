// Credential Resolver Port
// Exchanges a region's account for a short-lived bearer token

use crate::domain::Credentials;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Opaque bearer token returned by the identity service
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value, for the `X-Auth-Token` header only
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Credential exchange failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("identity service rejected credentials (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("identity request timed out")]
    Timeout,

    #[error("identity request failed: {0}")]
    Transport(String),

    #[error("invalid identity response: {0}")]
    InvalidResponse(String),
}

/// Credential resolver port
///
/// Implementations:
/// - KeystoneResolver (infra-openstack): Keystone v2.0 / v3 password auth
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Exchange `credentials` against `auth_url` for a token
    ///
    /// # Errors
    /// - AuthError::Rejected for bad credentials or any non-success status
    /// - AuthError::Timeout / AuthError::Transport for network failures
    async fn resolve(
        &self,
        auth_url: &str,
        credentials: &Credentials,
    ) -> Result<AuthToken, AuthError>;
}

// ============================================================================
// Fake Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Resolver that succeeds for every user except the ones told to fail
    #[derive(Default)]
    pub struct FakeResolver {
        failing_users: Arc<Mutex<HashSet<String>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeResolver {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reject every exchange for `username` from now on
        pub fn fail_for(&self, username: impl Into<String>) {
            self.failing_users.lock().unwrap().insert(username.into());
        }

        /// Accept `username` again
        pub fn recover(&self, username: &str) {
            self.failing_users.lock().unwrap().remove(username);
        }

        /// Usernames seen, in call order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CredentialResolver for FakeResolver {
        async fn resolve(
            &self,
            _auth_url: &str,
            credentials: &Credentials,
        ) -> Result<AuthToken, AuthError> {
            self.calls
                .lock()
                .unwrap()
                .push(credentials.username.clone());

            if self
                .failing_users
                .lock()
                .unwrap()
                .contains(&credentials.username)
            {
                return Err(AuthError::Rejected {
                    status: 401,
                    message: "The request you have made requires authentication.".into(),
                });
            }
            Ok(AuthToken::new(format!("token-{}", credentials.username)))
        }
    }
}
