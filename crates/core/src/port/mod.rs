// Port Layer - Interfaces for the external collaborators of a firing

pub mod credential_resolver;
pub mod metric_emitter;
pub mod stack_probe;

// Re-exports
pub use credential_resolver::{AuthError, AuthToken, CredentialResolver};
pub use metric_emitter::{EmitError, MetricEmitter};
pub use stack_probe::{ProbeError, ProbeResult, StackProbe};
