// Configuration Error Types

use std::path::PathBuf;
use thiserror::Error;
use uptime_core::domain::DomainError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] ini::ParseError),

    #[error("missing required key `{key}` in section [{section}]")]
    MissingKey { section: String, key: String },

    #[error("invalid value for `{key}` in section [{section}]: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Domain(#[from] DomainError),
}
