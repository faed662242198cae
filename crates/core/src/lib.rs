// Heat Uptime Core - Domain Logic, Ports & Scheduler
// NO infrastructure dependencies: HTTP, StatsD and file parsing live in infra-* crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
