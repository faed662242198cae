// Heat Uptime Infrastructure - Configuration Loader
// Turns the INI file into a validated MonitorConfig, or fails before anything runs

pub mod error;
pub mod loader;

pub use error::ConfigError;
pub use loader::{load, parse_str, DEFAULT_CONFIG_PATH};
