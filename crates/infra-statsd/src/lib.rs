// Heat Uptime Infrastructure - StatsD Adapter
// Implements: MetricEmitter

pub mod statsd_emitter;

pub use statsd_emitter::{format_timing, StatsdEmitter};
