// Scheduler constants (no magic values)
use std::time::Duration;

/// How long shutdown waits for in-flight firings before abandoning them
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);
