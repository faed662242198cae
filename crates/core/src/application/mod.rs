// Application Layer - Firing composition and the scheduler

pub mod context;
pub mod region_job;
pub mod scheduler;

// Re-exports
pub use context::MonitorContext;
pub use region_job::{build_jobs, RegionJob};
pub use scheduler::{shutdown_channel, JobInfo, ScheduledJob, Scheduler, ShutdownSender, ShutdownToken};
