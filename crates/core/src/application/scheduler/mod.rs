//! Scheduler - Fires every registered job on its own fixed interval
//!
//! - One background task per job; jobs never wait on each other
//! - A firing runs in its own task, so an error or a panic stays inside it
//! - Firings of one job are sequential: a tick that comes due while the
//!   previous firing is still running is skipped
//! - Shutdown stops the timers, then gives in-flight firings a grace period

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::error::{AppError, Result};
use async_trait::async_trait;
use constants::DEFAULT_SHUTDOWN_GRACE_PERIOD;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// A unit of recurring work
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    /// Unique name, used for logging and duplicate detection
    fn name(&self) -> &str;

    /// One firing. Errors are logged by the scheduler and never stop the job.
    async fn fire(&self) -> Result<()>;
}

/// Registered job as reported by [`Scheduler::jobs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub name: String,
    pub interval: Duration,
}

struct Registration {
    job: Arc<dyn ScheduledJob>,
    interval: Duration,
}

enum State {
    Idle,
    Running(JoinSet<()>),
    Stopped,
}

/// Fixed-interval scheduler for a set of independent jobs
pub struct Scheduler {
    registrations: Vec<Registration>,
    state: Mutex<State>,
    shutdown_tx: ShutdownSender,
    grace_period: Duration,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = shutdown_channel();
        Self {
            registrations: Vec::new(),
            state: Mutex::new(State::Idle),
            shutdown_tx,
            grace_period: DEFAULT_SHUTDOWN_GRACE_PERIOD,
        }
    }

    /// How long [`Scheduler::shutdown`] waits for in-flight firings
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Add a job. It fires first after `interval`, then every `interval`.
    ///
    /// # Errors
    /// - `AppError::Scheduler` for a zero interval, a duplicate name, or a
    ///   scheduler that has already been started
    pub fn register(&mut self, job: Arc<dyn ScheduledJob>, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(AppError::Scheduler(format!(
                "job {} has a zero interval",
                job.name()
            )));
        }
        if !matches!(
            self.state.get_mut().unwrap_or_else(PoisonError::into_inner),
            State::Idle
        ) {
            return Err(AppError::Scheduler(format!(
                "cannot register {} after start",
                job.name()
            )));
        }
        if self.registrations.iter().any(|r| r.job.name() == job.name()) {
            return Err(AppError::Scheduler(format!(
                "job {} is already registered",
                job.name()
            )));
        }

        debug!(job = %job.name(), interval_secs = interval.as_secs_f64(), "Job registered");
        self.registrations.push(Registration { job, interval });
        Ok(())
    }

    /// Registered jobs, in registration order
    pub fn jobs(&self) -> Vec<JobInfo> {
        self.registrations
            .iter()
            .map(|r| JobInfo {
                name: r.job.name().to_string(),
                interval: r.interval,
            })
            .collect()
    }

    /// Start firing every registered job in the background. Returns at once.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - `AppError::Scheduler` if already started or shut down
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            State::Idle => {}
            State::Running(_) => {
                return Err(AppError::Scheduler("scheduler already started".into()));
            }
            State::Stopped => {
                return Err(AppError::Scheduler("scheduler has been shut down".into()));
            }
        }

        let mut loops = JoinSet::new();
        for registration in &self.registrations {
            loops.spawn(run_job(
                Arc::clone(&registration.job),
                registration.interval,
                self.shutdown_tx.token(),
            ));
        }

        info!(jobs = self.registrations.len(), "Scheduler started");
        *state = State::Running(loops);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            State::Running(_)
        )
    }

    /// Stop all timers and wait up to the grace period for in-flight firings
    ///
    /// No firing starts after this returns. Firings still running when the
    /// grace period ends are aborted. Idempotent.
    pub async fn shutdown(&self) {
        let previous = std::mem::replace(
            &mut *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            State::Stopped,
        );
        self.shutdown_tx.shutdown();

        let mut loops = match previous {
            State::Running(loops) => loops,
            State::Idle | State::Stopped => return,
        };

        info!(grace_secs = self.grace_period.as_secs_f64(), "Scheduler shutting down");

        let drained = tokio::time::timeout(self.grace_period, async {
            while loops.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                abandoned = loops.len(),
                "Grace period elapsed, abandoning in-flight firings"
            );
            loops.abort_all();
            while loops.join_next().await.is_some() {}
        }

        info!("Scheduler stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer loop for one job
async fn run_job(job: Arc<dyn ScheduledJob>, period: Duration, mut shutdown: ShutdownToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seq: u64 = 0;
    let mut last_finished: Option<Instant> = None;

    loop {
        let due = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            due = ticker.tick() => due,
        };
        if shutdown.is_shutdown() {
            break;
        }
        if last_finished.is_some_and(|finished| due < finished) {
            debug!(job = %job.name(), "Tick came due during the previous firing, skipped");
            continue;
        }

        seq += 1;
        let span = info_span!("firing", job = %job.name(), seq);
        fire_isolated(Arc::clone(&job)).instrument(span).await;
        last_finished = Some(Instant::now());
    }

    debug!(job = %job.name(), firings = seq, "Job loop stopped");
}

/// Run one firing in its own task and log the outcome
///
/// The firing task lives in a JoinSet owned by this future: if the job
/// loop is aborted, the firing is aborted with it.
async fn fire_isolated(job: Arc<dyn ScheduledJob>) {
    let mut firing = JoinSet::new();
    let body = Arc::clone(&job);
    firing.spawn(async move { body.fire().await }.in_current_span());

    match firing.join_next().await {
        Some(Ok(Ok(()))) => debug!("Firing completed"),
        Some(Ok(Err(e))) => error!(error = %e, kind = e.kind(), "Firing failed"),
        Some(Err(join_err)) if join_err.is_panic() => {
            error!(error = %join_err, "Firing panicked")
        }
        Some(Err(join_err)) => warn!(error = %join_err, "Firing cancelled"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Outcome {
        Succeed,
        Fail,
        Panic,
    }

    struct TestJob {
        name: String,
        work: Duration,
        outcome: Outcome,
        started: AtomicUsize,
        completed: AtomicUsize,
        running: AtomicUsize,
        max_running: AtomicUsize,
    }

    impl TestJob {
        fn new(name: &str, work: Duration, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                work,
                outcome,
                started: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                running: AtomicUsize::new(0),
                max_running: AtomicUsize::new(0),
            })
        }

        fn started(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }

        fn completed(&self) -> usize {
            self.completed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScheduledJob for TestJob {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fire(&self) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);

            if !self.work.is_zero() {
                tokio::time::sleep(self.work).await;
            }

            self.running.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Succeed => Ok(()),
                Outcome::Fail => Err(AppError::Internal("boom".into())),
                Outcome::Panic => panic!("job {} panicked", self.name),
            }
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_register_rejects_zero_interval() {
        let mut scheduler = Scheduler::new();
        let job = TestJob::new("west", Duration::ZERO, Outcome::Succeed);
        assert!(scheduler.register(job, Duration::ZERO).is_err());
        assert!(scheduler.jobs().is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let mut scheduler = Scheduler::new();
        scheduler
            .register(TestJob::new("west", Duration::ZERO, Outcome::Succeed), secs(30))
            .unwrap();
        let err = scheduler
            .register(TestJob::new("west", Duration::ZERO, Outcome::Succeed), secs(10))
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(
            scheduler.jobs(),
            vec![JobInfo {
                name: "west".into(),
                interval: secs(30)
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_firing_after_one_interval() {
        let job = TestJob::new("west", Duration::ZERO, Outcome::Succeed);
        let mut scheduler = Scheduler::new();
        scheduler.register(job.clone(), secs(30)).unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(secs(29)).await;
        assert_eq!(job.started(), 0);

        tokio::time::sleep(secs(2)).await;
        assert_eq!(job.started(), 1);

        tokio::time::sleep(secs(60)).await;
        assert_eq!(job.started(), 3);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_stays_scheduled() {
        let job = TestJob::new("west", Duration::ZERO, Outcome::Fail);
        let mut scheduler = Scheduler::new();
        scheduler.register(job.clone(), secs(10)).unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(secs(35)).await;
        assert_eq!(job.started(), 3);
        assert!(scheduler.is_running());

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_job_stays_scheduled_and_others_unaffected() {
        let bad = TestJob::new("bad", Duration::ZERO, Outcome::Panic);
        let good = TestJob::new("good", Duration::ZERO, Outcome::Succeed);
        let mut scheduler = Scheduler::new();
        scheduler.register(bad.clone(), secs(10)).unwrap();
        scheduler.register(good.clone(), secs(10)).unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(secs(35)).await;
        assert_eq!(bad.started(), 3);
        assert_eq!(good.started(), 3);
        assert_eq!(good.completed(), 3);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_keep_independent_intervals() {
        let fast = TestJob::new("fast", Duration::ZERO, Outcome::Succeed);
        let slow = TestJob::new("slow", Duration::ZERO, Outcome::Succeed);
        let mut scheduler = Scheduler::new();
        scheduler.register(fast.clone(), secs(5)).unwrap();
        scheduler.register(slow.clone(), secs(20)).unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(secs(41)).await;
        assert_eq!(fast.started(), 8);
        assert_eq!(slow.started(), 2);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_firing_never_overlaps_itself() {
        // Each firing outlasts two intervals
        let job = TestJob::new("west", secs(25), Outcome::Succeed);
        let mut scheduler = Scheduler::new();
        scheduler.register(job.clone(), secs(10)).unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(secs(120)).await;
        assert_eq!(job.max_running.load(Ordering::SeqCst), 1);
        assert!(job.started() >= 3);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_due_during_firing_is_skipped() {
        let job = TestJob::new("west", secs(25), Outcome::Succeed);
        let mut scheduler = Scheduler::new();
        scheduler.register(job.clone(), secs(10)).unwrap();
        scheduler.start().unwrap();

        // Firings start at 10, 40, 70, 100: the ticks in between are dropped
        // and the phase stays on multiples of the interval
        tokio::time::sleep(secs(99)).await;
        assert_eq!(job.started(), 3);
        tokio::time::sleep(secs(2)).await;
        assert_eq!(job.started(), 4);
        tokio::time::sleep(secs(10)).await;
        assert_eq!(job.started(), 4);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_lets_in_flight_firing_finish() {
        let job = TestJob::new("west", secs(2), Outcome::Succeed);
        let mut scheduler = Scheduler::new().with_grace_period(secs(5));
        scheduler.register(job.clone(), secs(10)).unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(job.started(), 1);
        assert_eq!(job.completed(), 0);

        scheduler.shutdown().await;
        assert_eq!(job.completed(), 1);
        assert!(!scheduler.is_running());

        tokio::time::sleep(secs(60)).await;
        assert_eq!(job.started(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_firing_after_grace_period() {
        let job = TestJob::new("west", secs(60), Outcome::Succeed);
        let mut scheduler = Scheduler::new().with_grace_period(secs(5));
        scheduler.register(job.clone(), secs(10)).unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(secs(11)).await;
        let before = Instant::now();
        scheduler.shutdown().await;
        assert!(before.elapsed() <= secs(6));

        tokio::time::sleep(secs(120)).await;
        assert_eq!(job.started(), 1);
        assert_eq!(job.completed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let job = TestJob::new("west", Duration::ZERO, Outcome::Succeed);
        let mut scheduler = Scheduler::new();
        scheduler.register(job.clone(), secs(10)).unwrap();
        scheduler.start().unwrap();

        scheduler.shutdown().await;
        scheduler.shutdown().await;

        tokio::time::sleep(secs(60)).await;
        assert_eq!(job.started(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut scheduler = Scheduler::new();
        scheduler
            .register(TestJob::new("west", Duration::ZERO, Outcome::Succeed), secs(30))
            .unwrap();
        scheduler.start().unwrap();
        assert!(scheduler.start().is_err());

        scheduler.shutdown().await;
        assert!(scheduler.start().is_err());
    }
}
