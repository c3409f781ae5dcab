//! Timer-driven job scheduling.
//!
//! The scheduler only enqueues jobs; the worker executes them.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, instrument};
use uuid::Uuid;

use cadence_core::{defaults, Error, JobRepository, JobType, Result};
use cadence_db::Database;

/// Configuration for the periodic scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Period between recurrence expansion jobs.
    pub recurrence_every: Duration,
    /// Period between reminder scan jobs.
    pub reminders_every: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recurrence_every: Duration::from_secs(defaults::RECURRENCE_SCHEDULE_SECS),
            reminders_every: Duration::from_secs(defaults::REMINDER_SCHEDULE_SECS),
        }
    }
}

impl SchedulerConfig {
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SCHEDULER_ENABLED` | `true` | Enable/disable periodic jobs |
    /// | `RECURRENCE_SCHEDULE_SECS` | `86400` | Recurrence expansion period |
    /// | `REMINDER_SCHEDULE_SECS` | `900` | Reminder scan period |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |name: &str, fallback: Duration| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            recurrence_every: secs("RECURRENCE_SCHEDULE_SECS", defaults.recurrence_every),
            reminders_every: secs("REMINDER_SCHEDULE_SECS", defaults.reminders_every),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_recurrence_every(mut self, period: Duration) -> Self {
        self.recurrence_every = period;
        self
    }

    pub fn with_reminders_every(mut self, period: Duration) -> Self {
        self.reminders_every = period;
        self
    }
}

/// Enqueue a job of `job_type` at its default priority.
pub async fn enqueue(jobs: &dyn JobRepository, job_type: JobType) -> Result<Uuid> {
    jobs.queue(job_type, job_type.default_priority(), None).await
}

/// Handle for stopping a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))
    }
}

/// Periodically enqueues recurrence and reminder jobs.
pub struct Scheduler {
    db: Database,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(db: Database, config: SchedulerConfig) -> Self {
        Self { db, config }
    }

    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });
        SchedulerHandle { shutdown_tx }
    }

    #[instrument(skip(self, shutdown_rx), fields(subsystem = "jobs", component = "scheduler"))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Scheduler is disabled, not starting");
            return;
        }

        info!(
            recurrence_every_secs = self.config.recurrence_every.as_secs(),
            reminders_every_secs = self.config.reminders_every.as_secs(),
            "Scheduler started"
        );

        // First ticks fire one full period after startup.
        let now = Instant::now();
        let (recurrence_every, reminders_every) =
            (self.config.recurrence_every, self.config.reminders_every);
        let mut recurrence = interval_at(now + recurrence_every, recurrence_every);
        let mut reminders = interval_at(now + reminders_every, reminders_every);
        recurrence.set_missed_tick_behavior(MissedTickBehavior::Delay);
        reminders.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let job_type = tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = recurrence.tick() => JobType::RecurrenceExpansion,
                _ = reminders.tick() => JobType::ReminderScan,
            };

            match enqueue(self.db.jobs.as_ref(), job_type).await {
                Ok(job_id) => info!(%job_id, ?job_type, "Scheduled job queued"),
                Err(e) => error!(error = %e, ?job_type, "Failed to queue scheduled job"),
            }
        }

        info!("Scheduler stopped");
    }
}
