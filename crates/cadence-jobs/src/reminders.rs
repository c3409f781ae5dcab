//! Reminder scan job.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use cadence_core::{
    defaults, JobType, Notification, NotificationRepository, NotificationSink, Result, Task,
    TaskRepository,
};

use crate::handler::{JobContext, JobHandler, JobResult};

/// Outcome of one reminder scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderReport {
    pub notified_task_ids: Vec<Uuid>,
    pub count: usize,
}

/// Reminder text for a task.
pub fn reminder_message(task: &Task) -> String {
    format!(
        "Reminder: Task '{}' is due at {}.",
        task.title,
        task.due_date.format(defaults::REMINDER_DUE_FORMAT)
    )
}

/// Default sink: persists the notification row.
#[derive(Clone)]
pub struct StoreNotificationSink {
    notifications: Arc<dyn NotificationRepository>,
}

impl StoreNotificationSink {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl NotificationSink for StoreNotificationSink {
    async fn deliver(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification> {
        self.notifications
            .record(user_id, task_id, message, sent_at)
            .await
    }
}

/// Finds pending tasks due soon and notifies their owners.
#[derive(Clone)]
pub struct ReminderDispatcher {
    tasks: Arc<dyn TaskRepository>,
    sink: Arc<dyn NotificationSink>,
    lookahead: Duration,
}

impl ReminderDispatcher {
    pub fn new(tasks: Arc<dyn TaskRepository>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            tasks,
            sink,
            lookahead: Duration::seconds(defaults::REMINDER_LOOKAHEAD_SECS),
        }
    }

    pub fn with_lookahead(mut self, lookahead: Duration) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Notify every pending task due at or before `now + lookahead`.
    ///
    /// Delivery failures are logged and the task is left out of the report.
    /// Repeated scans notify the same tasks again.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "reminders", op = "scan"))]
    pub async fn scan_and_notify(&self, now: DateTime<Utc>) -> Result<ReminderReport> {
        let due = self.tasks.list_due_pending(now + self.lookahead).await?;
        debug!(candidates = due.len(), "Reminder candidates selected");

        let mut notified_task_ids = Vec::with_capacity(due.len());
        for task in &due {
            let message = reminder_message(task);
            match self.sink.deliver(task.user_id, task.id, &message, now).await {
                Ok(_) => notified_task_ids.push(task.id),
                Err(e) => warn!(
                    task_id = %task.id,
                    user_id = %task.user_id,
                    error = %e,
                    "Failed to deliver reminder"
                ),
            }
        }

        Ok(ReminderReport {
            count: notified_task_ids.len(),
            notified_task_ids,
        })
    }
}

/// Job handler running [`ReminderDispatcher::scan_and_notify`] at the current time.
pub struct ReminderHandler {
    dispatcher: ReminderDispatcher,
}

impl ReminderHandler {
    pub fn new(dispatcher: ReminderDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl JobHandler for ReminderHandler {
    fn job_type(&self) -> JobType {
        JobType::ReminderScan
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "reminders", op = "execute", job_id = %ctx.job.id)
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let start = Instant::now();
        match self.dispatcher.scan_and_notify(Utc::now()).await {
            Ok(report) => {
                info!(
                    notified = report.count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Reminder scan finished"
                );
                JobResult::Success(serde_json::to_value(&report).ok())
            }
            Err(e) => JobResult::Failed(format!("Reminder scan failed: {}", e)),
        }
    }
}
