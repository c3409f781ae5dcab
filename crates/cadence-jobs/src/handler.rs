//! Job handlers for each job type.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use cadence_core::{Job, JobType};

/// Context provided to job handlers.
pub struct JobContext {
    /// The job being processed.
    pub job: Job,
}

impl JobContext {
    /// Create a new job context.
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    pub fn job_id(&self) -> Uuid {
        self.job.id
    }

    /// Get the job payload.
    pub fn payload(&self) -> Option<&JsonValue> {
        self.job.payload.as_ref()
    }

    /// Which attempt this is, starting at 1.
    pub fn attempt(&self) -> i32 {
        self.job.retry_count + 1
    }
}

/// Result of job execution.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed successfully with optional result data.
    Success(Option<JsonValue>),
    /// Job failed with an error message.
    Failed(String),
    /// Job should be retried.
    Retry(String),
}

/// Trait for job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job type this handler processes.
    fn job_type(&self) -> JobType;

    /// Execute the job.
    async fn execute(&self, ctx: JobContext) -> JobResult;

    /// Check if this handler can process the given job type.
    fn can_handle(&self, job_type: JobType) -> bool {
        self.job_type() == job_type
    }
}

#[cfg(test)]
pub(crate) fn test_job(job_type: JobType) -> Job {
    Job {
        id: Uuid::now_v7(),
        job_type,
        status: cadence_core::JobStatus::Running,
        priority: job_type.default_priority(),
        payload: None,
        result: None,
        error_message: None,
        retry_count: 0,
        max_retries: cadence_core::defaults::JOB_MAX_RETRIES,
        created_at: chrono::Utc::now(),
        started_at: Some(chrono::Utc::now()),
        completed_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl JobHandler for Echo {
        fn job_type(&self) -> JobType {
            JobType::ReminderScan
        }

        async fn execute(&self, ctx: JobContext) -> JobResult {
            JobResult::Success(ctx.payload().cloned())
        }
    }

    #[test]
    fn test_job_context_accessors() {
        let mut job = test_job(JobType::RecurrenceExpansion);
        job.retry_count = 2;
        job.payload = Some(serde_json::json!({"trigger": "manual"}));

        let ctx = JobContext::new(job.clone());
        assert_eq!(ctx.job_id(), job.id);
        assert_eq!(ctx.attempt(), 3);
        assert_eq!(ctx.payload().unwrap()["trigger"], "manual");
    }

    #[tokio::test]
    async fn test_handler_dispatch() {
        assert!(Echo.can_handle(JobType::ReminderScan));
        assert!(!Echo.can_handle(JobType::RecurrenceExpansion));

        let mut job = test_job(JobType::ReminderScan);
        job.payload = Some(serde_json::json!(1));
        match Echo.execute(JobContext::new(job)).await {
            JobResult::Success(Some(v)) => assert_eq!(v, serde_json::json!(1)),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
