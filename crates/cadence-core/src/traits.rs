//! Core traits for cadence abstractions.
//!
//! These traits define the interfaces that the PostgreSQL store, the
//! in-memory store, the cache backends and the credential service satisfy,
//! keeping the job and API layers independent of any concrete backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// RECORD STORE TRAITS
// =============================================================================

/// Repository for task records.
///
/// Every method taking a `user_id` is owner-scoped: a task owned by someone
/// else behaves exactly like a missing one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert one task.
    async fn insert(&self, task: NewTask) -> Result<Task>;

    /// Insert every task in one transaction. Any failure aborts the batch
    /// and nothing is written.
    async fn insert_batch(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>>;

    /// Fetch a task owned by `user_id`.
    async fn fetch_owned(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>>;

    /// List all tasks owned by `user_id`, in creation order.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Task>>;

    /// List the recurring tasks owned by `user_id`.
    async fn list_recurring_for_user(&self, user_id: Uuid) -> Result<Vec<Task>>;

    /// List recurring tasks across all users.
    async fn list_recurring(&self) -> Result<Vec<Task>>;

    /// List pending tasks across all users due at or before `before`.
    async fn list_due_pending(&self, before: DateTime<Utc>) -> Result<Vec<Task>>;

    /// Replace the mutable fields of a task owned by `task.user_id`.
    /// Returns `None` if no such task exists.
    async fn update(&self, task_id: Uuid, task: NewTask) -> Result<Option<Task>>;

    /// Change the interval of a recurring task owned by `user_id`.
    /// Returns `None` if the task is missing or not recurring.
    async fn set_recurrence(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        interval: RecurrenceInterval,
    ) -> Result<Option<Task>>;

    /// Delete a task owned by `user_id` together with its dependency edges
    /// and notifications. Returns whether a task was deleted.
    async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<bool>;
}

/// Repository for task dependency edges.
///
/// Ownership checks happen in the caller; edges themselves carry no owner.
#[async_trait]
pub trait DependencyRepository: Send + Sync {
    /// Check whether the edge `task_id -> dependent_task_id` exists.
    async fn exists(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<bool>;

    /// Insert an edge. Fails with `Conflict` if it already exists.
    async fn insert(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<TaskDependency>;

    /// Remove an edge. Returns whether one was removed.
    async fn remove(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<bool>;

    /// Tasks one outgoing hop from `task_id`.
    async fn list_dependencies(&self, task_id: Uuid) -> Result<Vec<Task>>;

    /// Ids of tasks with an edge pointing at `task_id`.
    async fn list_dependents(&self, task_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Repository for notification records.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a notification for `user_id` about `task_id`.
    async fn record(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification>;

    /// Unread notifications, newest first.
    async fn list_unread(&self, user_id: Uuid, limit: i64, offset: i64)
        -> Result<Vec<Notification>>;

    /// All notifications about one task, oldest first.
    async fn list_for_task(&self, task_id: Uuid) -> Result<Vec<Notification>>;

    /// Mark one notification read. Returns `None` if it is missing or not owned.
    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid)
        -> Result<Option<Notification>>;

    /// Mark every unread notification read, returning the ones flipped.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<Vec<Notification>>;
}

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. Fails with `Conflict` on duplicate username or email.
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn get(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_api_key_hash(&self, key_hash: &str) -> Result<Option<User>>;

    /// Replace (or clear) the stored API key digest.
    async fn set_api_key_hash(&self, user_id: Uuid, key_hash: Option<&str>) -> Result<()>;

    /// Delete a user and everything they own. Returns whether a user was deleted.
    async fn delete(&self, user_id: Uuid) -> Result<bool>;
}

/// Repository for job queue operations.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Queue a new job.
    async fn queue(
        &self,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Uuid>;

    /// Claim the next pending job whose type is in `job_types`.
    /// An empty slice means "claim any type".
    async fn claim_next_for_types(&self, job_types: &[JobType]) -> Result<Option<Job>>;

    /// Mark job as completed.
    async fn complete(&self, job_id: Uuid, result: Option<JsonValue>) -> Result<()>;

    /// Mark job as failed. Jobs under their retry budget go back to pending.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Get job by ID.
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// Get pending jobs count.
    async fn pending_count(&self) -> Result<i64>;

    /// List recent jobs.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Job>>;
}

// =============================================================================
// COLLABORATOR TRAITS
// =============================================================================

/// Key-value cache with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value, `None` on miss.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value that expires after `ttl_secs`.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete several keys.
    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }
}

/// Delivery channel for reminders.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification>;
}

/// Resolves a bearer credential to a principal.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Fails with `Unauthorized` for anything that is not a live credential.
    async fn authenticate(&self, bearer: &str) -> Result<AuthPrincipal>;
}
