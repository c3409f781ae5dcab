//! In-memory record store.
//!
//! Implements every repository trait with the same observable semantics as
//! the PostgreSQL repositories: owner scoping, unique constraints, foreign
//! keys with cascading deletes, all-or-nothing batch inserts and insertion
//! order as the natural order. Used by single-process deployments without a
//! database and by the test suites of the crates above this one.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use uuid::Uuid;

use cadence_core::{
    defaults, new_v7, DependencyRepository, Error, Job, JobRepository, JobStatus, JobType,
    NewTask, NewUser, Notification, NotificationRepository, RecurrenceInterval, Result, Task,
    TaskDependency, TaskRepository, TaskStatus, User, UserRepository,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    tasks: Vec<Task>,
    edges: Vec<TaskDependency>,
    notifications: Vec<Notification>,
    jobs: Vec<Job>,
}

impl State {
    fn user_exists(&self, user_id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == user_id)
    }

    fn task_exists(&self, task_id: Uuid) -> bool {
        self.tasks.iter().any(|t| t.id == task_id)
    }

    fn owned_task_mut(&mut self, user_id: Uuid, task_id: Uuid) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.user_id == user_id)
    }

    fn build_task(&self, task: &NewTask, now: DateTime<Utc>) -> Result<Task> {
        task.validate()?;
        if !self.user_exists(task.user_id) {
            return Err(Error::Storage(format!(
                "tasks.user_id references missing user {}",
                task.user_id
            )));
        }
        Ok(Task {
            id: new_v7(),
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            status: task.status,
            priority: task.priority,
            is_recurring: task.is_recurring,
            recurrence_interval: task.recurrence_interval.clone(),
            user_id: task.user_id,
            created_at: now,
            updated_at: now,
        })
    }

    fn cascade_task(&mut self, task_id: Uuid) {
        self.edges
            .retain(|e| e.task_id != task_id && e.dependent_task_id != task_id);
        self.notifications.retain(|n| n.task_id != task_id);
    }
}

/// In-memory implementation of every repository trait.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    fail_graph_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `Error::Storage` until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make dependency-graph reads fail with `Error::Storage` until reset.
    pub fn fail_graph_reads(&self, fail: bool) {
        self.fail_graph_reads.store(fail, Ordering::SeqCst);
    }

    fn check_graph_readable(&self) -> Result<()> {
        if self.fail_graph_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage("simulated read failure".into()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("simulated write failure".into()));
        }
        Ok(())
    }
}

// =============================================================================
// TASKS
// =============================================================================

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let created = state.build_task(&task, Utc::now())?;
        state.tasks.push(created.clone());
        Ok(created)
    }

    async fn insert_batch(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let now = Utc::now();
        // Build everything first so a bad row leaves the store untouched.
        let created = tasks
            .iter()
            .map(|t| state.build_task(t, now))
            .collect::<Result<Vec<_>>>()?;
        state.tasks.extend(created.iter().cloned());
        Ok(created)
    }

    async fn fetch_owned(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .find(|t| t.id == task_id && t.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_recurring_for_user(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id && t.is_recurring)
            .cloned()
            .collect())
    }

    async fn list_recurring(&self) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state.tasks.iter().filter(|t| t.is_recurring).cloned().collect())
    }

    async fn list_due_pending(&self, before: DateTime<Utc>) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.due_date <= before && t.status == TaskStatus::Pending)
            .cloned()
            .collect())
    }

    async fn update(&self, task_id: Uuid, task: NewTask) -> Result<Option<Task>> {
        task.validate()?;
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let Some(existing) = state.owned_task_mut(task.user_id, task_id) else {
            return Ok(None);
        };
        existing.title = task.title;
        existing.description = task.description;
        existing.due_date = task.due_date;
        existing.status = task.status;
        existing.priority = task.priority;
        existing.is_recurring = task.is_recurring;
        existing.recurrence_interval = task.recurrence_interval;
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn set_recurrence(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        interval: RecurrenceInterval,
    ) -> Result<Option<Task>> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        match state.owned_task_mut(user_id, task_id) {
            Some(task) if task.is_recurring => {
                task.recurrence_interval = Some(interval);
                task.updated_at = Utc::now();
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<bool> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| !(t.id == task_id && t.user_id == user_id));
        if state.tasks.len() == before {
            return Ok(false);
        }
        state.cascade_task(task_id);
        Ok(true)
    }
}

// =============================================================================
// DEPENDENCIES
// =============================================================================

#[async_trait]
impl DependencyRepository for MemoryStore {
    async fn exists(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state
            .edges
            .iter()
            .any(|e| e.task_id == task_id && e.dependent_task_id == dependent_task_id))
    }

    async fn insert(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<TaskDependency> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        if !state.task_exists(task_id) || !state.task_exists(dependent_task_id) {
            return Err(Error::Storage(
                "task_dependencies references a missing task".into(),
            ));
        }
        if state
            .edges
            .iter()
            .any(|e| e.task_id == task_id && e.dependent_task_id == dependent_task_id)
        {
            return Err(Error::Conflict("Dependency already exists".into()));
        }
        let edge = TaskDependency {
            id: new_v7(),
            task_id,
            dependent_task_id,
            created_at: Utc::now(),
        };
        state.edges.push(edge.clone());
        Ok(edge)
    }

    async fn remove(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<bool> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let before = state.edges.len();
        state
            .edges
            .retain(|e| !(e.task_id == task_id && e.dependent_task_id == dependent_task_id));
        Ok(state.edges.len() < before)
    }

    async fn list_dependencies(&self, task_id: Uuid) -> Result<Vec<Task>> {
        self.check_graph_readable()?;
        let state = self.state.lock().await;
        Ok(state
            .edges
            .iter()
            .filter(|e| e.task_id == task_id)
            .filter_map(|e| state.tasks.iter().find(|t| t.id == e.dependent_task_id))
            .cloned()
            .collect())
    }

    async fn list_dependents(&self, task_id: Uuid) -> Result<Vec<Uuid>> {
        self.check_graph_readable()?;
        let state = self.state.lock().await;
        Ok(state
            .edges
            .iter()
            .filter(|e| e.dependent_task_id == task_id)
            .map(|e| e.task_id)
            .collect())
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn record(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        if !state.task_exists(task_id) || !state.user_exists(user_id) {
            return Err(Error::Storage(
                "notifications references a missing task or user".into(),
            ));
        }
        let notification = Notification {
            id: new_v7(),
            message: message.to_string(),
            task_id,
            user_id,
            is_read: false,
            created_at: Utc::now(),
            sent_at: Some(sent_at),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_unread(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_for_task(&self, task_id: Uuid) -> Result<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Option<Notification>> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        Ok(state
            .notifications
            .iter_mut()
            .rev()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .map(|n| {
                n.is_read = true;
                n.clone()
            })
            .collect())
    }
}

// =============================================================================
// USERS
// =============================================================================

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(Error::Conflict(
                "Username or email already registered".into(),
            ));
        }
        let now = Utc::now();
        let created = User {
            id: new_v7(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            api_key_hash: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_api_key_hash(&self, key_hash: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.api_key_hash.as_deref() == Some(key_hash))
            .cloned())
    }

    async fn set_api_key_hash(&self, user_id: Uuid, key_hash: Option<&str>) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| Error::NotFound("User not found".into()))?;
        user.api_key_hash = key_hash.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        if state.users.len() == before {
            return Ok(false);
        }
        let owned: Vec<Uuid> = state
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.id)
            .collect();
        state.tasks.retain(|t| t.user_id != user_id);
        for task_id in owned {
            state.cascade_task(task_id);
        }
        state.notifications.retain(|n| n.user_id != user_id);
        Ok(true)
    }
}

// =============================================================================
// JOBS
// =============================================================================

#[async_trait]
impl JobRepository for MemoryStore {
    async fn queue(
        &self,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Uuid> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let job = Job {
            id: new_v7(),
            job_type,
            status: JobStatus::Pending,
            priority,
            payload,
            result: None,
            error_message: None,
            retry_count: 0,
            max_retries: defaults::JOB_MAX_RETRIES,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        let id = job.id;
        state.jobs.push(job);
        Ok(id)
    }

    async fn claim_next_for_types(&self, job_types: &[JobType]) -> Result<Option<Job>> {
        let mut state = self.state.lock().await;
        // Highest priority first, then oldest (insertion order breaks ties).
        let mut best: Option<usize> = None;
        for (idx, job) in state.jobs.iter().enumerate() {
            if job.status != JobStatus::Pending
                || !(job_types.is_empty() || job_types.contains(&job.job_type))
            {
                continue;
            }
            match best {
                Some(b) if state.jobs[b].priority >= job.priority => {}
                _ => best = Some(idx),
            }
        }
        Ok(best.map(|idx| {
            let job = &mut state.jobs[idx];
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
            job.clone()
        }))
    }

    async fn complete(&self, job_id: Uuid, result: Option<JsonValue>) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| Error::NotFound(format!("Job {}", job_id)))?;
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        job.result = result;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| Error::NotFound(format!("Job {}", job_id)))?;
        job.error_message = Some(error.to_string());
        if job.retry_count < job.max_retries {
            job.retry_count += 1;
            job.status = JobStatus::Pending;
            job.started_at = None;
        } else {
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<Job>> {
        let state = self.state.lock().await;
        Ok(state.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn pending_count(&self) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Pending)
            .count() as i64)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Job>> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::TaskPriority;
    use chrono::Duration;

    async fn user(store: &MemoryStore, name: &str) -> User {
        UserRepository::create(
            store,
            NewUser {
                username: name.into(),
                email: format!("{}@example.com", name),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap()
    }

    fn new_task(user_id: Uuid, title: &str) -> NewTask {
        NewTask {
            user_id,
            title: title.into(),
            description: None,
            due_date: Utc::now() + Duration::hours(2),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            is_recurring: false,
            recurrence_interval: None,
        }
    }

    #[tokio::test]
    async fn test_insert_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let owner = user(&store, "ada").await;

        let batch = vec![
            new_task(owner.id, "first"),
            new_task(Uuid::now_v7(), "orphan"),
        ];
        assert!(store.insert_batch(batch).await.is_err());
        assert!(store.list_for_user(owner.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_is_owner_scoped() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let bob = user(&store, "bob").await;
        let task = TaskRepository::insert(&store, new_task(ada.id, "mine"))
            .await
            .unwrap();

        assert!(store.fetch_owned(ada.id, task.id).await.unwrap().is_some());
        assert!(store.fetch_owned(bob.id, task.id).await.unwrap().is_none());
        assert!(!TaskRepository::delete(&store, bob.id, task.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_task_cascades() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let a = TaskRepository::insert(&store, new_task(ada.id, "a")).await.unwrap();
        let b = TaskRepository::insert(&store, new_task(ada.id, "b")).await.unwrap();
        DependencyRepository::insert(&store, a.id, b.id).await.unwrap();
        store.record(ada.id, b.id, "hi", Utc::now()).await.unwrap();

        assert!(TaskRepository::delete(&store, ada.id, b.id).await.unwrap());
        assert!(store.list_dependencies(a.id).await.unwrap().is_empty());
        assert!(store.list_for_task(b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_user_conflicts() {
        let store = MemoryStore::new();
        user(&store, "ada").await;
        let err = UserRepository::create(
            &store,
            NewUser {
                username: "ada".into(),
                email: "other@example.com".into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_fail_writes_rejects_writes_only() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        store.fail_writes(true);
        assert!(matches!(
            TaskRepository::insert(&store, new_task(ada.id, "x")).await,
            Err(Error::Storage(_))
        ));
        assert!(store.list_for_user(ada.id).await.is_ok());
        store.fail_writes(false);
        assert!(TaskRepository::insert(&store, new_task(ada.id, "x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_graph_reads_only_affects_edges() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let task = TaskRepository::insert(&store, new_task(ada.id, "x"))
            .await
            .unwrap();
        store.fail_graph_reads(true);
        assert!(matches!(
            store.list_dependents(task.id).await,
            Err(Error::Storage(_))
        ));
        assert!(store.list_dependencies(task.id).await.is_err());
        assert!(store.list_for_user(ada.id).await.is_ok());
        store.fail_graph_reads(false);
        assert!(store.list_dependents(task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_recurrence_requires_recurring_task() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let plain = TaskRepository::insert(&store, new_task(ada.id, "plain"))
            .await
            .unwrap();
        let updated = store
            .set_recurrence(ada.id, plain.id, RecurrenceInterval::Weekly)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_job_retry_then_fail() {
        let store = MemoryStore::new();
        let id = store
            .queue(JobType::ReminderScan, 5, None)
            .await
            .unwrap();

        for _ in 0..defaults::JOB_MAX_RETRIES {
            let job = store.claim_next_for_types(&[]).await.unwrap().unwrap();
            store.fail(job.id, "boom").await.unwrap();
            assert_eq!(JobRepository::get(&store, id).await.unwrap().unwrap().status, JobStatus::Pending);
        }

        store.claim_next_for_types(&[]).await.unwrap().unwrap();
        store.fail(id, "boom").await.unwrap();
        assert_eq!(JobRepository::get(&store, id).await.unwrap().unwrap().status, JobStatus::Failed);
        assert!(store.claim_next_for_types(&[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_prefers_priority_then_age() {
        let store = MemoryStore::new();
        let low = store.queue(JobType::RecurrenceExpansion, 1, None).await.unwrap();
        let high_old = store.queue(JobType::ReminderScan, 9, None).await.unwrap();
        let high_new = store.queue(JobType::ReminderScan, 9, None).await.unwrap();

        let order: Vec<Uuid> = vec![
            store.claim_next_for_types(&[]).await.unwrap().unwrap().id,
            store.claim_next_for_types(&[]).await.unwrap().unwrap().id,
            store.claim_next_for_types(&[]).await.unwrap().unwrap().id,
        ];
        assert_eq!(order, vec![high_old, high_new, low]);
    }

    #[tokio::test]
    async fn test_claim_filters_by_type() {
        let store = MemoryStore::new();
        store.queue(JobType::ReminderScan, 9, None).await.unwrap();
        assert!(store
            .claim_next_for_types(&[JobType::RecurrenceExpansion])
            .await
            .unwrap()
            .is_none());
    }
}
