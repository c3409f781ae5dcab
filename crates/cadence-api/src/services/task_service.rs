//! Task reads and mutations.
//!
//! Reads go through the read-through [`TaskCache`]. Every mutation commits to
//! the record store first and then invalidates the keys its [`Mutation`]
//! names, so the next read repopulates from the store.

use tracing::{info, instrument};
use uuid::Uuid;

use cadence_cache::{CacheKey, Mutation, TaskCache, TaskSnapshot};
use cadence_core::{CreateTaskRequest, Error, RecurrenceInterval, Result};
use cadence_db::Database;

#[derive(Clone)]
pub struct TaskService {
    db: Database,
    cache: TaskCache,
}

fn task_not_found() -> Error {
    Error::NotFound("Task not found".to_string())
}

impl TaskService {
    pub fn new(db: Database, cache: TaskCache) -> Self {
        Self { db, cache }
    }

    /// Every task the user owns.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<TaskSnapshot>> {
        self.cache
            .read_through(&CacheKey::task_list(user_id), || async move {
                let tasks = self.db.tasks.list_for_user(user_id).await?;
                Ok(TaskSnapshot::from_tasks(&tasks))
            })
            .await
    }

    pub async fn get(&self, user_id: Uuid, task_id: Uuid) -> Result<TaskSnapshot> {
        self.cache
            .read_through(&CacheKey::task(user_id, task_id), || async move {
                self.db
                    .tasks
                    .fetch_owned(user_id, task_id)
                    .await?
                    .map(TaskSnapshot::from)
                    .ok_or_else(task_not_found)
            })
            .await
    }

    #[instrument(skip(self, request), fields(subsystem = "api", component = "tasks", op = "create"))]
    pub async fn create(&self, user_id: Uuid, request: CreateTaskRequest) -> Result<TaskSnapshot> {
        let task = self
            .db
            .tasks
            .insert(request.into_new_task(user_id)?)
            .await?;

        self.cache
            .invalidate(&Mutation::TaskCreated {
                user_id,
                is_recurring: task.is_recurring,
            })
            .await;

        info!(task_id = %task.id, "Task created");
        Ok(task.into())
    }

    /// Replace every mutable field of an owned task.
    #[instrument(skip(self, request), fields(subsystem = "api", component = "tasks", op = "update"))]
    pub async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        request: CreateTaskRequest,
    ) -> Result<TaskSnapshot> {
        let new_task = request.into_new_task(user_id)?;
        // Looked up before the write so a committed update is always invalidated.
        let dependents = self.db.dependencies.list_dependents(task_id).await?;
        let task = self
            .db
            .tasks
            .update(task_id, new_task)
            .await?
            .ok_or_else(task_not_found)?;

        self.cache
            .invalidate(&Mutation::TaskUpdated {
                user_id,
                task_id,
                dependents,
            })
            .await;

        Ok(task.into())
    }

    #[instrument(skip(self), fields(subsystem = "api", component = "tasks", op = "delete"))]
    pub async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<()> {
        // Edges go with the task, so collect the dependents first.
        let dependents = self.db.dependencies.list_dependents(task_id).await?;
        if !self.db.tasks.delete(user_id, task_id).await? {
            return Err(task_not_found());
        }

        self.cache
            .invalidate(&Mutation::TaskDeleted {
                user_id,
                task_id,
                dependents,
            })
            .await;

        info!("Task deleted");
        Ok(())
    }

    /// The user's recurring tasks. An empty list is a valid answer.
    pub async fn list_recurring(&self, user_id: Uuid) -> Result<Vec<TaskSnapshot>> {
        self.cache
            .read_through(&CacheKey::recurring_list(user_id), || async move {
                let tasks = self.db.tasks.list_recurring_for_user(user_id).await?;
                Ok(TaskSnapshot::from_tasks(&tasks))
            })
            .await
    }

    /// Recurrence view of one task. Non-recurring tasks are not found here.
    pub async fn recurrence(&self, user_id: Uuid, task_id: Uuid) -> Result<TaskSnapshot> {
        self.cache
            .read_through(&CacheKey::recurring(user_id, task_id), || async move {
                self.db
                    .tasks
                    .fetch_owned(user_id, task_id)
                    .await?
                    .filter(|t| t.is_recurring)
                    .map(TaskSnapshot::from)
                    .ok_or_else(task_not_found)
            })
            .await
    }

    #[instrument(skip(self), fields(subsystem = "api", component = "tasks", op = "set_recurrence"))]
    pub async fn set_recurrence(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        interval: &str,
    ) -> Result<TaskSnapshot> {
        let interval = RecurrenceInterval::parse_known(interval)?;
        let dependents = self.db.dependencies.list_dependents(task_id).await?;
        let task = self
            .db
            .tasks
            .set_recurrence(user_id, task_id, interval)
            .await?
            .ok_or_else(task_not_found)?;

        self.cache
            .invalidate(&Mutation::RecurrenceChanged {
                user_id,
                task_id,
                dependents,
            })
            .await;

        info!(interval = ?task.recurrence_interval, "Recurrence updated");
        Ok(task.into())
    }

    /// Delete an account together with everything it owns.
    #[instrument(skip(self), fields(subsystem = "api", component = "tasks", op = "delete_account"))]
    pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
        let task_ids: Vec<Uuid> = self
            .db
            .tasks
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        if !self.db.users.delete(user_id).await? {
            return Err(Error::NotFound("User not found".to_string()));
        }

        self.cache
            .invalidate(&Mutation::AccountDeleted { user_id, task_ids })
            .await;
        Ok(())
    }
}
