//! Task repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cadence_core::{
    new_v7, Error, NewTask, RecurrenceInterval, Result, Task, TaskPriority, TaskRepository,
    TaskStatus,
};

/// Column list shared by every task query, in `parse_task_row` order.
pub(crate) const TASK_COLUMNS: &str = "id, user_id, title, description, due_date, status, priority, \
     is_recurring, recurrence_interval, created_at, updated_at";

/// PostgreSQL implementation of TaskRepository.
pub struct PgTaskRepository {
    pool: Pool<Postgres>,
}

impl PgTaskRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Convert TaskStatus to string for database.
pub(crate) fn status_to_str(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Complete => "complete",
    }
}

/// Convert string from database to TaskStatus.
pub(crate) fn str_to_status(s: &str) -> TaskStatus {
    match s {
        "in_progress" => TaskStatus::InProgress,
        "complete" => TaskStatus::Complete,
        _ => TaskStatus::Pending, // CHECK constraint keeps this unreachable
    }
}

/// Convert TaskPriority to string for database.
pub(crate) fn priority_to_str(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "low",
        TaskPriority::Medium => "medium",
        TaskPriority::High => "high",
    }
}

/// Convert string from database to TaskPriority.
pub(crate) fn str_to_priority(s: &str) -> TaskPriority {
    match s {
        "low" => TaskPriority::Low,
        "high" => TaskPriority::High,
        _ => TaskPriority::Medium,
    }
}

/// Parse a task row into a Task struct.
pub(crate) fn parse_task_row(row: sqlx::postgres::PgRow) -> Task {
    let status: String = row.get("status");
    let priority: String = row.get("priority");
    let interval: Option<String> = row.get("recurrence_interval");
    Task {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        due_date: row.get("due_date"),
        status: str_to_status(&status),
        priority: str_to_priority(&priority),
        is_recurring: row.get("is_recurring"),
        recurrence_interval: interval.map(RecurrenceInterval::from),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

async fn insert_one<'e, E>(executor: E, task: &NewTask) -> Result<Task>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let now = Utc::now();
    let row = sqlx::query(&format!(
        "INSERT INTO tasks (id, user_id, title, description, due_date, status, priority,
                            is_recurring, recurrence_interval, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(new_v7())
    .bind(task.user_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(status_to_str(task.status))
    .bind(priority_to_str(task.priority))
    .bind(task.is_recurring)
    .bind(task.recurrence_interval.as_ref().map(|i| i.as_str()))
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(Error::Database)?;

    Ok(parse_task_row(row))
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        task.validate()?;
        insert_one(&self.pool, &task).await
    }

    async fn insert_batch(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>> {
        for task in &tasks {
            task.validate()?;
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut created = Vec::with_capacity(tasks.len());
        for task in &tasks {
            // Dropping `tx` on error rolls the whole batch back.
            created.push(insert_one(&mut *tx, task).await?);
        }
        tx.commit().await.map_err(Error::Database)?;

        Ok(created)
    }

    async fn fetch_owned(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(parse_task_row))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_task_row).collect())
    }

    async fn list_recurring_for_user(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 AND is_recurring ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_task_row).collect())
    }

    async fn list_recurring(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE is_recurring ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_task_row).collect())
    }

    async fn list_due_pending(&self, before: DateTime<Utc>) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE due_date <= $1 AND status = 'pending'
             ORDER BY id"
        ))
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_task_row).collect())
    }

    async fn update(&self, task_id: Uuid, task: NewTask) -> Result<Option<Task>> {
        task.validate()?;
        let row = sqlx::query(&format!(
            "UPDATE tasks
             SET title = $3, description = $4, due_date = $5, status = $6, priority = $7,
                 is_recurring = $8, recurrence_interval = $9, updated_at = $10
             WHERE id = $1 AND user_id = $2
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task_id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(status_to_str(task.status))
        .bind(priority_to_str(task.priority))
        .bind(task.is_recurring)
        .bind(task.recurrence_interval.as_ref().map(|i| i.as_str()))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(parse_task_row))
    }

    async fn set_recurrence(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        interval: RecurrenceInterval,
    ) -> Result<Option<Task>> {
        let row = sqlx::query(&format!(
            "UPDATE tasks
             SET recurrence_interval = $3, updated_at = $4
             WHERE id = $1 AND user_id = $2 AND is_recurring
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(interval.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(parse_task_row))
    }

    async fn delete(&self, user_id: Uuid, task_id: Uuid) -> Result<bool> {
        // Edges and notifications go with the row via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
