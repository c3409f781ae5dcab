//! Dependency edge repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cadence_core::{new_v7, DependencyRepository, Error, Result, Task, TaskDependency};

use crate::tasks::parse_task_row;

/// PostgreSQL implementation of DependencyRepository.
pub struct PgDependencyRepository {
    pool: Pool<Postgres>,
}

impl PgDependencyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyRepository for PgDependencyRepository {
    async fn exists(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM task_dependencies WHERE task_id = $1 AND dependent_task_id = $2
             )",
        )
        .bind(task_id)
        .bind(dependent_task_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(exists)
    }

    async fn insert(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<TaskDependency> {
        let row = sqlx::query(
            "INSERT INTO task_dependencies (id, task_id, dependent_task_id, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, task_id, dependent_task_id, created_at",
        )
        .bind(new_v7())
        .bind(task_id)
        .bind(dependent_task_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| crate::conflict_on_unique(e, "Dependency already exists"))?;

        Ok(TaskDependency {
            id: row.get("id"),
            task_id: row.get("task_id"),
            dependent_task_id: row.get("dependent_task_id"),
            created_at: row.get("created_at"),
        })
    }

    async fn remove(&self, task_id: Uuid, dependent_task_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM task_dependencies WHERE task_id = $1 AND dependent_task_id = $2",
        )
        .bind(task_id)
        .bind(dependent_task_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_dependencies(&self, task_id: Uuid) -> Result<Vec<Task>> {
        // Single hop only: no transitive closure.
        let rows = sqlx::query(
            "SELECT t.id, t.user_id, t.title, t.description, t.due_date, t.status, t.priority,
                    t.is_recurring, t.recurrence_interval, t.created_at, t.updated_at
             FROM task_dependencies d
             JOIN tasks t ON t.id = d.dependent_task_id
             WHERE d.task_id = $1
             ORDER BY d.id",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_task_row).collect())
    }

    async fn list_dependents(&self, task_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT task_id FROM task_dependencies WHERE dependent_task_id = $1 ORDER BY id",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(ids)
    }
}
