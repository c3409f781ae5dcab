//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cadence_core::{new_v7, Error, Notification, NotificationRepository, Result};

const NOTIFICATION_COLUMNS: &str = "id, message, task_id, user_id, is_read, created_at, sent_at";

/// PostgreSQL implementation of NotificationRepository.
pub struct PgNotificationRepository {
    pool: Pool<Postgres>,
}

impl PgNotificationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Notification {
        Notification {
            id: row.get("id"),
            message: row.get("message"),
            task_id: row.get("task_id"),
            user_id: row.get("user_id"),
            is_read: row.get("is_read"),
            created_at: row.get("created_at"),
            sent_at: row.get("sent_at"),
        }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn record(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification> {
        let row = sqlx::query(&format!(
            "INSERT INTO notifications (id, message, task_id, user_id, is_read, created_at, sent_at)
             VALUES ($1, $2, $3, $4, FALSE, $5, $6)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(new_v7())
        .bind(message)
        .bind(task_id)
        .bind(user_id)
        .bind(Utc::now())
        .bind(sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn list_unread(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = $1 AND NOT is_read
             ORDER BY id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn list_for_task(&self, task_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE task_id = $1 ORDER BY id"
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!(
            "UPDATE notifications SET is_read = TRUE
             WHERE id = $1 AND user_id = $2
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "UPDATE notifications SET is_read = TRUE
             WHERE user_id = $1 AND NOT is_read
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut flipped: Vec<Notification> = rows.into_iter().map(Self::parse_row).collect();
        flipped.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(flipped)
    }
}
