//! JSON projection of a task, as cached and as returned to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::{RecurrenceInterval, Task, TaskPriority, TaskStatus};

/// A task plus its human-readable recurrence description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_recurring: bool,
    pub recurrence_interval: Option<RecurrenceInterval>,
    pub recurrence_description: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            status: task.status,
            priority: task.priority,
            is_recurring: task.is_recurring,
            recurrence_interval: task.recurrence_interval.clone(),
            recurrence_description: task.recurrence_description(),
            user_id: task.user_id,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl From<Task> for TaskSnapshot {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

impl TaskSnapshot {
    /// Project a slice of tasks, preserving order.
    pub fn from_tasks(tasks: &[Task]) -> Vec<Self> {
        tasks.iter().map(Self::from).collect()
    }

    pub fn into_task(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status: self.status,
            priority: self.priority,
            is_recurring: self.is_recurring,
            recurrence_interval: self.recurrence_interval,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
