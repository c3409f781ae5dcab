//! Cache key templates.

use std::fmt;

use uuid::Uuid;

/// A cache key for one cached projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `task-list:<user>`: every task the user owns.
    TaskList { user_id: Uuid },
    /// `task:<user>:<task>`: one task's detail view.
    Task { user_id: Uuid, task_id: Uuid },
    /// `recurring-list:<user>`: the user's recurring tasks.
    RecurringList { user_id: Uuid },
    /// `recurring:<user>:<task>`: one recurring task's recurrence view.
    Recurring { user_id: Uuid, task_id: Uuid },
    /// `dependencies:<user>:<task>`: the single-hop dependency list of a task.
    Dependencies { user_id: Uuid, task_id: Uuid },
}

impl CacheKey {
    pub fn task_list(user_id: Uuid) -> Self {
        CacheKey::TaskList { user_id }
    }

    pub fn task(user_id: Uuid, task_id: Uuid) -> Self {
        CacheKey::Task { user_id, task_id }
    }

    pub fn recurring_list(user_id: Uuid) -> Self {
        CacheKey::RecurringList { user_id }
    }

    pub fn recurring(user_id: Uuid, task_id: Uuid) -> Self {
        CacheKey::Recurring { user_id, task_id }
    }

    pub fn dependencies(user_id: Uuid, task_id: Uuid) -> Self {
        CacheKey::Dependencies { user_id, task_id }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::TaskList { user_id } => write!(f, "task-list:{}", user_id),
            CacheKey::Task { user_id, task_id } => write!(f, "task:{}:{}", user_id, task_id),
            CacheKey::RecurringList { user_id } => write!(f, "recurring-list:{}", user_id),
            CacheKey::Recurring { user_id, task_id } => {
                write!(f, "recurring:{}:{}", user_id, task_id)
            }
            CacheKey::Dependencies { user_id, task_id } => {
                write!(f, "dependencies:{}:{}", user_id, task_id)
            }
        }
    }
}
