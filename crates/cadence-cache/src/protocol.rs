//! Cache invalidation protocol.
//!
//! Every task-mutating path (API handlers and background jobs alike) describes
//! what it changed as a [`Mutation`]; this module is the single table mapping
//! mutations to the cache keys they make stale.

use uuid::Uuid;

use crate::keys::CacheKey;

/// A committed change to the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A task was created by its owner.
    TaskCreated { user_id: Uuid, is_recurring: bool },
    /// A task's fields were replaced. `dependents` are the tasks with an
    /// edge pointing at it, whose dependency lists embed its snapshot.
    TaskUpdated {
        user_id: Uuid,
        task_id: Uuid,
        dependents: Vec<Uuid>,
    },
    /// A task was deleted, taking its edges with it.
    TaskDeleted {
        user_id: Uuid,
        task_id: Uuid,
        dependents: Vec<Uuid>,
    },
    /// A recurring task's interval changed. `dependents` as for updates.
    RecurrenceChanged {
        user_id: Uuid,
        task_id: Uuid,
        dependents: Vec<Uuid>,
    },
    /// An edge leaving `task_id` was added or removed.
    DependencyChanged { user_id: Uuid, task_id: Uuid },
    /// The recurrence job created clones for these owners.
    RecurringClonesCreated { owners: Vec<Uuid> },
    /// An account and everything it owned was deleted.
    AccountDeleted { user_id: Uuid, task_ids: Vec<Uuid> },
}

impl Mutation {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::TaskCreated { .. } => "task_created",
            Mutation::TaskUpdated { .. } => "task_updated",
            Mutation::TaskDeleted { .. } => "task_deleted",
            Mutation::RecurrenceChanged { .. } => "recurrence_changed",
            Mutation::DependencyChanged { .. } => "dependency_changed",
            Mutation::RecurringClonesCreated { .. } => "recurring_clones_created",
            Mutation::AccountDeleted { .. } => "account_deleted",
        }
    }
}

/// Keys made stale by a mutation, without duplicates.
pub fn keys_to_invalidate(mutation: &Mutation) -> Vec<CacheKey> {
    let mut keys = Vec::new();
    match mutation {
        Mutation::TaskCreated {
            user_id,
            is_recurring,
        } => {
            keys.push(CacheKey::task_list(*user_id));
            if *is_recurring {
                keys.push(CacheKey::recurring_list(*user_id));
            }
        }
        Mutation::TaskUpdated {
            user_id,
            task_id,
            dependents,
        }
        | Mutation::TaskDeleted {
            user_id,
            task_id,
            dependents,
        } => {
            keys.push(CacheKey::task(*user_id, *task_id));
            keys.push(CacheKey::task_list(*user_id));
            // Recurrence views read the same row, and is_recurring may have flipped.
            keys.push(CacheKey::recurring(*user_id, *task_id));
            keys.push(CacheKey::recurring_list(*user_id));
            keys.push(CacheKey::dependencies(*user_id, *task_id));
            keys.extend(
                dependents
                    .iter()
                    .map(|dependent| CacheKey::dependencies(*user_id, *dependent)),
            );
        }
        Mutation::RecurrenceChanged {
            user_id,
            task_id,
            dependents,
        } => {
            keys.push(CacheKey::task(*user_id, *task_id));
            keys.push(CacheKey::recurring(*user_id, *task_id));
            keys.push(CacheKey::recurring_list(*user_id));
            keys.push(CacheKey::task_list(*user_id));
            keys.extend(
                dependents
                    .iter()
                    .map(|dependent| CacheKey::dependencies(*user_id, *dependent)),
            );
        }
        Mutation::DependencyChanged { user_id, task_id } => {
            keys.push(CacheKey::dependencies(*user_id, *task_id));
        }
        Mutation::RecurringClonesCreated { owners } => {
            keys.extend(owners.iter().map(|owner| CacheKey::task_list(*owner)));
        }
        Mutation::AccountDeleted { user_id, task_ids } => {
            keys.push(CacheKey::task_list(*user_id));
            keys.push(CacheKey::recurring_list(*user_id));
            for task_id in task_ids {
                keys.push(CacheKey::task(*user_id, *task_id));
                keys.push(CacheKey::recurring(*user_id, *task_id));
                keys.push(CacheKey::dependencies(*user_id, *task_id));
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    keys.retain(|k| seen.insert(k.clone()));
    keys
}
