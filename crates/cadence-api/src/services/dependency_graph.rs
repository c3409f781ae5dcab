//! Dependency graph accessor.
//!
//! Edges are directed: `task_id` depends on `dependent_task_id`. Both ends
//! must belong to the caller. Lists are single-hop; cycles and self-loops
//! are not rejected.

use tracing::{info, instrument};
use uuid::Uuid;

use cadence_cache::{CacheKey, Mutation, TaskCache, TaskSnapshot};
use cadence_core::{Error, Result, Task};
use cadence_db::Database;

#[derive(Clone)]
pub struct DependencyGraph {
    db: Database,
    cache: TaskCache,
}

impl DependencyGraph {
    pub fn new(db: Database, cache: TaskCache) -> Self {
        Self { db, cache }
    }

    async fn owned(&self, user_id: Uuid, task_id: Uuid) -> Result<Option<Task>> {
        self.db.tasks.fetch_owned(user_id, task_id).await
    }

    /// Add the edge and return the owning task.
    #[instrument(skip(self), fields(subsystem = "api", component = "dependencies", op = "add_edge"))]
    pub async fn add_edge(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        dependent_task_id: Uuid,
    ) -> Result<TaskSnapshot> {
        let task = self.owned(user_id, task_id).await?;
        let dependent = self.owned(user_id, dependent_task_id).await?;
        let (Some(task), Some(_)) = (task, dependent) else {
            return Err(Error::NotFound("Task(s) not found".to_string()));
        };
        if self.db.dependencies.exists(task_id, dependent_task_id).await? {
            return Err(Error::Conflict("Dependency already exists".to_string()));
        }

        self.db
            .dependencies
            .insert(task_id, dependent_task_id)
            .await?;

        self.cache
            .invalidate(&Mutation::DependencyChanged { user_id, task_id })
            .await;

        info!("Dependency added");
        Ok(task.into())
    }

    /// Remove the edge and return the owning task.
    #[instrument(skip(self), fields(subsystem = "api", component = "dependencies", op = "remove_edge"))]
    pub async fn remove_edge(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        dependent_task_id: Uuid,
    ) -> Result<TaskSnapshot> {
        let task = self
            .owned(user_id, task_id)
            .await?
            .ok_or_else(|| Error::NotFound("Task not found".to_string()))?;

        if !self
            .db
            .dependencies
            .remove(task_id, dependent_task_id)
            .await?
        {
            return Err(Error::NotFound("Dependency not found".to_string()));
        }

        self.cache
            .invalidate(&Mutation::DependencyChanged { user_id, task_id })
            .await;

        info!("Dependency removed");
        Ok(task.into())
    }

    /// Tasks one outgoing hop from `task_id`.
    pub async fn list_dependencies(
        &self,
        user_id: Uuid,
        task_id: Uuid,
    ) -> Result<Vec<TaskSnapshot>> {
        self.cache
            .read_through(&CacheKey::dependencies(user_id, task_id), || async move {
                if self.owned(user_id, task_id).await?.is_none() {
                    return Err(Error::NotFound("Task not found".to_string()));
                }
                let tasks = self.db.dependencies.list_dependencies(task_id).await?;
                Ok(TaskSnapshot::from_tasks(&tasks))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_cache::MemoryCache;
    use cadence_core::{NewTask, NewUser, TaskPriority, TaskStatus};
    use chrono::Utc;
    use std::sync::Arc;

    struct Fixture {
        graph: DependencyGraph,
        db: Database,
        user: Uuid,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory();
        let user = db
            .users
            .create(NewUser {
                username: "tomas".into(),
                email: "tomas@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap()
            .id;
        let cache = TaskCache::new(Arc::new(MemoryCache::new(64)));
        Fixture {
            graph: DependencyGraph::new(db.clone(), cache),
            db,
            user,
        }
    }

    async fn task(fx: &Fixture, owner: Uuid, title: &str) -> Uuid {
        fx.db
            .tasks
            .insert(NewTask {
                user_id: owner,
                title: title.into(),
                description: None,
                due_date: Utc::now(),
                status: TaskStatus::Pending,
                priority: TaskPriority::Low,
                is_recurring: false,
                recurrence_interval: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_duplicate_edge_conflicts_and_list_is_single() {
        let fx = fixture().await;
        let a = task(&fx, fx.user, "a").await;
        let b = task(&fx, fx.user, "b").await;

        let owner = fx.graph.add_edge(fx.user, a, b).await.unwrap();
        assert_eq!(owner.id, a);
        assert!(matches!(
            fx.graph.add_edge(fx.user, a, b).await,
            Err(Error::Conflict(ref msg)) if msg == "Dependency already exists"
        ));
        assert!(fx.db.dependencies.exists(a, b).await.unwrap());
        assert!(!fx.db.dependencies.exists(b, a).await.unwrap());

        let deps = fx.graph.list_dependencies(fx.user, a).await.unwrap();
        assert_eq!(deps.iter().map(|t| t.id).collect::<Vec<_>>(), vec![b]);
    }

    #[tokio::test]
    async fn test_list_is_single_hop() {
        let fx = fixture().await;
        let a = task(&fx, fx.user, "a").await;
        let b = task(&fx, fx.user, "b").await;
        let c = task(&fx, fx.user, "c").await;
        fx.graph.add_edge(fx.user, a, b).await.unwrap();
        fx.graph.add_edge(fx.user, b, c).await.unwrap();

        let deps = fx.graph.list_dependencies(fx.user, a).await.unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].id, b);
    }

    #[tokio::test]
    async fn test_cycles_and_self_loops_are_accepted() {
        let fx = fixture().await;
        let a = task(&fx, fx.user, "a").await;
        let b = task(&fx, fx.user, "b").await;
        fx.graph.add_edge(fx.user, a, b).await.unwrap();
        fx.graph.add_edge(fx.user, b, a).await.unwrap();
        fx.graph.add_edge(fx.user, a, a).await.unwrap();

        assert_eq!(fx.graph.list_dependencies(fx.user, a).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_or_missing_tasks_are_not_found() {
        let fx = fixture().await;
        let other = fx
            .db
            .users
            .create(NewUser {
                username: "other".into(),
                email: "other@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap()
            .id;
        let mine = task(&fx, fx.user, "mine").await;
        let theirs = task(&fx, other, "theirs").await;

        assert!(matches!(
            fx.graph.add_edge(fx.user, mine, theirs).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            fx.graph.add_edge(fx.user, mine, Uuid::now_v7()).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            fx.graph.list_dependencies(fx.user, theirs).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_refreshes_cached_list() {
        let fx = fixture().await;
        let a = task(&fx, fx.user, "a").await;
        let b = task(&fx, fx.user, "b").await;
        fx.graph.add_edge(fx.user, a, b).await.unwrap();
        assert_eq!(fx.graph.list_dependencies(fx.user, a).await.unwrap().len(), 1);

        fx.graph.remove_edge(fx.user, a, b).await.unwrap();
        assert!(fx.graph.list_dependencies(fx.user, a).await.unwrap().is_empty());
        assert!(matches!(
            fx.graph.remove_edge(fx.user, a, b).await,
            Err(Error::NotFound(_))
        ));
    }
}
