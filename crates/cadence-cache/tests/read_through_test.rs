//! Read-through caching against the in-memory record store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use cadence_cache::{CacheKey, MemoryCache, Mutation, TaskCache, TaskSnapshot};
use cadence_db::{Database, NewTask, NewUser, RecurrenceInterval, TaskPriority, TaskStatus};

async fn seed_user(db: &Database, name: &str) -> Uuid {
    db.users
        .create(NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn new_task(user_id: Uuid, title: &str) -> NewTask {
    NewTask {
        user_id,
        title: title.to_string(),
        description: None,
        due_date: Utc::now(),
        status: TaskStatus::Pending,
        priority: TaskPriority::Medium,
        is_recurring: false,
        recurrence_interval: None,
    }
}

async fn read_detail(
    cache: &TaskCache,
    db: &Database,
    loads: &AtomicUsize,
    user_id: Uuid,
    task_id: Uuid,
) -> TaskSnapshot {
    cache
        .read_through(&CacheKey::task(user_id, task_id), || async {
            loads.fetch_add(1, Ordering::SeqCst);
            let task = db.tasks.fetch_owned(user_id, task_id).await?;
            task.map(TaskSnapshot::from)
                .ok_or_else(|| cadence_db::Error::NotFound("Task not found".into()))
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_update_then_read_never_returns_stale_snapshot() {
    let db = Database::in_memory();
    let cache = TaskCache::new(Arc::new(MemoryCache::default()));
    let loads = AtomicUsize::new(0);
    let user = seed_user(&db, "grace").await;
    let task = db.tasks.insert(new_task(user, "draft")).await.unwrap();

    let first = read_detail(&cache, &db, &loads, user, task.id).await;
    assert_eq!(first.title, "draft");
    let again = read_detail(&cache, &db, &loads, user, task.id).await;
    assert_eq!(again, first);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    db.tasks
        .update(task.id, new_task(user, "final"))
        .await
        .unwrap()
        .unwrap();
    cache
        .invalidate(&Mutation::TaskUpdated {
            user_id: user,
            task_id: task.id,
            dependents: db.dependencies.list_dependents(task.id).await.unwrap(),
        })
        .await;

    let after = read_detail(&cache, &db, &loads, user, task.id).await;
    assert_eq!(after.title, "final");
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_dependency_list_refreshes_when_dependency_changes() {
    let db = Database::in_memory();
    let cache = TaskCache::new(Arc::new(MemoryCache::default()));
    let user = seed_user(&db, "linus").await;
    let owner = db.tasks.insert(new_task(user, "ship")).await.unwrap();
    let dep = db.tasks.insert(new_task(user, "test")).await.unwrap();
    db.dependencies.insert(owner.id, dep.id).await.unwrap();

    let key = CacheKey::dependencies(user, owner.id);
    let load = || async {
        let tasks = db.dependencies.list_dependencies(owner.id).await?;
        Ok::<_, cadence_db::Error>(TaskSnapshot::from_tasks(&tasks))
    };

    let before: Vec<TaskSnapshot> = cache.read_through(&key, load).await.unwrap();
    assert_eq!(before[0].title, "test");

    // Renaming the dependency must refresh the owner's cached list.
    db.tasks
        .update(dep.id, new_task(user, "test harder"))
        .await
        .unwrap();
    cache
        .invalidate(&Mutation::TaskUpdated {
            user_id: user,
            task_id: dep.id,
            dependents: db.dependencies.list_dependents(dep.id).await.unwrap(),
        })
        .await;

    let after: Vec<TaskSnapshot> = cache.read_through(&key, load).await.unwrap();
    assert_eq!(after[0].title, "test harder");
}

#[tokio::test]
async fn test_empty_lists_are_cached() {
    let db = Database::in_memory();
    let store = Arc::new(MemoryCache::default());
    let cache = TaskCache::new(store.clone());
    let user = seed_user(&db, "edsger").await;

    let key = CacheKey::recurring_list(user);
    let tasks: Vec<TaskSnapshot> = cache
        .read_through(&key, || async {
            let tasks = db.tasks.list_recurring_for_user(user).await?;
            Ok::<_, cadence_db::Error>(TaskSnapshot::from_tasks(&tasks))
        })
        .await
        .unwrap();
    assert!(tasks.is_empty());
    assert_eq!(
        cadence_db::CacheStore::get(store.as_ref(), &key.to_string())
            .await
            .unwrap()
            .as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn test_recurring_snapshot_round_trips_through_cache() {
    let db = Database::in_memory();
    let cache = TaskCache::new(Arc::new(MemoryCache::default()));
    let user = seed_user(&db, "barbara").await;
    let mut recurring = new_task(user, "standup");
    recurring.is_recurring = true;
    recurring.recurrence_interval = Some(RecurrenceInterval::Quarterly);
    let task = db.tasks.insert(recurring).await.unwrap();

    let key = CacheKey::recurring(user, task.id);
    let fresh: TaskSnapshot = cache
        .read_through(&key, || async { Ok(TaskSnapshot::from(&task)) })
        .await
        .unwrap();
    let cached: TaskSnapshot = cache
        .read_through(&key, || async {
            Err(cadence_db::Error::Internal("store read on a cache hit".into()))
        })
        .await
        .unwrap();

    assert_eq!(cached, fresh);
    assert_eq!(cached.recurrence_description, "Repeats every three months");
    assert_eq!(cached.into_task(), task);
}
