//! Reminder scans against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use cadence_db::{Database, MemoryStore};
use cadence_jobs::{
    Error, NewTask, NewUser, Notification, NotificationSink, ReminderDispatcher, Result,
    StoreNotificationSink, Task, TaskPriority, TaskStatus,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

async fn seed_user(db: &Database) -> Uuid {
    db.users
        .create(NewUser {
            username: format!("user-{}", Uuid::now_v7()),
            email: format!("{}@example.com", Uuid::now_v7()),
            password_hash: "hash".into(),
        })
        .await
        .unwrap()
        .id
}

async fn seed_task(db: &Database, user_id: Uuid, title: &str, due: DateTime<Utc>, status: TaskStatus) -> Task {
    db.tasks
        .insert(NewTask {
            user_id,
            title: title.into(),
            description: None,
            due_date: due,
            status,
            priority: TaskPriority::Medium,
            is_recurring: false,
            recurrence_interval: None,
        })
        .await
        .unwrap()
}

fn dispatcher(db: &Database) -> ReminderDispatcher {
    let sink = Arc::new(StoreNotificationSink::new(db.notifications.clone()));
    ReminderDispatcher::new(db.tasks.clone(), sink)
}

#[tokio::test]
async fn test_only_pending_tasks_inside_window_are_notified() {
    let db = Database::in_memory();
    let user = seed_user(&db).await;
    let soon = seed_task(&db, user, "soon", now() + Duration::minutes(30), TaskStatus::Pending).await;
    seed_task(&db, user, "later", now() + Duration::hours(2), TaskStatus::Pending).await;
    seed_task(&db, user, "done", now() + Duration::minutes(30), TaskStatus::Complete).await;

    let report = dispatcher(&db).scan_and_notify(now()).await.unwrap();
    assert_eq!(report.notified_task_ids, vec![soon.id]);
    assert_eq!(report.count, 1);

    let notes = db.notifications.list_for_task(soon.id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].user_id, user);
    assert_eq!(notes[0].sent_at, Some(now()));
    assert!(!notes[0].is_read);
    assert_eq!(
        notes[0].message,
        "Reminder: Task 'soon' is due at 2024-06-01 08:30:00."
    );
}

#[tokio::test]
async fn test_overdue_and_boundary_tasks_are_included() {
    let db = Database::in_memory();
    let user = seed_user(&db).await;
    let overdue = seed_task(&db, user, "overdue", now() - Duration::days(2), TaskStatus::Pending).await;
    let edge = seed_task(&db, user, "edge", now() + Duration::hours(1), TaskStatus::Pending).await;
    seed_task(&db, user, "in progress", now(), TaskStatus::InProgress).await;

    let report = dispatcher(&db).scan_and_notify(now()).await.unwrap();
    assert_eq!(report.notified_task_ids, vec![overdue.id, edge.id]);
}

#[tokio::test]
async fn test_repeated_scans_notify_again() {
    let db = Database::in_memory();
    let user = seed_user(&db).await;
    let task = seed_task(&db, user, "twice", now() + Duration::minutes(5), TaskStatus::Pending).await;

    let dispatcher = dispatcher(&db);
    dispatcher.scan_and_notify(now()).await.unwrap();
    dispatcher.scan_and_notify(now()).await.unwrap();

    assert_eq!(db.notifications.list_for_task(task.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_scan_covers_every_user() {
    let db = Database::in_memory();
    let a = seed_user(&db).await;
    let b = seed_user(&db).await;
    seed_task(&db, a, "a", now(), TaskStatus::Pending).await;
    seed_task(&db, b, "b", now(), TaskStatus::Pending).await;

    let report = dispatcher(&db).scan_and_notify(now()).await.unwrap();
    assert_eq!(report.count, 2);
    assert_eq!(db.notifications.list_unread(a, 10, 0).await.unwrap().len(), 1);
    assert_eq!(db.notifications.list_unread(b, 10, 0).await.unwrap().len(), 1);
}

/// Sink that refuses one task and records the rest.
struct FlakySink {
    refuse: Uuid,
    inner: StoreNotificationSink,
}

#[async_trait]
impl NotificationSink for FlakySink {
    async fn deliver(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Notification> {
        if task_id == self.refuse {
            return Err(Error::Storage("delivery channel unavailable".into()));
        }
        self.inner.deliver(user_id, task_id, message, sent_at).await
    }
}

#[tokio::test]
async fn test_failed_delivery_is_skipped_not_fatal() {
    let store = Arc::new(MemoryStore::new());
    let db = Database::from_memory(store.clone());
    let user = seed_user(&db).await;
    let first = seed_task(&db, user, "first", now(), TaskStatus::Pending).await;
    let broken = seed_task(&db, user, "broken", now(), TaskStatus::Pending).await;
    let last = seed_task(&db, user, "last", now(), TaskStatus::Pending).await;

    let sink = Arc::new(FlakySink {
        refuse: broken.id,
        inner: StoreNotificationSink::new(db.notifications.clone()),
    });
    let report = ReminderDispatcher::new(db.tasks.clone(), sink)
        .scan_and_notify(now())
        .await
        .unwrap();

    assert_eq!(report.notified_task_ids, vec![first.id, last.id]);
    assert_eq!(report.count, 2);
    assert!(db.notifications.list_for_task(broken.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_custom_lookahead() {
    let db = Database::in_memory();
    let user = seed_user(&db).await;
    let task = seed_task(&db, user, "tomorrow", now() + Duration::hours(20), TaskStatus::Pending).await;

    let narrow = dispatcher(&db).scan_and_notify(now()).await.unwrap();
    assert_eq!(narrow.count, 0);

    let wide = dispatcher(&db)
        .with_lookahead(Duration::days(1))
        .scan_and_notify(now())
        .await
        .unwrap();
    assert_eq!(wide.notified_task_ids, vec![task.id]);
}
