//! Scheduled jobs flowing through the worker against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use cadence_cache::{CacheConfig, CacheKey, TaskCache, TaskSnapshot};
use cadence_db::Database;
use cadence_jobs::{
    enqueue, JobStatus, JobType, NewTask, NewUser, RecurrenceExpander, RecurrenceHandler,
    RecurrenceInterval, ReminderDispatcher, ReminderHandler, StoreNotificationSink, TaskPriority,
    TaskStatus, WorkerBuilder, WorkerConfig, WorkerEvent,
};

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

fn recurring(user_id: Uuid, title: &str, interval: RecurrenceInterval) -> NewTask {
    NewTask {
        user_id,
        title: title.into(),
        description: Some("standup".into()),
        due_date: Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap(),
        status: TaskStatus::Pending,
        priority: TaskPriority::High,
        is_recurring: true,
        recurrence_interval: Some(interval),
    }
}

async fn wait_for(
    events: &mut broadcast::Receiver<WorkerEvent>,
    wanted: JobType,
) -> WorkerEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event @ WorkerEvent::JobCompleted { job_type, .. }) if job_type == wanted => {
                    return event
                }
                Ok(event @ WorkerEvent::JobFailed { job_type, .. }) if job_type == wanted => {
                    return event
                }
                Ok(_) => continue,
                Err(e) => panic!("worker event stream ended: {e}"),
            }
        }
    })
    .await
    .expect("job did not finish in time")
}

#[tokio::test]
async fn test_expansion_invalidates_cached_task_list() {
    let db = Database::in_memory();
    let cache = CacheConfig::in_memory().connect().await;
    let user = seed_user(&db).await;
    db.tasks
        .insert(recurring(user, "Report", RecurrenceInterval::Monthly))
        .await
        .unwrap();

    let key = CacheKey::task_list(user);
    let load = |tasks: Arc<dyn cadence_jobs::TaskRepository>| async move {
        Ok::<_, cadence_jobs::Error>(TaskSnapshot::from_tasks(
            &tasks.list_for_user(user).await?,
        ))
    };
    let before: Vec<TaskSnapshot> = cache
        .read_through(&key, || load(db.tasks.clone()))
        .await
        .unwrap();
    assert_eq!(before.len(), 1);

    let report = RecurrenceExpander::new(db.tasks.clone(), cache.clone())
        .expand()
        .await
        .unwrap();
    assert_eq!(report.created_task_ids.len(), 1);

    let after: Vec<TaskSnapshot> = cache
        .read_through(&key, || load(db.tasks.clone()))
        .await
        .unwrap();
    assert_eq!(after.len(), 2);
    let clone = after
        .iter()
        .find(|t| t.id == report.created_task_ids[0])
        .unwrap();
    assert_eq!(
        clone.due_date,
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    );
    assert!(clone.is_recurring);
    assert_eq!(clone.priority, TaskPriority::High);
}

#[tokio::test]
async fn test_expansion_skips_unrecognized_and_keeps_others() {
    let db = Database::in_memory();
    let user = seed_user(&db).await;
    db.tasks
        .insert(recurring(user, "Daily", RecurrenceInterval::Daily))
        .await
        .unwrap();
    db.tasks
        .insert(recurring(
            user,
            "Fortnightly",
            RecurrenceInterval::Unrecognized("fortnightly".into()),
        ))
        .await
        .unwrap();

    let cache = TaskCache::new(Arc::new(cadence_cache::MemoryCache::new(16)));
    let report = RecurrenceExpander::new(db.tasks.clone(), cache)
        .expand()
        .await
        .unwrap();

    assert_eq!(report.created_task_ids.len(), 1);
    assert_eq!(report.skipped_task_ids.len(), 1);
    assert_eq!(db.tasks.list_for_user(user).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_worker_runs_queued_jobs_end_to_end() {
    let db = Database::in_memory();
    let cache = CacheConfig::in_memory().connect().await;
    let user = seed_user(&db).await;
    // Template and its clone both fall well outside the reminder window.
    let template = db
        .tasks
        .insert(NewTask {
            due_date: Utc::now() + chrono::Duration::days(30),
            ..recurring(user, "Weekly sync", RecurrenceInterval::Weekly)
        })
        .await
        .unwrap();
    let due_now = db
        .tasks
        .insert(NewTask {
            user_id: user,
            title: "Pay invoice".into(),
            description: None,
            due_date: Utc::now() + chrono::Duration::minutes(10),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            is_recurring: false,
            recurrence_interval: None,
        })
        .await
        .unwrap();

    let sink = Arc::new(StoreNotificationSink::new(db.notifications.clone()));
    let worker = WorkerBuilder::new(db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(10))
        .with_handler(RecurrenceHandler::new(RecurrenceExpander::new(
            db.tasks.clone(),
            cache.clone(),
        )))
        .with_handler(ReminderHandler::new(ReminderDispatcher::new(
            db.tasks.clone(),
            sink,
        )))
        .build()
        .await;
    let handle = worker.start();
    let mut events = handle.events();

    let expansion_id = enqueue(db.jobs.as_ref(), JobType::RecurrenceExpansion)
        .await
        .unwrap();
    match wait_for(&mut events, JobType::RecurrenceExpansion).await {
        WorkerEvent::JobCompleted { job_id, .. } => assert_eq!(job_id, expansion_id),
        other => panic!("unexpected event: {other:?}"),
    }

    let reminder_id = enqueue(db.jobs.as_ref(), JobType::ReminderScan)
        .await
        .unwrap();
    match wait_for(&mut events, JobType::ReminderScan).await {
        WorkerEvent::JobCompleted { job_id, .. } => assert_eq!(job_id, reminder_id),
        other => panic!("unexpected event: {other:?}"),
    }

    let expansion = db.jobs.get(expansion_id).await.unwrap().unwrap();
    assert_eq!(expansion.status, JobStatus::Completed);
    let created = expansion.result.unwrap()["created_task_ids"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(created, 1);

    let reminder = db.jobs.get(reminder_id).await.unwrap().unwrap();
    assert_eq!(reminder.status, JobStatus::Completed);
    assert_eq!(reminder.result.unwrap()["count"], 1);
    assert_eq!(
        db.notifications.list_for_task(due_now.id).await.unwrap().len(),
        1
    );
    assert!(db
        .notifications
        .list_for_task(template.id)
        .await
        .unwrap()
        .is_empty());

    handle.shutdown().await.unwrap();
}
