//! # cadence-jobs
//!
//! Background job processing for cadence.
//!
//! This crate provides:
//! - Priority-based job queueing with retry
//! - A concurrent worker with event broadcasting
//! - A timer-driven scheduler for periodic jobs
//! - The recurrence expansion and reminder scan jobs
//!
//! ## Example
//!
//! ```ignore
//! use cadence_jobs::{ReminderDispatcher, ReminderHandler, StoreNotificationSink, WorkerBuilder};
//!
//! let sink = Arc::new(StoreNotificationSink::new(db.notifications.clone()));
//! let worker = WorkerBuilder::new(db.clone())
//!     .with_config(WorkerConfig::from_env())
//!     .with_handler(ReminderHandler::new(ReminderDispatcher::new(db.tasks.clone(), sink)))
//!     .build()
//!     .await;
//!
//! let handle = worker.start();
//! handle.shutdown().await?;
//! ```

pub mod handler;
pub mod recurrence;
pub mod reminders;
pub mod scheduler;
pub mod worker;

// Re-export core types
pub use cadence_core::*;

pub use handler::{JobContext, JobHandler, JobResult};
pub use recurrence::{RecurrenceExpander, RecurrenceHandler, RecurrenceReport};
pub use reminders::{
    reminder_message, ReminderDispatcher, ReminderHandler, ReminderReport, StoreNotificationSink,
};
pub use scheduler::{enqueue, Scheduler, SchedulerConfig, SchedulerHandle};
pub use worker::{JobWorker, WorkerBuilder, WorkerConfig, WorkerEvent, WorkerHandle};
