//! Recurrence arithmetic.
//!
//! A recurring task is a standing generator: expanding it produces a fresh,
//! non-recurring instance due one period after the template, and the template
//! itself is never rescheduled.

use chrono::{DateTime, Duration, Utc};

use crate::defaults;
use crate::models::{NewTask, RecurrenceInterval, Task, TaskStatus};

/// Fixed day offset for an interval, or `None` when the interval is unrecognized.
pub fn offset_days(interval: &RecurrenceInterval) -> Option<i64> {
    match interval {
        RecurrenceInterval::Daily => Some(defaults::DAILY_OFFSET_DAYS),
        RecurrenceInterval::Weekly => Some(defaults::WEEKLY_OFFSET_DAYS),
        RecurrenceInterval::BiWeekly => Some(defaults::BI_WEEKLY_OFFSET_DAYS),
        RecurrenceInterval::Monthly => Some(defaults::MONTHLY_OFFSET_DAYS),
        RecurrenceInterval::Quarterly => Some(defaults::QUARTERLY_OFFSET_DAYS),
        RecurrenceInterval::Yearly => Some(defaults::YEARLY_OFFSET_DAYS),
        RecurrenceInterval::Unrecognized(_) => None,
    }
}

/// Due date of the occurrence after `due`.
pub fn next_due_date(due: DateTime<Utc>, interval: &RecurrenceInterval) -> Option<DateTime<Utc>> {
    offset_days(interval).map(|days| due + Duration::days(days))
}

/// Build the next instance of a recurring task.
///
/// Returns `None` for non-recurring tasks, tasks without an interval, and
/// tasks whose interval is unrecognized. None of these are errors.
pub fn advance(task: &Task) -> Option<NewTask> {
    if !task.is_recurring {
        return None;
    }
    let interval = task.recurrence_interval.as_ref()?;
    if !interval.is_known() {
        tracing::debug!(
            task_id = %task.id,
            interval = %interval,
            "Skipping recurring task with unrecognized interval"
        );
        return None;
    }
    let due_date = next_due_date(task.due_date, interval)?;

    Some(NewTask {
        user_id: task.user_id,
        title: task.title.clone(),
        description: task.description.clone(),
        due_date,
        status: TaskStatus::Pending,
        priority: task.priority,
        is_recurring: false,
        recurrence_interval: None,
    })
}
