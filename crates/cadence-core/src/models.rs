//! Core data models for cadence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// TASK TYPES
// =============================================================================

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// How often a recurring task generates its next instance.
///
/// Stored and serialized as its snake_case name. Values outside the known
/// set decode to [`RecurrenceInterval::Unrecognized`] rather than failing,
/// so legacy rows still load and the recurrence engine can skip them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecurrenceInterval {
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    Yearly,
    Unrecognized(String),
}

impl RecurrenceInterval {
    /// All intervals the recurrence engine knows how to advance.
    pub const KNOWN: [RecurrenceInterval; 6] = [
        RecurrenceInterval::Daily,
        RecurrenceInterval::Weekly,
        RecurrenceInterval::BiWeekly,
        RecurrenceInterval::Monthly,
        RecurrenceInterval::Quarterly,
        RecurrenceInterval::Yearly,
    ];

    /// Parse a known interval name, rejecting anything else.
    pub fn parse_known(value: &str) -> Result<Self> {
        match Self::from(value.to_string()) {
            RecurrenceInterval::Unrecognized(raw) => Err(Error::InvalidInput(format!(
                "Invalid recurrence interval '{}'. Valid options are: daily, weekly, bi_weekly, monthly, quarterly, yearly",
                raw
            ))),
            known => Ok(known),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecurrenceInterval::Daily => "daily",
            RecurrenceInterval::Weekly => "weekly",
            RecurrenceInterval::BiWeekly => "bi_weekly",
            RecurrenceInterval::Monthly => "monthly",
            RecurrenceInterval::Quarterly => "quarterly",
            RecurrenceInterval::Yearly => "yearly",
            RecurrenceInterval::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RecurrenceInterval::Unrecognized(_))
    }

    /// Human phrasing of one period ("day", "two weeks", ...).
    fn period_phrase(&self) -> Option<&'static str> {
        match self {
            RecurrenceInterval::Daily => Some("day"),
            RecurrenceInterval::Weekly => Some("week"),
            RecurrenceInterval::BiWeekly => Some("two weeks"),
            RecurrenceInterval::Monthly => Some("month"),
            RecurrenceInterval::Quarterly => Some("three months"),
            RecurrenceInterval::Yearly => Some("year"),
            RecurrenceInterval::Unrecognized(_) => None,
        }
    }
}

impl From<String> for RecurrenceInterval {
    fn from(value: String) -> Self {
        match value.as_str() {
            "daily" => RecurrenceInterval::Daily,
            "weekly" => RecurrenceInterval::Weekly,
            "bi_weekly" => RecurrenceInterval::BiWeekly,
            "monthly" => RecurrenceInterval::Monthly,
            "quarterly" => RecurrenceInterval::Quarterly,
            "yearly" => RecurrenceInterval::Yearly,
            _ => RecurrenceInterval::Unrecognized(value),
        }
    }
}

impl From<RecurrenceInterval> for String {
    fn from(value: RecurrenceInterval) -> Self {
        match value {
            RecurrenceInterval::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RecurrenceInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_recurring: bool,
    pub recurrence_interval: Option<RecurrenceInterval>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Describe the recurrence pattern in words.
    pub fn recurrence_description(&self) -> String {
        match (&self.recurrence_interval, self.is_recurring) {
            (Some(interval), true) => match interval.period_phrase() {
                Some(phrase) => format!("Repeats every {}", phrase),
                None => format!("Repeats on an unrecognized schedule '{}'", interval),
            },
            _ => "Non-recurring task".to_string(),
        }
    }
}

/// Insert payload for a task, including its owner.
///
/// Also used as the full-replacement payload for updates, in which case
/// `user_id` scopes the update to tasks owned by that user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_recurring: bool,
    pub recurrence_interval: Option<RecurrenceInterval>,
}

impl NewTask {
    /// Enforce the task invariants before anything reaches the store.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("Task title must not be empty".into()));
        }
        if self.recurrence_interval.is_some() && !self.is_recurring {
            return Err(Error::InvalidInput(
                "recurrence_interval may only be set on recurring tasks".into(),
            ));
        }
        Ok(())
    }
}

fn default_status() -> TaskStatus {
    TaskStatus::Pending
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Create/update request body for a task.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_interval: Option<String>,
}

impl CreateTaskRequest {
    /// Validate the request and bind it to its owner.
    ///
    /// Unknown interval names are rejected here; only rows that predate
    /// validation can carry an unrecognized interval.
    pub fn into_new_task(self, user_id: Uuid) -> Result<NewTask> {
        let recurrence_interval = self
            .recurrence_interval
            .as_deref()
            .map(RecurrenceInterval::parse_known)
            .transpose()?;
        let task = NewTask {
            user_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status: self.status,
            priority: self.priority,
            is_recurring: self.is_recurring,
            recurrence_interval,
        };
        task.validate()?;
        Ok(task)
    }
}

/// Directed edge: `task_id` depends on `dependent_task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    pub id: Uuid,
    pub task_id: Uuid,
    pub dependent_task_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// NOTIFICATION TYPES
// =============================================================================

/// A reminder written for a task's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

// =============================================================================
// USER TYPES
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// SHA-256 hex digest of the current API key, if one was issued.
    #[serde(skip_serializing)]
    pub api_key_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// =============================================================================
// JOB TYPES
// =============================================================================

/// Status of a job in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Type of job to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Materialize the next instance of every recurring task
    RecurrenceExpansion,
    /// Notify owners of pending tasks due within the lookahead window
    ReminderScan,
}

impl JobType {
    /// Default priority for this job type (higher = more urgent)
    pub fn default_priority(&self) -> i32 {
        match self {
            // Reminders are time-sensitive; a late reminder is worthless
            JobType::ReminderScan => 7,
            JobType::RecurrenceExpansion => crate::defaults::AUTOMATION_JOB_PRIORITY,
        }
    }
}

/// A job in the processing queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub priority: i32,
    pub payload: Option<JsonValue>,
    pub result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// AUTH TYPES
// =============================================================================

/// How a principal proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    AccessToken,
    ApiKey,
}

/// Authenticated principal.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPrincipal {
    User {
        user_id: Uuid,
        username: String,
        method: AuthMethod,
    },
    Anonymous,
}

impl AuthPrincipal {
    /// Check if the principal is authenticated.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthPrincipal::Anonymous)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthPrincipal::User { user_id, .. } => Some(*user_id),
            AuthPrincipal::Anonymous => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task(is_recurring: bool, interval: Option<RecurrenceInterval>) -> Task {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Task {
            id: Uuid::now_v7(),
            title: "Water plants".into(),
            description: Some("balcony".into()),
            due_date: ts,
            status: TaskStatus::Pending,
            priority: TaskPriority::High,
            is_recurring,
            recurrence_interval: interval,
            user_id: Uuid::now_v7(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn request(json: serde_json::Value) -> CreateTaskRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_interval_wire_names() {
        for (interval, name) in [
            (RecurrenceInterval::Daily, "\"daily\""),
            (RecurrenceInterval::BiWeekly, "\"bi_weekly\""),
            (RecurrenceInterval::Quarterly, "\"quarterly\""),
        ] {
            assert_eq!(serde_json::to_string(&interval).unwrap(), name);
        }
    }

    #[test]
    fn test_unknown_interval_survives_decode() {
        let interval: RecurrenceInterval = serde_json::from_str("\"fortnightly\"").unwrap();
        assert_eq!(interval, RecurrenceInterval::Unrecognized("fortnightly".into()));
        assert!(!interval.is_known());
        assert_eq!(serde_json::to_string(&interval).unwrap(), "\"fortnightly\"");
    }

    #[test]
    fn test_parse_known_rejects_unknown() {
        assert_eq!(
            RecurrenceInterval::parse_known("weekly").unwrap(),
            RecurrenceInterval::Weekly
        );
        let err = RecurrenceInterval::parse_known("hourly").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_status_and_priority_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(serde_json::to_string(&TaskPriority::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn test_recurrence_description() {
        assert_eq!(
            sample_task(true, Some(RecurrenceInterval::BiWeekly)).recurrence_description(),
            "Repeats every two weeks"
        );
        assert_eq!(
            sample_task(true, Some(RecurrenceInterval::Quarterly)).recurrence_description(),
            "Repeats every three months"
        );
        assert_eq!(
            sample_task(false, None).recurrence_description(),
            "Non-recurring task"
        );
        assert_eq!(
            sample_task(true, None).recurrence_description(),
            "Non-recurring task"
        );
    }

    #[test]
    fn test_request_defaults() {
        let req = request(serde_json::json!({
            "title": "Pay rent",
            "due_date": "2026-04-01T00:00:00Z"
        }));
        assert_eq!(req.status, TaskStatus::Pending);
        assert_eq!(req.priority, TaskPriority::Medium);
        assert!(!req.is_recurring);
        assert!(req.recurrence_interval.is_none());
    }

    #[test]
    fn test_into_new_task_rejects_interval_without_recurrence() {
        let req = request(serde_json::json!({
            "title": "Pay rent",
            "due_date": "2026-04-01T00:00:00Z",
            "recurrence_interval": "monthly"
        }));
        let err = req.into_new_task(Uuid::now_v7()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_into_new_task_rejects_unknown_interval() {
        let req = request(serde_json::json!({
            "title": "Pay rent",
            "due_date": "2026-04-01T00:00:00Z",
            "is_recurring": true,
            "recurrence_interval": "every_other_tuesday"
        }));
        assert!(matches!(
            req.into_new_task(Uuid::now_v7()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_into_new_task_rejects_blank_title() {
        let req = request(serde_json::json!({
            "title": "   ",
            "due_date": "2026-04-01T00:00:00Z"
        }));
        assert!(matches!(
            req.into_new_task(Uuid::now_v7()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_into_new_task_binds_owner() {
        let owner = Uuid::now_v7();
        let task = request(serde_json::json!({
            "title": "Pay rent",
            "due_date": "2026-04-01T00:00:00Z",
            "is_recurring": true,
            "recurrence_interval": "monthly",
            "priority": "high"
        }))
        .into_new_task(owner)
        .unwrap();
        assert_eq!(task.user_id, owner);
        assert_eq!(task.recurrence_interval, Some(RecurrenceInterval::Monthly));
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn test_user_hashes_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            api_key_hash: Some("abc".into()),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("api_key_hash"));
    }

    #[test]
    fn test_principal_user_id() {
        let id = Uuid::now_v7();
        let principal = AuthPrincipal::User {
            user_id: id,
            username: "ada".into(),
            method: AuthMethod::ApiKey,
        };
        assert!(principal.is_authenticated());
        assert_eq!(principal.user_id(), Some(id));
        assert_eq!(AuthPrincipal::Anonymous.user_id(), None);
    }
}
