//! Centralized default constants for cadence.
//!
//! **This module is the single source of truth** for shared default values.
//! Config structs read their environment overrides and fall back to these.
//!
//! Organized by domain area.

// =============================================================================
// CACHE
// =============================================================================

/// Default TTL applied to every read-through cache entry, in seconds.
pub const CACHE_TTL_SECS: u64 = 3600;

/// Capacity of the in-process LRU cache.
pub const MEMORY_CACHE_CAPACITY: usize = 10_000;

/// Default Redis URL when `REDIS_URL` is unset.
pub const REDIS_URL: &str = "redis://localhost:6379";

// =============================================================================
// RECURRENCE & REMINDERS
// =============================================================================

/// Days added per recurrence interval. Month, quarter and year are fixed
/// approximations, not calendar-aware.
pub const DAILY_OFFSET_DAYS: i64 = 1;
pub const WEEKLY_OFFSET_DAYS: i64 = 7;
pub const BI_WEEKLY_OFFSET_DAYS: i64 = 14;
pub const MONTHLY_OFFSET_DAYS: i64 = 30;
pub const QUARTERLY_OFFSET_DAYS: i64 = 90;
pub const YEARLY_OFFSET_DAYS: i64 = 365;

/// Reminder lookahead window: tasks due within this many seconds are notified.
pub const REMINDER_LOOKAHEAD_SECS: i64 = 3600;

/// Timestamp format used inside reminder messages.
pub const REMINDER_DUE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// SCHEDULER
// =============================================================================

/// Period between scheduled recurrence expansions (daily).
pub const RECURRENCE_SCHEDULE_SECS: u64 = 86_400;

/// Period between scheduled reminder scans (15 minutes).
pub const REMINDER_SCHEDULE_SECS: u64 = 900;

// =============================================================================
// JOB PROCESSING
// =============================================================================

/// Default maximum retry count for failed jobs.
pub const JOB_MAX_RETRIES: i32 = 3;

/// Default job worker poll interval in milliseconds.
pub const JOB_POLL_INTERVAL_MS: u64 = 1_000;

/// Default maximum concurrent jobs per worker.
pub const JOB_MAX_CONCURRENT: usize = 4;

/// Default job execution timeout in seconds (5 minutes).
pub const JOB_TIMEOUT_SECS: u64 = 300;

/// Queue priority for manually triggered and scheduled automation jobs.
pub const AUTOMATION_JOB_PRIORITY: i32 = 5;

/// Broadcast capacity for worker events.
pub const WORKER_EVENT_CAPACITY: usize = 100;

// =============================================================================
// AUTH
// =============================================================================

/// Access token lifetime in minutes.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

/// Refresh token lifetime in days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Prefix of long-lived API keys.
pub const API_KEY_PREFIX: &str = "ck_";

/// Number of random characters following the API key prefix.
pub const API_KEY_RANDOM_LEN: usize = 32;

/// Minimum length of `AUTH_TOKEN_SECRET`.
pub const TOKEN_SECRET_MIN_LEN: usize = 32;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for notification listing.
pub const NOTIFICATION_PAGE_LIMIT: i64 = 10;

/// Maximum page size for notification listing.
pub const NOTIFICATION_PAGE_LIMIT_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

/// Default number of jobs returned by recent-job listings.
pub const JOB_LIST_LIMIT: i64 = 50;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u32 = 1000;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Maximum request body size in bytes (1 MB).
pub const MAX_BODY_SIZE_BYTES: usize = 1024 * 1024;

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Default maximum pool connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default minimum idle pool connections.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Default connection acquire timeout in seconds.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default idle connection timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default maximum connection lifetime in seconds.
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;
