//! Structured logging schema and field name constants for cadence.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same field names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), job completions |
//! | DEBUG | Decision points, cache hits/misses, config choices |
//! | TRACE | Per-item iteration (each reminder, each clone) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → job.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "cache", "auth", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "worker", "scheduler", "recurrence", "reminders", "task_cache"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "expand", "scan_and_notify", "read_through", "invalidate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID owning the data being operated on.
pub const USER_ID: &str = "user_id";

/// Task UUID being operated on.
pub const TASK_ID: &str = "task_id";

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// Job type enum variant.
pub const JOB_TYPE: &str = "job_type";

/// Cache key being read or invalidated.
pub const CACHE_KEY: &str = "cache_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned or written.
pub const RESULT_COUNT: &str = "result_count";

/// Number of cache keys invalidated by one mutation.
pub const KEY_COUNT: &str = "key_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_distinct() {
        let fields = [
            REQUEST_ID,
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            USER_ID,
            TASK_ID,
            JOB_ID,
            JOB_TYPE,
            CACHE_KEY,
            DURATION_MS,
            RESULT_COUNT,
            KEY_COUNT,
            POOL_SIZE,
            POOL_IDLE,
            SUCCESS,
            ERROR_MSG,
        ];
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
    }

    #[test]
    fn test_field_names_are_snake_case() {
        for name in [USER_ID, TASK_ID, JOB_ID, DURATION_MS, RESULT_COUNT] {
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
