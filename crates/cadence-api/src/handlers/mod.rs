//! HTTP handlers for cadence-api.

pub mod auth;
pub mod automation;
pub mod notifications;
pub mod recurrence;
pub mod tasks;
