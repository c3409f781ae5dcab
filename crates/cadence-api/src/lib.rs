//! # cadence-api
//!
//! HTTP surface for cadence: accounts and credentials, task CRUD with
//! read-through caching, the dependency graph, recurrence settings,
//! notifications and manual job triggers.
//!
//! [`build_router`] assembles the axum router from an [`AppState`]; the
//! binary in `main.rs` wires the state from the environment.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;

pub use auth::{Auth, RequireAuth};
pub use config::ServerConfig;
pub use error::ApiError;
pub use extract::JsonBody;
pub use router::build_router;
pub use services::{DependencyGraph, TaskService};
pub use state::AppState;
