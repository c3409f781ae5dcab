//! # cadence-core
//!
//! Core types, traits, and abstractions for the cadence task backend.
//!
//! This crate provides the domain models, the repository and collaborator
//! traits that the storage, cache, auth and job crates implement, and the
//! pure recurrence arithmetic shared by the API and the background jobs.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod recurrence;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::new_v7;
