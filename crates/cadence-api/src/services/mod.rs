//! Service layer for business logic.

pub mod dependency_graph;
pub mod task_service;

pub use dependency_graph::DependencyGraph;
pub use task_service::TaskService;
