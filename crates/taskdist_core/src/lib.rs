//! Core task distribution engine.
//!
//! Turns an uploaded contact list into tasks split across the active agent
//! roster, and gates every later task read and update by owner or admin.
//! This crate is the single source of truth for distribution invariants.

pub mod db;
pub mod distribution;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use distribution::{partition, Assignment, DistributionBatch, PartitionError};
pub use import::{ImportError, RecordFormat};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::agent::{
    Agent, AgentId, AgentProfileUpdate, AgentSnapshot, AgentStatus, NewAgent,
};
pub use model::caller::{Caller, CallerIdentity, CallerRole};
pub use model::contact::{CellValue, RawRecord, ValidatedContact};
pub use model::task::{InvalidTaskStatus, Task, TaskId, TaskStatus, TaskUpdate};
pub use repo::agent_repo::{AgentRepository, AgentRoster, SqliteAgentRepository};
pub use repo::task_repo::{AgentTaskGroup, SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::agent_service::{AgentService, AgentServiceError};
pub use service::distribution_service::{
    DistributionError, DistributionService, DistributionSummary, PartialDistribution,
};
pub use service::task_access::{AccessError, TaskAccessService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
