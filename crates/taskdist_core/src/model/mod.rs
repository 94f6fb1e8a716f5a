//! Domain model for contact-task distribution.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep contact, task, agent and caller shapes explicit and typed.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` assigned on creation.
//! - A task has exactly one owning agent for its whole lifetime.

pub mod agent;
pub mod caller;
pub mod contact;
pub mod task;
