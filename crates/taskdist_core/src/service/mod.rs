//! Core use-case services.
//!
//! # Responsibility
//! - Compose import, partitioning and repositories into use-case APIs.
//! - Enforce caller authorization above the repository layer.
//!
//! # Invariants
//! - Services remain storage-agnostic; they only see repository traits.
//! - Caller identity is read per call, never cached.

pub mod agent_service;
pub mod distribution_service;
pub mod task_access;
