//! Contact-to-agent assignment.
//!
//! # Responsibility
//! - Assign validated contacts to roster agents deterministically.
//!
//! # Invariants
//! - Assignment depends only on contact order, roster order and roster size.
//! - Assignment is pure: no I/O, no roster lookup.

pub mod partition;

pub use partition::{
    agent_index_for, assign_agent_indices, block_size, partition, Assignment, DistributionBatch,
    PartitionError,
};
