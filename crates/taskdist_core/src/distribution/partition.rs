//! Contiguous block round robin partitioning.
//!
//! `block_size = ceil(N / M)` and contact `i` goes to agent
//! `floor(i / block_size) mod M`. Each agent receives one contiguous run of
//! contacts in roster order.
//!
//! The policy does not balance to +/-1: N=7, M=3 yields blocks 3,3,1 and
//! N=4, M=3 yields 2,2,0. This is the intended behavior.

use crate::model::agent::{Agent, AgentId};
use crate::model::contact::ValidatedContact;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Partitioning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionError {
    /// Roster has no active agents.
    NoAgentsAvailable,
}

impl Display for PartitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAgentsAvailable => write!(f, "no active agents available for distribution"),
        }
    }
}

impl Error for PartitionError {}

/// One contact paired with its owning agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub contact: ValidatedContact,
    pub agent_id: AgentId,
}

/// In-memory result of partitioning one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionBatch {
    /// Assignments in input contact order.
    pub assignments: Vec<Assignment>,
    /// Planned number of contacts per agent; agents with zero are omitted.
    pub planned_per_agent: BTreeMap<AgentId, usize>,
}

impl DistributionBatch {
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Returns `ceil(contact_count / agent_count)`.
///
/// # Errors
/// - `PartitionError::NoAgentsAvailable` when `agent_count == 0`.
pub fn block_size(contact_count: usize, agent_count: usize) -> Result<usize, PartitionError> {
    if agent_count == 0 {
        return Err(PartitionError::NoAgentsAvailable);
    }
    Ok(contact_count.div_ceil(agent_count))
}

/// Agent index for the contact at `position`.
///
/// Always in `[0, agent_count - 1]`. `block_size` and `agent_count` must be
/// non-zero.
pub fn agent_index_for(position: usize, block_size: usize, agent_count: usize) -> usize {
    (position / block_size) % agent_count
}

/// Computes the agent index for each of `contact_count` contacts.
///
/// # Errors
/// - `PartitionError::NoAgentsAvailable` when `agent_count == 0`.
pub fn assign_agent_indices(
    contact_count: usize,
    agent_count: usize,
) -> Result<Vec<usize>, PartitionError> {
    let block = block_size(contact_count, agent_count)?;
    Ok((0..contact_count)
        .map(|position| agent_index_for(position, block, agent_count))
        .collect())
}

/// Pairs each contact with an agent from the ordered roster.
///
/// # Errors
/// - `PartitionError::NoAgentsAvailable` when `agents` is empty.
pub fn partition(
    contacts: Vec<ValidatedContact>,
    agents: &[Agent],
) -> Result<DistributionBatch, PartitionError> {
    let indices = assign_agent_indices(contacts.len(), agents.len())?;

    let mut batch = DistributionBatch::default();
    for (contact, index) in contacts.into_iter().zip(indices) {
        let agent_id = agents[index].id;
        *batch.planned_per_agent.entry(agent_id).or_insert(0) += 1;
        batch.assignments.push(Assignment { contact, agent_id });
    }
    Ok(batch)
}
