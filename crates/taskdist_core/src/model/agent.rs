//! Agent roster model.
//!
//! # Responsibility
//! - Define the roster entry consumed by distribution.
//! - Define the read-only agent snapshot used in distribution reports.
//!
//! # Invariants
//! - `email` is unique across the roster.
//! - Only `AgentStatus::Active` agents receive newly distributed tasks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a roster agent.
pub type AgentId = Uuid;

/// Roster participation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    /// Stable storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parses the storage string form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub status: AgentStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Agent {
    /// Returns whether this agent may receive new tasks.
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// Projects the public part of this agent for reports.
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public agent fields shown alongside aggregated tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub name: String,
    pub email: String,
}

/// Input for registering a new roster agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgent {
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
}

/// Partial profile update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}
