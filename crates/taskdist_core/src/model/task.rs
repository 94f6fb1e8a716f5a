//! Task domain model.
//!
//! # Responsibility
//! - Define the persisted unit of work tying one contact to one agent.
//! - Define the three-state task status lifecycle.
//!
//! # Invariants
//! - `id`, `agent_id`, `contact_name`, `contact_phone` and `created_at` never
//!   change after creation.
//! - `status` is always one of `pending`, `in-progress`, `completed`.

use crate::model::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a persisted task.
pub type TaskId = Uuid;

/// Task lifecycle state.
///
/// Any state may be set from any other state; agents correct mistakes by
/// moving a task back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Created by distribution, not started.
    #[default]
    Pending,
    /// Agent is working the contact.
    InProgress,
    /// Contact handled.
    Completed,
}

impl TaskStatus {
    /// Stable wire/storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Returns whether moving from `self` to `next` changes anything.
    pub fn is_noop_transition(self, next: TaskStatus) -> bool {
        self == next
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidTaskStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(InvalidTaskStatus(other.to_string())),
        }
    }
}

/// Rejected status value outside the three-state lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTaskStatus(pub String);

impl Display for InvalidTaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid task status `{}`; expected pending|in-progress|completed",
            self.0
        )
    }
}

impl Error for InvalidTaskStatus {}

/// Persisted task owned by exactly one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub contact_name: String,
    pub contact_phone: String,
    pub notes: String,
    pub agent_id: AgentId,
    pub status: TaskStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last status/notes write.
    pub updated_at: i64,
}

/// Partial update for the mutable task fields.
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub notes: Option<String>,
}

impl TaskUpdate {
    /// Update that only sets status.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            notes: None,
        }
    }

    /// Update that only sets notes.
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            status: None,
            notes: Some(notes.into()),
        }
    }

    /// Returns whether applying this update to `task` would change it.
    pub fn changes(&self, task: &Task) -> bool {
        let status_changes = self
            .status
            .is_some_and(|status| !task.status.is_noop_transition(status));
        let notes_change = self
            .notes
            .as_deref()
            .is_some_and(|notes| notes != task.notes);
        status_changes || notes_change
    }
}
