//! Owner-or-admin gate over task reads and updates.
//!
//! # Responsibility
//! - Authorize every task read and mutation against the current caller.
//! - Apply status/notes updates through the repository.
//!
//! # Invariants
//! - Only the owning agent or an administrator can read or update a task.
//! - Any of the three statuses may be set from any status.
//! - An update that changes nothing is not written.

use crate::model::agent::AgentId;
use crate::model::caller::{Caller, CallerIdentity};
use crate::model::task::{Task, TaskId, TaskUpdate};
use crate::repo::task_repo::{AgentTaskGroup, TaskRepository};
use crate::repo::RepoError;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from guarded task operations.
#[derive(Debug)]
pub enum AccessError {
    /// Caller is neither the owner nor an administrator.
    NotAuthorized { caller: Uuid, action: &'static str },
    NotFound(TaskId),
    Repo(RepoError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized { caller, action } => {
                write!(f, "caller {caller} is not authorized to {action}")
            }
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Guarded task surface for agents and administrators.
pub struct TaskAccessService<R: TaskRepository, I: CallerIdentity> {
    repo: R,
    identity: I,
}

impl<R: TaskRepository, I: CallerIdentity> TaskAccessService<R, I> {
    pub fn new(repo: R, identity: I) -> Self {
        Self { repo, identity }
    }

    /// Lists tasks owned by `agent_id`, most recent first.
    pub fn tasks_for_agent(&self, agent_id: AgentId) -> Result<Vec<Task>, AccessError> {
        let caller = self.identity.current_caller();
        authorize(&caller, agent_id, "list_tasks")?;
        Ok(self.repo.list_tasks_by_agent(agent_id)?)
    }

    /// Reads one task.
    pub fn get_task(&self, id: TaskId) -> Result<Task, AccessError> {
        let caller = self.identity.current_caller();
        let task = self.repo.get_task(id)?.ok_or(AccessError::NotFound(id))?;
        authorize(&caller, task.agent_id, "read_task")?;
        Ok(task)
    }

    /// Applies a status and/or notes update.
    ///
    /// # Errors
    /// - `NotFound` when the task does not exist.
    /// - `NotAuthorized` when the caller is another agent.
    pub fn update_task(&self, id: TaskId, update: TaskUpdate) -> Result<Task, AccessError> {
        let caller = self.identity.current_caller();
        let task = self.repo.get_task(id)?.ok_or(AccessError::NotFound(id))?;
        authorize(&caller, task.agent_id, "update_task")?;

        if !update.changes(&task) {
            debug!("event=task_update module=service status=noop task_id={id}");
            return Ok(task);
        }

        let updated = self.repo.update_status_and_notes(id, &update)?;
        info!(
            "event=task_update module=service status=ok task_id={id} caller={} from_status={} to_status={} notes_changed={}",
            caller.id,
            task.status,
            updated.status,
            task.notes != updated.notes
        );
        Ok(updated)
    }

    /// Aggregated tasks per agent; administrators only.
    pub fn distribution_overview(
        &self,
    ) -> Result<BTreeMap<AgentId, AgentTaskGroup>, AccessError> {
        let caller = self.identity.current_caller();
        if !caller.is_admin() {
            return Err(denied(&caller, "view_distribution"));
        }
        Ok(self.repo.aggregate_by_agent()?)
    }
}

fn authorize(caller: &Caller, owner: AgentId, action: &'static str) -> Result<(), AccessError> {
    if caller.may_act_for(owner) {
        return Ok(());
    }
    Err(denied(caller, action))
}

fn denied(caller: &Caller, action: &'static str) -> AccessError {
    warn!(
        "event=access_denied module=service action={action} caller={}",
        caller.id
    );
    AccessError::NotAuthorized {
        caller: caller.id,
        action,
    }
}
