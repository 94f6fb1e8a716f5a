//! Roster administration use-cases.
//!
//! # Responsibility
//! - Register agents and edit their profile and roster status.
//! - Restrict every roster operation to administrators.
//!
//! # Invariants
//! - Names and emails are trimmed and must not be blank.
//! - Agents are never deleted; deactivation removes them from future
//!   distributions while existing tasks keep their owner.

use crate::model::agent::{Agent, AgentId, AgentProfileUpdate, AgentStatus, NewAgent};
use crate::model::caller::CallerIdentity;
use crate::repo::agent_repo::AgentRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from roster administration.
#[derive(Debug)]
pub enum AgentServiceError {
    NotAuthorized { caller: Uuid, action: &'static str },
    InvalidName,
    InvalidEmail(String),
    NotFound(AgentId),
    DuplicateEmail(String),
    Repo(RepoError),
}

impl Display for AgentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized { caller, action } => {
                write!(f, "caller {caller} is not authorized to {action}")
            }
            Self::InvalidName => write!(f, "agent name must not be blank"),
            Self::InvalidEmail(email) => write!(f, "invalid agent email `{email}`"),
            Self::NotFound(id) => write!(f, "agent not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "agent email already registered: {email}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AgentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AgentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::AgentNotFound(id) => Self::NotFound(id),
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            other => Self::Repo(other),
        }
    }
}

/// Admin-only roster facade.
pub struct AgentService<R: AgentRepository, I: CallerIdentity> {
    repo: R,
    identity: I,
}

impl<R: AgentRepository, I: CallerIdentity> AgentService<R, I> {
    pub fn new(repo: R, identity: I) -> Self {
        Self { repo, identity }
    }

    /// Registers a new active agent.
    pub fn register_agent(&self, agent: NewAgent) -> Result<Agent, AgentServiceError> {
        self.require_admin("register_agent")?;
        let normalized = NewAgent {
            name: normalize_name(&agent.name)?,
            email: normalize_email(&agent.email)?,
            mobile: normalize_optional(agent.mobile),
        };
        let created = self.repo.create_agent(&normalized)?;
        info!(
            "event=agent_register module=service status=ok agent_id={}",
            created.id
        );
        Ok(created)
    }

    /// Lists every agent, most recently registered first.
    pub fn list_agents(&self) -> Result<Vec<Agent>, AgentServiceError> {
        self.require_admin("list_agents")?;
        Ok(self.repo.list_agents()?)
    }

    /// Active agents in the order distribution will use them.
    pub fn roster(&self) -> Result<Vec<Agent>, AgentServiceError> {
        self.require_admin("list_roster")?;
        Ok(self.repo.list_active_agents()?)
    }

    pub fn get_agent(&self, id: AgentId) -> Result<Agent, AgentServiceError> {
        self.require_admin("read_agent")?;
        self.repo.get_agent(id)?.ok_or(AgentServiceError::NotFound(id))
    }

    /// Updates name, email and/or mobile.
    pub fn update_agent(
        &self,
        id: AgentId,
        update: AgentProfileUpdate,
    ) -> Result<Agent, AgentServiceError> {
        self.require_admin("update_agent")?;
        let normalized = AgentProfileUpdate {
            name: update.name.as_deref().map(normalize_name).transpose()?,
            email: update.email.as_deref().map(normalize_email).transpose()?,
            mobile: normalize_optional(update.mobile),
        };
        Ok(self.repo.update_agent_profile(id, &normalized)?)
    }

    /// Puts the agent back into future distributions.
    pub fn activate_agent(&self, id: AgentId) -> Result<Agent, AgentServiceError> {
        self.change_status(id, AgentStatus::Active, "activate_agent")
    }

    /// Removes the agent from future distributions.
    pub fn deactivate_agent(&self, id: AgentId) -> Result<Agent, AgentServiceError> {
        self.change_status(id, AgentStatus::Inactive, "deactivate_agent")
    }

    fn change_status(
        &self,
        id: AgentId,
        status: AgentStatus,
        action: &'static str,
    ) -> Result<Agent, AgentServiceError> {
        self.require_admin(action)?;
        let agent = self.repo.set_agent_status(id, status)?;
        info!(
            "event=agent_status module=service status=ok agent_id={id} roster_status={}",
            status.as_str()
        );
        Ok(agent)
    }

    fn require_admin(&self, action: &'static str) -> Result<(), AgentServiceError> {
        let caller = self.identity.current_caller();
        if caller.is_admin() {
            return Ok(());
        }
        warn!(
            "event=access_denied module=service action={action} caller={}",
            caller.id
        );
        Err(AgentServiceError::NotAuthorized {
            caller: caller.id,
            action,
        })
    }
}

fn normalize_name(name: &str) -> Result<String, AgentServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AgentServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}

fn normalize_email(email: &str) -> Result<String, AgentServiceError> {
    let trimmed = email.trim();
    let well_formed = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed || trimmed.chars().any(char::is_whitespace) {
        return Err(AgentServiceError::InvalidEmail(email.to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
