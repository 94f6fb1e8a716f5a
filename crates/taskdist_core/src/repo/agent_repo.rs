//! Agent roster contracts and SQLite implementation.
//!
//! # Responsibility
//! - Expose the ordered active roster consumed by distribution.
//! - Persist roster entries and their profile/status changes.
//!
//! # Invariants
//! - Roster order is registration order (`created_at`, then insertion).
//! - `email` is unique; collisions surface as `RepoError::DuplicateEmail`.

use super::{
    ensure_connection_ready, is_constraint_violation, now_epoch_ms, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::agent::{Agent, AgentId, AgentProfileUpdate, AgentStatus, NewAgent};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const AGENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    mobile,
    status,
    created_at
FROM agents";

/// Roster source used by distribution.
pub trait AgentRoster {
    /// Lists active agents in roster order.
    fn list_active_agents(&self) -> RepoResult<Vec<Agent>>;
}

impl<T: AgentRoster + ?Sized> AgentRoster for &T {
    fn list_active_agents(&self) -> RepoResult<Vec<Agent>> {
        (**self).list_active_agents()
    }
}

/// Repository interface for roster administration.
pub trait AgentRepository: AgentRoster {
    fn create_agent(&self, agent: &NewAgent) -> RepoResult<Agent>;
    fn get_agent(&self, id: AgentId) -> RepoResult<Option<Agent>>;
    /// Lists every agent, most recently registered first.
    fn list_agents(&self) -> RepoResult<Vec<Agent>>;
    fn update_agent_profile(&self, id: AgentId, update: &AgentProfileUpdate)
        -> RepoResult<Agent>;
    fn set_agent_status(&self, id: AgentId, status: AgentStatus) -> RepoResult<Agent>;
}

/// SQLite-backed agent roster.
pub struct SqliteAgentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAgentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "agents")?;
        Ok(Self { conn })
    }

    fn query_agents(&self, sql: &str, status: Option<AgentStatus>) -> RepoResult<Vec<Agent>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match status {
            Some(status) => stmt.query([status.as_str()])?,
            None => stmt.query([])?,
        };
        let mut agents = Vec::new();
        while let Some(row) = rows.next()? {
            agents.push(parse_agent_row(row)?);
        }
        Ok(agents)
    }

    fn load_required(&self, id: AgentId) -> RepoResult<Agent> {
        self.get_agent(id)?.ok_or(RepoError::AgentNotFound(id))
    }
}

impl AgentRoster for SqliteAgentRepository<'_> {
    fn list_active_agents(&self) -> RepoResult<Vec<Agent>> {
        self.query_agents(
            &format!("{AGENT_SELECT_SQL} WHERE status = ?1 ORDER BY created_at ASC, rowid ASC;"),
            Some(AgentStatus::Active),
        )
    }
}

impl AgentRepository for SqliteAgentRepository<'_> {
    fn create_agent(&self, agent: &NewAgent) -> RepoResult<Agent> {
        let now = now_epoch_ms();
        let created = Agent {
            id: Uuid::new_v4(),
            name: agent.name.clone(),
            email: agent.email.clone(),
            mobile: agent.mobile.clone(),
            status: AgentStatus::Active,
            created_at: now,
        };

        self.conn
            .execute(
                "INSERT INTO agents (id, name, email, mobile, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
                params![
                    created.id.to_string(),
                    created.name.as_str(),
                    created.email.as_str(),
                    created.mobile.as_deref(),
                    created.status.as_str(),
                    created.created_at,
                ],
            )
            .map_err(|err| map_email_conflict(err, &created.email))?;

        Ok(created)
    }

    fn get_agent(&self, id: AgentId) -> RepoResult<Option<Agent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AGENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_agent_row(row)?));
        }
        Ok(None)
    }

    fn list_agents(&self) -> RepoResult<Vec<Agent>> {
        self.query_agents(
            &format!("{AGENT_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"),
            None,
        )
    }

    fn update_agent_profile(
        &self,
        id: AgentId,
        update: &AgentProfileUpdate,
    ) -> RepoResult<Agent> {
        let changed = self
            .conn
            .execute(
                "UPDATE agents
                 SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    mobile = COALESCE(?4, mobile),
                    updated_at = ?5
                 WHERE id = ?1;",
                params![
                    id.to_string(),
                    update.name.as_deref(),
                    update.email.as_deref(),
                    update.mobile.as_deref(),
                    now_epoch_ms(),
                ],
            )
            .map_err(|err| map_email_conflict(err, update.email.as_deref().unwrap_or_default()))?;

        if changed == 0 {
            return Err(RepoError::AgentNotFound(id));
        }
        self.load_required(id)
    }

    fn set_agent_status(&self, id: AgentId, status: AgentStatus) -> RepoResult<Agent> {
        let changed = self.conn.execute(
            "UPDATE agents SET status = ?2, updated_at = ?3 WHERE id = ?1;",
            params![id.to_string(), status.as_str(), now_epoch_ms()],
        )?;

        if changed == 0 {
            return Err(RepoError::AgentNotFound(id));
        }
        self.load_required(id)
    }
}

fn map_email_conflict(err: rusqlite::Error, email: &str) -> RepoError {
    if is_constraint_violation(&err) {
        RepoError::DuplicateEmail(email.to_string())
    } else {
        err.into()
    }
}

fn parse_agent_row(row: &Row<'_>) -> RepoResult<Agent> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = AgentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid agent status `{status_text}` in agents.status"))
    })?;

    Ok(Agent {
        id: parse_uuid(&id_text, "agents.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        mobile: row.get("mobile")?,
        status,
        created_at: row.get("created_at")?,
    })
}
