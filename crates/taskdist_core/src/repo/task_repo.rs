//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist distributed tasks and their status/notes updates.
//! - Provide per-agent listings and the per-agent aggregate report.
//!
//! # Invariants
//! - `id`, `agent_id`, contact fields and `created_at` are written once by
//!   `create_task` and never by any other statement.
//! - Listings are most-recent-first; same-millisecond rows fall back to
//!   reverse insertion order.

use super::{
    ensure_connection_ready, is_constraint_violation, now_epoch_ms, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::agent::{AgentId, AgentSnapshot};
use crate::model::contact::ValidatedContact;
use crate::model::task::{Task, TaskId, TaskStatus, TaskUpdate};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use uuid::Uuid;

const TASK_COLUMNS_SQL: &str = "
    tasks.id AS id,
    tasks.contact_name AS contact_name,
    tasks.contact_phone AS contact_phone,
    tasks.notes AS notes,
    tasks.agent_id AS agent_id,
    tasks.status AS status,
    tasks.created_at AS created_at,
    tasks.updated_at AS updated_at";

const MOST_RECENT_FIRST: &str = "ORDER BY tasks.created_at DESC, tasks.rowid DESC";

/// Tasks of one agent with the agent's public fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTaskGroup {
    pub agent: AgentSnapshot,
    pub count: usize,
    /// Most-recent-first.
    pub tasks: Vec<Task>,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    /// Persists one new `pending` task owned by `agent_id`.
    fn create_task(&self, contact: &ValidatedContact, agent_id: AgentId) -> RepoResult<Task>;
    /// Gets one task by id.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists tasks owned by `agent_id`, most recent first.
    fn list_tasks_by_agent(&self, agent_id: AgentId) -> RepoResult<Vec<Task>>;
    /// Applies a partial status/notes update and returns the stored task.
    fn update_status_and_notes(&self, id: TaskId, update: &TaskUpdate) -> RepoResult<Task>;
    /// Groups all tasks by owning agent.
    fn aggregate_by_agent(&self) -> RepoResult<BTreeMap<AgentId, AgentTaskGroup>>;
}

impl<T: TaskRepository + ?Sized> TaskRepository for &T {
    fn create_task(&self, contact: &ValidatedContact, agent_id: AgentId) -> RepoResult<Task> {
        (**self).create_task(contact, agent_id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        (**self).get_task(id)
    }

    fn list_tasks_by_agent(&self, agent_id: AgentId) -> RepoResult<Vec<Task>> {
        (**self).list_tasks_by_agent(agent_id)
    }

    fn update_status_and_notes(&self, id: TaskId, update: &TaskUpdate) -> RepoResult<Task> {
        (**self).update_status_and_notes(id, update)
    }

    fn aggregate_by_agent(&self) -> RepoResult<BTreeMap<AgentId, AgentTaskGroup>> {
        (**self).aggregate_by_agent()
    }
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "tasks")?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, contact: &ValidatedContact, agent_id: AgentId) -> RepoResult<Task> {
        if contact.name.is_empty() || contact.phone.is_empty() {
            return Err(RepoError::InvalidData(
                "task contact name and phone must not be empty".to_string(),
            ));
        }

        let now = now_epoch_ms();
        let task = Task {
            id: Uuid::new_v4(),
            contact_name: contact.name.clone(),
            contact_phone: contact.phone.clone(),
            notes: contact.notes.clone(),
            agent_id,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.conn
            .execute(
                "INSERT INTO tasks (
                    id,
                    contact_name,
                    contact_phone,
                    notes,
                    agent_id,
                    status,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    task.id.to_string(),
                    task.contact_name.as_str(),
                    task.contact_phone.as_str(),
                    task.notes.as_str(),
                    task.agent_id.to_string(),
                    task.status.as_str(),
                    task.created_at,
                    task.updated_at,
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    RepoError::UnknownAgent(agent_id)
                } else {
                    err.into()
                }
            })?;

        Ok(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS_SQL} FROM tasks WHERE tasks.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks_by_agent(&self, agent_id: AgentId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS_SQL} FROM tasks WHERE tasks.agent_id = ?1 {MOST_RECENT_FIRST};"
        ))?;
        let mut rows = stmt.query([agent_id.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_status_and_notes(&self, id: TaskId, update: &TaskUpdate) -> RepoResult<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                status = COALESCE(?2, status),
                notes = COALESCE(?3, notes),
                updated_at = ?4
             WHERE id = ?1;",
            params![
                id.to_string(),
                update.status.map(TaskStatus::as_str),
                update.notes.as_deref(),
                now_epoch_ms(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        self.get_task(id)?.ok_or(RepoError::TaskNotFound(id))
    }

    fn aggregate_by_agent(&self) -> RepoResult<BTreeMap<AgentId, AgentTaskGroup>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS_SQL},
                agents.name AS agent_name,
                agents.email AS agent_email
             FROM tasks
             INNER JOIN agents ON agents.id = tasks.agent_id
             {MOST_RECENT_FIRST};"
        ))?;

        let mut groups: BTreeMap<AgentId, AgentTaskGroup> = BTreeMap::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            let group = match groups.entry(task.agent_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(AgentTaskGroup {
                    agent: AgentSnapshot {
                        id: task.agent_id,
                        name: row.get("agent_name")?,
                        email: row.get("agent_email")?,
                    },
                    count: 0,
                    tasks: Vec::new(),
                }),
            };
            group.count += 1;
            group.tasks.push(task);
        }

        Ok(groups)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let agent_text: String = row.get("agent_id")?;
    let status_text: String = row.get("status")?;
    let status = status_text.parse::<TaskStatus>().map_err(|_| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    Ok(Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        contact_name: row.get("contact_name")?,
        contact_phone: row.get("contact_phone")?,
        notes: row.get("notes")?,
        agent_id: parse_uuid(&agent_text, "tasks.agent_id")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
