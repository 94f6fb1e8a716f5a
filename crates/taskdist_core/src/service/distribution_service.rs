//! Upload-to-tasks distribution use-case.
//!
//! # Responsibility
//! - Run parse, validate, roster load, partition and persist in order.
//! - Report what was actually persisted, including after a create failure.
//!
//! # Invariants
//! - Validation failures surface before the roster or repository is touched.
//! - An empty roster surfaces before any task is created.
//! - Tasks are created one by one in batch order; earlier creates are never
//!   rolled back and nothing is retried.

use crate::distribution::{partition, Assignment, PartitionError};
use crate::import::{collect_valid_contacts, parse_records, ImportError, RecordFormat};
use crate::model::agent::{Agent, AgentId};
use crate::repo::agent_repo::AgentRoster;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoError;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Outcome counts of one distribution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub total_tasks: usize,
    /// Persisted task count per agent; agents with no task are omitted.
    pub per_agent: BTreeMap<AgentId, usize>,
}

impl DistributionSummary {
    fn record(&mut self, agent_id: AgentId) {
        self.total_tasks += 1;
        *self.per_agent.entry(agent_id).or_insert(0) += 1;
    }
}

/// State left behind when a create fails.
///
/// A failure on the first create carries an empty summary and the whole
/// batch as `pending`.
#[derive(Debug)]
pub struct PartialDistribution {
    /// What was persisted before the failure.
    pub summary: DistributionSummary,
    /// Batch position of the failed create.
    pub failed_position: usize,
    /// Failed assignment followed by every assignment not attempted.
    pub pending: Vec<Assignment>,
    pub source: RepoError,
}

/// Distribution failures.
#[derive(Debug)]
pub enum DistributionError {
    UnsupportedFormat(String),
    MalformedInput(String),
    NoValidRecords,
    NoAgentsAvailable,
    PartialDistribution(Box<PartialDistribution>),
    /// Roster load failed; nothing was partitioned or persisted.
    Repo(RepoError),
}

impl DistributionError {
    /// Stable short code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::MalformedInput(_) => "malformed_input",
            Self::NoValidRecords => "no_valid_records",
            Self::NoAgentsAvailable => "no_agents_available",
            Self::PartialDistribution(_) => "partial_distribution",
            Self::Repo(_) => "repo_error",
        }
    }

    /// Summary of what was persisted before a create failure.
    pub fn persisted(&self) -> Option<&DistributionSummary> {
        match self {
            Self::PartialDistribution(partial) => Some(&partial.summary),
            _ => None,
        }
    }
}

impl Display for DistributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat(declared) => {
                write!(f, "unsupported upload format `{declared}`; expected csv or spreadsheet")
            }
            Self::MalformedInput(reason) => write!(f, "malformed upload: {reason}"),
            Self::NoValidRecords => write!(f, "no valid records found in upload"),
            Self::NoAgentsAvailable => write!(f, "no active agents available for distribution"),
            Self::PartialDistribution(partial) => write!(
                f,
                "distribution stopped at position {} after {} task(s) were created: {}",
                partial.failed_position, partial.summary.total_tasks, partial.source
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DistributionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PartialDistribution(partial) => Some(&partial.source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ImportError> for DistributionError {
    fn from(value: ImportError) -> Self {
        match value {
            ImportError::UnsupportedFormat(declared) => Self::UnsupportedFormat(declared),
            ImportError::MalformedInput(reason) => Self::MalformedInput(reason),
            ImportError::NoValidRecords => Self::NoValidRecords,
        }
    }
}

impl From<PartitionError> for DistributionError {
    fn from(value: PartitionError) -> Self {
        match value {
            PartitionError::NoAgentsAvailable => Self::NoAgentsAvailable,
        }
    }
}

impl From<RepoError> for DistributionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Distribution use-case over a task repository and a roster source.
pub struct DistributionService<T: TaskRepository, A: AgentRoster> {
    tasks: T,
    roster: A,
}

impl<T: TaskRepository, A: AgentRoster> DistributionService<T, A> {
    pub fn new(tasks: T, roster: A) -> Self {
        Self { tasks, roster }
    }

    /// Resolves `declared_format` (extension, file name or MIME type) and
    /// distributes `bytes`.
    ///
    /// # Errors
    /// - `DistributionError::UnsupportedFormat` before any decoding when the
    ///   declared format is unknown.
    /// - Everything `distribute` returns.
    pub fn distribute_upload(
        &self,
        bytes: &[u8],
        declared_format: &str,
    ) -> Result<DistributionSummary, DistributionError> {
        let format = RecordFormat::from_declared(declared_format).map_err(|err| {
            warn!(
                "event=distribute module=service status=error error_code=unsupported_format declared={declared_format}"
            );
            DistributionError::from(err)
        })?;
        self.distribute(bytes, format)
    }

    /// Distributes the contacts in `bytes` across the active roster.
    ///
    /// # Errors
    /// - `UnsupportedFormat` / `MalformedInput` from decoding, unchanged.
    /// - `NoValidRecords` when no row validates; nothing else was touched.
    /// - `NoAgentsAvailable` when the roster has no active agent; nothing
    ///   was created.
    /// - `PartialDistribution` when any create fails; carries the persisted
    ///   summary (empty if the first create failed) and the remaining batch.
    /// - `Repo` when the roster load fails.
    pub fn distribute(
        &self,
        bytes: &[u8],
        format: RecordFormat,
    ) -> Result<DistributionSummary, DistributionError> {
        let started_at = Instant::now();
        info!(
            "event=distribute module=service status=start format={} bytes={}",
            format.as_str(),
            bytes.len()
        );

        let result = self.run(bytes, format);
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(summary) => info!(
                "event=distribute module=service status=ok total_tasks={} agents={} duration_ms={duration_ms}",
                summary.total_tasks,
                summary.per_agent.len()
            ),
            Err(
                err @ (DistributionError::NoValidRecords
                | DistributionError::NoAgentsAvailable
                | DistributionError::MalformedInput(_)
                | DistributionError::UnsupportedFormat(_)),
            ) => warn!(
                "event=distribute module=service status=error error_code={} duration_ms={duration_ms}",
                err.code()
            ),
            Err(err) => error!(
                "event=distribute module=service status=error error_code={} persisted={} duration_ms={duration_ms} error={err}",
                err.code(),
                err.persisted().map_or(0, |summary| summary.total_tasks)
            ),
        }

        result
    }

    fn run(
        &self,
        bytes: &[u8],
        format: RecordFormat,
    ) -> Result<DistributionSummary, DistributionError> {
        let records = parse_records(bytes, format)?;
        let contacts = collect_valid_contacts(records)?;

        let agents: Vec<Agent> = self
            .roster
            .list_active_agents()?
            .into_iter()
            .filter(Agent::is_active)
            .collect();

        let batch = partition(contacts, &agents)?;
        info!(
            "event=distribute_plan module=service contacts={} agents={} planned_agents={}",
            batch.len(),
            agents.len(),
            batch.planned_per_agent.len()
        );

        self.persist(batch.assignments)
    }

    fn persist(
        &self,
        mut assignments: Vec<Assignment>,
    ) -> Result<DistributionSummary, DistributionError> {
        let mut summary = DistributionSummary::default();

        for position in 0..assignments.len() {
            let assignment = &assignments[position];
            match self
                .tasks
                .create_task(&assignment.contact, assignment.agent_id)
            {
                Ok(task) => summary.record(task.agent_id),
                Err(source) => {
                    let pending = assignments.split_off(position);
                    return Err(DistributionError::PartialDistribution(Box::new(
                        PartialDistribution {
                            summary,
                            failed_position: position,
                            pending,
                            source,
                        },
                    )));
                }
            }
        }

        Ok(summary)
    }
}
