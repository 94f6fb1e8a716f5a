//! CLI command definitions

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use taskdist_core::{Caller, TaskStatus};
use uuid::Uuid;

/// CLI arguments for taskdist
#[derive(Parser, Debug)]
#[command(name = "taskdist")]
#[command(author, version, about = "Distribute uploaded contact lists across an agent roster")]
#[command(long_about = r#"
taskdist turns an uploaded contact list (CSV or spreadsheet) into tasks,
split in contiguous blocks across the active agents, and lets agents and
administrators follow up on them.

The caller is declared per invocation with --admin or --agent <AGENT_ID>.

Example:
  taskdist --admin agent add "Ana Lee" ana@example.com
  taskdist --admin upload leads.xlsx
  taskdist --agent 6f1c... tasks 6f1c...
  taskdist --agent 6f1c... update-task 9a2b... --status completed
"#)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "TASKDIST_DB", default_value = "taskdist.sqlite3", global = true)]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "TASKDIST_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files (defaults to ./logs)
    #[arg(long, env = "TASKDIST_LOG_DIR", value_name = "PATH", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(flatten)]
    pub identity: IdentityArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Caller declaration standing in for an auth layer.
#[derive(Args, Debug)]
pub struct IdentityArgs {
    /// Act as an administrator
    #[arg(long, global = true, conflicts_with = "agent")]
    pub admin: bool,

    /// Act as the agent with this id
    #[arg(long, value_name = "AGENT_ID", env = "TASKDIST_AGENT", global = true)]
    pub agent: Option<Uuid>,
}

impl IdentityArgs {
    pub fn caller(&self) -> Result<Caller> {
        match (self.admin, self.agent) {
            (true, _) => Ok(Caller::admin(Uuid::nil())),
            (false, Some(id)) => Ok(Caller::agent(id)),
            (false, None) => bail!("declare the caller with --admin or --agent <AGENT_ID>"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Roster administration (admin only)
    #[command(subcommand)]
    Agent(AgentCommand),

    /// Distribute a contact file across active agents (admin only)
    Upload {
        file: PathBuf,

        /// Declared format: extension, file name or MIME type (defaults to the file name)
        #[arg(long)]
        format: Option<String>,
    },

    /// List an agent's tasks, most recent first
    Tasks {
        agent_id: Uuid,
    },

    /// Update a task's status and/or notes
    UpdateTask {
        task_id: Uuid,

        /// pending | in-progress | completed
        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Tasks grouped by agent (admin only)
    Distribution,

    /// Check core linkage
    Ping,

    /// Print the core version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommand {
    /// Register a new active agent
    Add {
        name: String,
        email: String,
        #[arg(long)]
        mobile: Option<String>,
    },

    /// List all agents, most recently registered first
    List,

    /// Edit an agent's profile
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
    },

    /// Include the agent in future distributions
    Activate { id: Uuid },

    /// Exclude the agent from future distributions
    Deactivate { id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::{AgentCommand, Cli, Command, IdentityArgs};
    use clap::{CommandFactory, Parser};
    use taskdist_core::TaskStatus;
    use uuid::Uuid;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_task_parses_kebab_case_status() {
        let task_id = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "taskdist",
            "--admin",
            "update-task",
            &task_id.to_string(),
            "--status",
            "in-progress",
        ])
        .unwrap();

        match cli.command {
            Command::UpdateTask { task_id: id, status, notes } => {
                assert_eq!(id, task_id);
                assert_eq!(status, Some(TaskStatus::InProgress));
                assert_eq!(notes, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.identity.caller().unwrap().is_admin());
    }

    #[test]
    fn unknown_status_is_rejected_by_parser() {
        let result = Cli::try_parse_from([
            "taskdist",
            "--admin",
            "update-task",
            &Uuid::new_v4().to_string(),
            "--status",
            "done",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn admin_and_agent_flags_conflict() {
        let result = Cli::try_parse_from([
            "taskdist",
            "--admin",
            "--agent",
            &Uuid::new_v4().to_string(),
            "ping",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn caller_requires_a_declared_identity() {
        let agent_id = Uuid::new_v4();
        let anonymous = IdentityArgs {
            admin: false,
            agent: None,
        };
        assert!(anonymous.caller().is_err());

        let agent = IdentityArgs {
            admin: false,
            agent: Some(agent_id),
        };
        let caller = agent.caller().unwrap();
        assert_eq!(caller.id, agent_id);
        assert!(!caller.is_admin());
    }

    #[test]
    fn agent_subcommands_parse() {
        let cli = Cli::try_parse_from([
            "taskdist",
            "--admin",
            "agent",
            "add",
            "Ana Lee",
            "ana@example.com",
            "--mobile",
            "555-0100",
        ])
        .unwrap();
        match cli.command {
            Command::Agent(AgentCommand::Add { name, email, mobile }) => {
                assert_eq!(name, "Ana Lee");
                assert_eq!(email, "ana@example.com");
                assert_eq!(mobile.as_deref(), Some("555-0100"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
