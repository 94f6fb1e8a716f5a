//! Operator CLI over `taskdist_core`.
//!
//! # Responsibility
//! - Resolve database, logging and caller settings from flags and env.
//! - Map each subcommand onto one core service call and print JSON.

mod commands;

use anyhow::{bail, Context, Result};
use clap::Parser;
use commands::{AgentCommand, Cli, Command};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use taskdist_core::db::open_db;
use taskdist_core::{
    AgentProfileUpdate, AgentService, Caller, DistributionService, NewAgent,
    SqliteAgentRepository, SqliteTaskRepository, TaskAccessService, TaskUpdate,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ping => {
            println!("taskdist_core ping={}", taskdist_core::ping());
            return Ok(());
        }
        Command::Version => {
            println!("taskdist_core version={}", taskdist_core::core_version());
            return Ok(());
        }
        _ => {}
    }

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| taskdist_core::default_log_level().to_string());
    let log_dir = match &cli.log_dir {
        Some(dir) => absolute(dir.clone())?,
        None => absolute(PathBuf::from("logs"))?,
    };
    taskdist_core::init_logging(&level, &log_dir).context("failed to initialize logging")?;

    let caller = cli.identity.caller()?;
    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    info!(
        "event=cli_command module=cli status=start admin={}",
        caller.is_admin()
    );

    match cli.command {
        Command::Agent(command) => {
            let service = AgentService::new(SqliteAgentRepository::try_new(&conn)?, caller);
            run_agent_command(&service, command)
        }
        Command::Upload { file, format } => {
            if !caller.is_admin() {
                bail!("only administrators can upload contact lists");
            }
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let declared = format.unwrap_or_else(|| file.display().to_string());

            let service = DistributionService::new(
                SqliteTaskRepository::try_new(&conn)?,
                SqliteAgentRepository::try_new(&conn)?,
            );
            match service.distribute_upload(&bytes, &declared) {
                Ok(summary) => print_json(&summary),
                Err(err) => {
                    if let Some(persisted) = err.persisted() {
                        eprintln!("persisted before failure:");
                        print_json(persisted)?;
                    }
                    Err(err.into())
                }
            }
        }
        Command::Tasks { agent_id } => {
            let service = TaskAccessService::new(SqliteTaskRepository::try_new(&conn)?, caller);
            print_json(&service.tasks_for_agent(agent_id)?)
        }
        Command::UpdateTask {
            task_id,
            status,
            notes,
        } => {
            if status.is_none() && notes.is_none() {
                bail!("nothing to update; pass --status and/or --notes");
            }
            let service = TaskAccessService::new(SqliteTaskRepository::try_new(&conn)?, caller);
            print_json(&service.update_task(task_id, TaskUpdate { status, notes })?)
        }
        Command::Distribution => {
            let service = TaskAccessService::new(SqliteTaskRepository::try_new(&conn)?, caller);
            let groups: Vec<_> = service.distribution_overview()?.into_values().collect();
            print_json(&groups)
        }
        Command::Ping | Command::Version => Ok(()),
    }
}

fn run_agent_command(
    service: &AgentService<SqliteAgentRepository<'_>, Caller>,
    command: AgentCommand,
) -> Result<()> {
    match command {
        AgentCommand::Add {
            name,
            email,
            mobile,
        } => print_json(&service.register_agent(NewAgent {
            name,
            email,
            mobile,
        })?),
        AgentCommand::List => print_json(&service.list_agents()?),
        AgentCommand::Update {
            id,
            name,
            email,
            mobile,
        } => print_json(&service.update_agent(
            id,
            AgentProfileUpdate {
                name,
                email,
                mobile,
            },
        )?),
        AgentCommand::Activate { id } => print_json(&service.activate_agent(id)?),
        AgentCommand::Deactivate { id } => print_json(&service.deactivate_agent(id)?),
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
