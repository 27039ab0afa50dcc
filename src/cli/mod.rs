//! CLI module for Conductor
//!
//! Provides the user-facing commands:
//! - `delegate`: submit a task to an agent and print the result
//! - `agents`: list agent profiles visible from the current directory
//! - `worker`: subprocess protocol endpoint (internal, hidden)

use clap::{Parser, Subcommand};

pub mod agents;
pub mod delegate;
pub mod worker;

/// Conductor CLI
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(about = "Multi-Agent Delegation Orchestrator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delegate a task to an agent
    Delegate(delegate::DelegateArgs),
    /// List agent profiles and their tiers
    Agents,
    /// Execute one delegation read from stdin (spawned by the dispatcher)
    #[command(hide = true)]
    Worker,
}

/// Run the CLI command, returning the process exit code
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Some(Commands::Delegate(args)) => delegate::run(args).await,
        Some(Commands::Agents) => agents::run().map(|()| 0),
        Some(Commands::Worker) => worker::run().await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(0)
        }
    }
}
