//! `conductor delegate` command

use anyhow::{Context, Result};
use clap::Args;
use conductor_core::delegation::{DelegationRequest, OrchestrationMode, Priority, TaskContext};
use conductor_core::dispatcher::build_dispatcher;
use std::path::PathBuf;

/// Arguments for `conductor delegate`
#[derive(Args, Debug)]
pub struct DelegateArgs {
    /// Agent type to delegate to (must resolve to a profile)
    pub agent_type: String,

    /// What the agent should do
    pub task: String,

    /// Force the execution mode instead of detecting it
    #[arg(long, value_name = "MODE")]
    pub mode: Option<OrchestrationMode>,

    /// Requirement for the task (repeatable)
    #[arg(long = "requirement", value_name = "TEXT")]
    pub requirements: Vec<String>,

    /// Expected deliverable (repeatable)
    #[arg(long = "deliverable", value_name = "TEXT")]
    pub deliverables: Vec<String>,

    /// Task priority: low, medium, high, or critical
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// Timeout override in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// JSON file with shared context passed to the agent
    #[arg(long, value_name = "PATH")]
    pub context_file: Option<PathBuf>,

    /// Notes for cross-agent integration
    #[arg(long, value_name = "TEXT")]
    pub integration_notes: Option<String>,

    /// Print aggregate metrics after the delegation
    #[arg(long)]
    pub show_metrics: bool,
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => Err(format!(
            "unknown priority '{other}' (expected low, medium, high, or critical)"
        )),
    }
}

/// Run the delegation and print the result as JSON.
///
/// Exit code 0 when the delegation completed, 1 otherwise.
pub async fn run(args: DelegateArgs) -> Result<i32> {
    let settings = crate::settings::load_config()?;
    let mut config = settings.dispatcher_config()?;
    if args.mode.is_some() {
        config.force_mode = args.mode;
    }

    let working_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let dispatcher = build_dispatcher(&working_dir, settings.profiles.system_agents_dir, config);

    let mut request = DelegationRequest::new(&args.agent_type, &args.task)
        .with_requirements(args.requirements)
        .with_deliverables(args.deliverables);
    if let Some(priority) = args.priority {
        request = request.with_priority(priority);
    }
    if let Some(secs) = args.timeout {
        request = request.with_timeout(secs);
    }
    if let Some(notes) = args.integration_notes {
        request = request.with_integration_notes(notes);
    }
    if let Some(path) = &args.context_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read context file {}", path.display()))?;
        let context: TaskContext = serde_json::from_str(&text)
            .with_context(|| format!("context file {} is not a JSON object", path.display()))?;
        request = request.with_context(context);
    }

    let result = dispatcher.delegate(request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.show_metrics {
        let summary = dispatcher.summary();
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(if result.is_success() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority("high").unwrap(), Priority::High);
        assert_eq!(parse_priority("CRITICAL").unwrap(), Priority::Critical);
        assert!(parse_priority("urgent").is_err());
    }
}
