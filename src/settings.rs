//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use anyhow::{Context, Result};
use conductor_core::delegation::OrchestrationMode;
use conductor_core::dispatcher::DispatcherConfig;
use conductor_core::subprocess::WorkerCommand;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Orchestration settings
    pub orchestration: OrchestrationSettings,
    /// Agent profile settings
    #[serde(default)]
    pub profiles: ProfileSettings,
}

/// Settings for agent profile resolution
#[derive(Debug, Default, Deserialize)]
pub struct ProfileSettings {
    /// System-tier profile directory; defaults to `agents/` next to the binary
    pub system_agents_dir: Option<std::path::PathBuf>,
}

/// Settings controlling mode selection and worker execution
#[derive(Debug, Deserialize)]
pub struct OrchestrationSettings {
    /// Skip marker detection and always use this mode
    pub force_mode: Option<String>,
    /// Timeout applied when a request carries no override
    pub default_timeout_secs: u64,
    /// Worker program; defaults to re-invoking the current executable
    pub worker_program: Option<String>,
    /// Extra arguments for the worker program
    #[serde(default)]
    pub worker_args: Vec<String>,
}

impl AppConfig {
    /// Translate the file/env settings into a dispatcher configuration
    pub fn dispatcher_config(&self) -> Result<DispatcherConfig> {
        let force_mode = self
            .orchestration
            .force_mode
            .as_deref()
            .map(str::parse::<OrchestrationMode>)
            .transpose()
            .context("invalid orchestration.force_mode")?;

        let worker = match &self.orchestration.worker_program {
            Some(program) => {
                WorkerCommand::new(program).with_args(self.orchestration.worker_args.clone())
            }
            None => WorkerCommand::current_exe_worker(),
        }
        .with_timeout(self.orchestration.default_timeout_secs);

        Ok(DispatcherConfig {
            force_mode,
            default_timeout_secs: self.orchestration.default_timeout_secs,
            worker,
        })
    }
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") ensures CONDUCTOR_ORCHESTRATION__X works
        // (single _ after the prefix, __ between nesting levels).
        .add_source(
            Environment::with_prefix("CONDUCTOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
