//! Subprocess execution backend
//!
//! One isolated OS process per delegation, no shared memory: the parent
//! writes the serialized `DelegationRequest` to the child's stdin and reads a
//! serialized `DelegationResult` back from its stdout. The child process
//! handle is owned exclusively by the executor until completion; on timeout
//! the child is killed and the handle released (`kill_on_drop`).

use crate::delegation::{DelegationRequest, DelegationResult};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

fn default_timeout_secs() -> u64 {
    300
}

/// Command used to launch the worker child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerCommand {
    /// Program to execute
    pub program: String,
    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
    /// Timeout applied when the request carries no override
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl WorkerCommand {
    /// Create a command with no arguments
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the argument list
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set the default timeout
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The running executable re-invoked with the `worker` subcommand.
    ///
    /// Falls back to a `conductor` lookup on PATH when the current
    /// executable path cannot be determined.
    #[must_use]
    pub fn current_exe_worker() -> Self {
        let program = std::env::current_exe()
            .ok()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| "conductor".to_string());
        Self::new(program).with_args(vec!["worker".to_string()])
    }
}

impl Default for WorkerCommand {
    fn default() -> Self {
        Self::current_exe_worker()
    }
}

/// Executes delegations in isolated worker subprocesses.
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    command: WorkerCommand,
}

impl SubprocessExecutor {
    /// Create an executor with the given worker command
    #[must_use]
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    /// The configured worker command
    #[must_use]
    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// Run one delegation in a fresh worker process.
    ///
    /// # Errors
    /// - `Error::Spawn` when the worker cannot be launched or exits
    ///   abnormally without producing a result
    /// - `Error::Serialization` when the worker's stdout is not a valid
    ///   `DelegationResult`
    /// - `Error::Timeout` when the worker outlives its deadline (the child
    ///   is killed)
    pub async fn execute(&self, request: &DelegationRequest) -> Result<DelegationResult> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| Error::Serialization(format!("failed to encode request: {e}")))?;

        debug!(
            program = %self.command.program,
            request_id = %request.request_id,
            "spawning worker subprocess"
        );

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Spawn(format!("{}: {e}", self.command.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Internal("worker stdin not captured".to_string()))?;
        stdin
            .write_all(&payload)
            .await
            .map_err(|e| Error::Spawn(format!("failed to write request to worker: {e}")))?;
        // Close stdin so the worker sees EOF and starts executing.
        drop(stdin);

        let timeout_secs = request.timeout_secs.unwrap_or(self.command.timeout_secs);
        // Dropping the in-flight future on timeout drops the child, which
        // kills it via kill_on_drop and releases the handle.
        let output = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            warn!(request_id = %request.request_id, timeout_secs, "worker subprocess timed out");
            Error::Timeout(timeout_secs)
        })?
        .map_err(|e| Error::Spawn(format!("failed to collect worker output: {e}")))?;

        // The worker exits non-zero for failed delegations but still writes
        // a structured result; try to parse stdout before judging the exit
        // status.
        match serde_json::from_slice::<DelegationResult>(&output.stdout) {
            Ok(result) => Ok(result),
            Err(parse_err) => {
                if output.status.success() {
                    Err(Error::Serialization(format!(
                        "malformed worker output: {parse_err}"
                    )))
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(Error::Spawn(format!(
                        "worker exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )))
                }
            }
        }
    }
}
