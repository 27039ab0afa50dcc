//! `conductor worker` command
//!
//! The child half of subprocess execution. The dispatcher spawns this
//! subcommand, writes a request to its stdin, and reads the result from its
//! stdout; everything else (logs) goes to stderr.

use anyhow::{Context, Result};

/// Run one delegation over the stdin/stdout protocol.
pub async fn run() -> Result<i32> {
    conductor_core::worker::run_worker()
        .await
        .context("worker protocol failed")
}
