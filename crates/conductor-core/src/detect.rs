//! Orchestration mode detection
//!
//! Reads the project marker file to decide LOCAL vs SUBPROCESS execution.
//! A `CONDUCTOR.md` containing the exact line `CONDUCTOR_ORCHESTRATION:
//! ENABLED` (case-sensitive, both filename and flag) opts the project into
//! LOCAL orchestration; anything else falls back to SUBPROCESS isolation.
//!
//! The detection result is cached per detector instance so repeated
//! delegations do not re-walk the filesystem; `reset()` invalidates.

use crate::delegation::OrchestrationMode;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Marker filename searched for in the start directory and its parents
pub const MARKER_FILENAME: &str = "CONDUCTOR.md";

/// Flag line prefix inside the marker file
pub const MARKER_FLAG: &str = "CONDUCTOR_ORCHESTRATION:";

/// Environment variable that forces SUBPROCESS mode regardless of the marker
pub const FORCE_SUBPROCESS_ENV: &str = "CONDUCTOR_FORCE_SUBPROCESS";

/// How many parent directories above the start path are searched
const MAX_PARENT_LEVELS: usize = 3;

/// Detects the orchestration mode for a working directory.
#[derive(Debug)]
pub struct ModeDetector {
    start_path: PathBuf,
    cached: Mutex<Option<OrchestrationMode>>,
}

impl ModeDetector {
    /// Detector rooted at the current working directory
    #[must_use]
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_path(cwd)
    }

    /// Detector rooted at an explicit path
    #[must_use]
    pub fn with_path(start_path: impl Into<PathBuf>) -> Self {
        Self {
            start_path: start_path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Directory the search starts from
    #[must_use]
    pub fn start_path(&self) -> &Path {
        &self.start_path
    }

    /// Detect the orchestration mode, caching the result.
    ///
    /// Idempotent until `reset()`: two calls without a reset always return
    /// the same mode even if the marker file changed in between.
    pub fn detect(&self) -> OrchestrationMode {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mode) = *cached {
            return mode;
        }
        let mode = self.probe();
        debug!(mode = %mode, path = %self.start_path.display(), "orchestration mode detected");
        *cached = Some(mode);
        mode
    }

    /// Drop the cached result; the next `detect()` re-reads the filesystem
    pub fn reset(&self) {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }

    /// Whether LOCAL orchestration is enabled for this directory
    #[must_use]
    pub fn is_orchestration_enabled(&self) -> bool {
        self.detect() == OrchestrationMode::Local
    }

    fn probe(&self) -> OrchestrationMode {
        if std::env::var(FORCE_SUBPROCESS_ENV)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
        {
            debug!("subprocess mode forced by {FORCE_SUBPROCESS_ENV}");
            return OrchestrationMode::Subprocess;
        }

        let mut dir = self.start_path.clone();
        for _ in 0..=MAX_PARENT_LEVELS {
            let marker = dir.join(MARKER_FILENAME);
            if marker.is_file() {
                if let Ok(content) = std::fs::read_to_string(&marker) {
                    if marker_enabled(&content) {
                        return OrchestrationMode::Local;
                    }
                }
                // A marker without the flag (or with a disabled value) is
                // an explicit opt-out; stop walking upward.
                return OrchestrationMode::Subprocess;
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
        OrchestrationMode::Subprocess
    }
}

impl Default for ModeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the marker content enables orchestration.
///
/// Both the flag name and the ENABLED value are case-sensitive.
#[must_use]
pub fn marker_enabled(content: &str) -> bool {
    content.lines().any(|line| {
        line.trim()
            .strip_prefix(MARKER_FLAG)
            .is_some_and(|value| value.trim() == "ENABLED")
    })
}

#[cfg(test)]
mod tests;
