//! Delegation data model
//!
//! Contains the wire types shared by the dispatcher, the message bus, and the
//! subprocess worker protocol:
//! - `DelegationRequest`: immutable unit of work handed to an agent
//! - `DelegationResult`: uniform result regardless of execution path
//! - `OrchestrationMode` and `DelegationStatus`

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// How a delegation is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationMode {
    /// In-process, cooperatively scheduled execution on the message bus
    Local,
    /// Isolated OS subprocess, one process per delegation
    Subprocess,
    /// LOCAL first, one-shot SUBPROCESS fallback on infrastructure failure
    Hybrid,
}

impl std::fmt::Display for OrchestrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Local => "local",
            Self::Subprocess => "subprocess",
            Self::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OrchestrationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "subprocess" => Ok(Self::Subprocess),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(Error::Configuration(format!(
                "unknown orchestration mode '{other}' (expected local, subprocess, or hybrid)"
            ))),
        }
    }
}

/// Delegation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background work
    Low,
    /// Default priority
    #[default]
    Medium,
    /// Elevated priority
    High,
    /// Drop everything
    Critical,
}

/// Shared project context passed alongside a delegation.
///
/// Free-form JSON map; the `files` sub-map (path -> content) gets filtered
/// per agent type before local dispatch.
pub type TaskContext = Map<String, Value>;

/// A unit of work handed from the orchestrator to an agent.
///
/// Immutable once submitted; the dispatcher clones it for the filtered
/// local copy rather than mutating the caller's request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationRequest {
    /// Unique request identifier
    pub request_id: Uuid,
    /// Agent type to delegate to (must resolve to a profile)
    pub agent_type: String,
    /// What the agent should do
    pub task_description: String,
    /// Ordered requirements
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Ordered expected deliverables
    #[serde(default)]
    pub deliverables: Vec<String>,
    /// Priority
    #[serde(default)]
    pub priority: Priority,
    /// Shared project context
    #[serde(default)]
    pub context: TaskContext,
    /// Free-form notes for cross-agent integration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_notes: Option<String>,
    /// Per-request timeout override in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

impl DelegationRequest {
    /// Create a new request with a fresh id
    #[must_use]
    pub fn new(agent_type: impl Into<String>, task_description: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            agent_type: agent_type.into(),
            task_description: task_description.into(),
            requirements: Vec::new(),
            deliverables: Vec::new(),
            priority: Priority::default(),
            context: TaskContext::new(),
            integration_notes: None,
            timeout_secs: None,
            submitted_at: Utc::now(),
        }
    }

    /// Set the requirements list
    #[must_use]
    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Set the deliverables list
    #[must_use]
    pub fn with_deliverables(mut self, deliverables: Vec<String>) -> Self {
        self.deliverables = deliverables;
        self
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Attach shared project context
    #[must_use]
    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    /// Set integration notes
    #[must_use]
    pub fn with_integration_notes(mut self, notes: impl Into<String>) -> Self {
        self.integration_notes = Some(notes.into());
        self
    }

    /// Override the execution timeout
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Terminal status of a delegation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationStatus {
    /// Agent completed the task
    Completed,
    /// Agent failed or never ran
    Failed,
    /// Some deliverables produced, others not
    Partial,
}

/// Result of a delegation, owned by the caller after return.
///
/// Every failure path still yields one of these with `status = Failed` and a
/// populated `error`; the dispatcher never surfaces a raw error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationResult {
    /// Request this result answers
    pub request_id: Uuid,
    /// Agent type that was delegated to
    pub agent_type: String,
    /// Terminal status
    pub status: DelegationStatus,
    /// Structured agent output
    #[serde(default)]
    pub output: Map<String, Value>,
    /// Error detail for the primary execution attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error detail for the fallback attempt, when both attempts failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_error: Option<String>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Execution mode that produced this result
    pub mode_used: OrchestrationMode,
}

impl DelegationResult {
    /// Build a completed result
    #[must_use]
    pub fn completed(
        request: &DelegationRequest,
        output: Map<String, Value>,
        mode_used: OrchestrationMode,
    ) -> Self {
        Self {
            request_id: request.request_id,
            agent_type: request.agent_type.clone(),
            status: DelegationStatus::Completed,
            output,
            error: None,
            fallback_error: None,
            duration_ms: 0,
            mode_used,
        }
    }

    /// Build a failed result
    #[must_use]
    pub fn failed(
        request: &DelegationRequest,
        error: impl Into<String>,
        mode_used: OrchestrationMode,
    ) -> Self {
        Self {
            request_id: request.request_id,
            agent_type: request.agent_type.clone(),
            status: DelegationStatus::Failed,
            output: Map::new(),
            error: Some(error.into()),
            fallback_error: None,
            duration_ms: 0,
            mode_used,
        }
    }

    /// Whether the delegation completed successfully
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == DelegationStatus::Completed
    }
}

#[cfg(test)]
mod tests;
