//! In-process message bus
//!
//! Maps an agent-type key to a registered handler. At most one handler per
//! agent type; re-registration overwrites. Registration is expected to happen
//! at startup; dispatch lookups are lock-free and may run concurrently with
//! one another.

use crate::delegation::DelegationRequest;
use crate::error::{Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// What a handler produced for a delegation.
///
/// A handler that ran but could not complete its task returns
/// `success = false`. That is a business outcome, not an error, and the
/// dispatcher never retries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// Whether the agent completed the task
    pub success: bool,
    /// Structured output
    #[serde(default)]
    pub output: Map<String, Value>,
    /// Failure detail when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentOutcome {
    /// Successful outcome with output
    #[must_use]
    pub fn ok(output: Map<String, Value>) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    /// Business failure with detail
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Map::new(),
            error: Some(error.into()),
        }
    }
}

/// An agent handler invoked for local dispatch.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Execute the delegated task.
    ///
    /// # Errors
    /// An `Err` here means the handler itself blew up; the bus wraps it as
    /// `Error::HandlerExecution`.
    async fn handle(&self, request: &DelegationRequest) -> Result<AgentOutcome>;
}

/// Registry mapping agent types to handlers.
#[derive(Default)]
pub struct MessageBus {
    handlers: DashMap<String, Arc<dyn AgentHandler>>,
}

impl MessageBus {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an agent type; overwrites any existing one
    pub fn register(&self, agent_type: impl Into<String>, handler: Arc<dyn AgentHandler>) {
        let agent_type = agent_type.into();
        debug!(agent_type = %agent_type, "registering agent handler");
        self.handlers.insert(agent_type, handler);
    }

    /// Remove a handler; returns true if one was registered
    pub fn unregister(&self, agent_type: &str) -> bool {
        self.handlers.remove(agent_type).is_some()
    }

    /// Whether a handler is registered for this agent type
    #[must_use]
    pub fn is_registered(&self, agent_type: &str) -> bool {
        self.handlers.contains_key(agent_type)
    }

    /// Sorted list of registered agent types
    #[must_use]
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        types.sort();
        types
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch a request to the handler for its agent type.
    ///
    /// # Errors
    /// - `Error::UnregisteredHandler` when no handler exists for the type
    /// - `Error::HandlerExecution` wrapping any error the handler raised
    pub async fn dispatch(
        &self,
        agent_type: &str,
        request: &DelegationRequest,
    ) -> Result<AgentOutcome> {
        // Clone the Arc out so the map entry is not held across the await.
        let handler = self
            .handlers
            .get(agent_type)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::UnregisteredHandler(agent_type.to_string()))?;

        handler
            .handle(request)
            .await
            .map_err(|e| Error::HandlerExecution(e.to_string()))
    }
}
