//! Built-in acknowledgment handlers
//!
//! Stock handlers for the standard agent types so LOCAL mode (and the
//! subprocess worker) can answer instantly without a live model connection.
//! Each handler acknowledges the task with a structured summary; real
//! deployments register their own handlers over these.

use crate::bus::{AgentHandler, AgentOutcome, MessageBus};
use crate::delegation::DelegationRequest;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{json, Map};
use std::sync::Arc;

/// Agent types that get a built-in handler out of the box.
pub const STOCK_AGENT_TYPES: &[&str] = &[
    "engineer",
    "documentation",
    "qa",
    "research",
    "ops",
    "security",
    "version_control",
    "ticketing",
    "data_engineer",
];

/// Acknowledgment handler for one agent type.
pub struct BuiltinHandler {
    agent_type: String,
    specialty: String,
}

impl BuiltinHandler {
    /// Create a handler for an agent type
    #[must_use]
    pub fn new(agent_type: impl Into<String>) -> Self {
        let agent_type = agent_type.into();
        let specialty = specialty_for(&agent_type).to_string();
        Self {
            agent_type,
            specialty,
        }
    }
}

#[async_trait]
impl AgentHandler for BuiltinHandler {
    async fn handle(&self, request: &DelegationRequest) -> Result<AgentOutcome> {
        let summary = format!(
            "{} agent acknowledged task: {}",
            self.agent_type, request.task_description
        );

        let mut output = Map::new();
        output.insert("result".to_string(), json!(summary));
        output.insert("agent_type".to_string(), json!(self.agent_type));
        output.insert("specialty".to_string(), json!(self.specialty));
        output.insert(
            "requirements_count".to_string(),
            json!(request.requirements.len()),
        );
        output.insert(
            "deliverables_count".to_string(),
            json!(request.deliverables.len()),
        );
        Ok(AgentOutcome::ok(output))
    }
}

/// Register built-in handlers for every stock agent type.
pub fn register_builtin_handlers(bus: &MessageBus) {
    for agent_type in STOCK_AGENT_TYPES {
        bus.register(*agent_type, Arc::new(BuiltinHandler::new(*agent_type)));
    }
}

fn specialty_for(agent_type: &str) -> &'static str {
    match agent_type {
        "engineer" => "code implementation and technical problem solving",
        "documentation" => "creating and maintaining project documentation",
        "qa" => "quality assurance, testing, and validation",
        "research" => "investigation, analysis, and information gathering",
        "ops" => "deployment, operations, and infrastructure",
        "security" => "security analysis and vulnerability assessment",
        "version_control" => "git operations and version management",
        "ticketing" => "ticket lifecycle and issue tracking",
        "data_engineer" => "data management and pipeline engineering",
        _ => "general task assistance",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_handler_acknowledges() {
        let handler = BuiltinHandler::new("qa");
        let request = DelegationRequest::new("qa", "verify the release")
            .with_requirements(vec!["all suites green".into()]);

        let outcome = handler.handle(&request).await.unwrap();
        assert!(outcome.success);
        let result = outcome.output.get("result").unwrap().as_str().unwrap();
        assert!(result.contains("verify the release"));
        assert_eq!(
            outcome.output.get("requirements_count").unwrap(),
            &serde_json::json!(1)
        );
    }

    #[tokio::test]
    async fn test_register_builtins_covers_stock_types() {
        let bus = MessageBus::new();
        register_builtin_handlers(&bus);
        assert_eq!(bus.len(), STOCK_AGENT_TYPES.len());
        for agent_type in STOCK_AGENT_TYPES {
            assert!(bus.is_registered(agent_type));
        }
    }

    #[test]
    fn test_unknown_type_gets_generic_specialty() {
        assert_eq!(specialty_for("astrologer"), "general task assistance");
    }
}
