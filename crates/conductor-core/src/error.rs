//! Error types for conductor-core
//!
//! The dispatcher classifies errors into infrastructure failures (which are
//! retried once via the SUBPROCESS fallback under HYBRID mode) and everything
//! else (terminal).

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No tier has a profile for the requested agent
    #[error("no profile found for agent '{0}' in any tier")]
    ProfileNotFound(String),

    /// No handler registered on the message bus for this agent type
    #[error("no handler registered for agent type '{0}'")]
    UnregisteredHandler(String),

    /// Delegation request failed validation
    #[error("invalid delegation request: {0}")]
    InvalidRequest(String),

    /// Handler ran and raised an error (business-logic failure, not retried)
    #[error("handler execution failed: {0}")]
    HandlerExecution(String),

    /// Worker subprocess could not be spawned or exited abnormally
    #[error("worker subprocess failure: {0}")]
    Spawn(String),

    /// Message bus was not available for local dispatch
    #[error("message bus unavailable: {0}")]
    BusUnavailable(String),

    /// Request or result could not be (de)serialized across the process boundary
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Delegation exceeded its deadline
    #[error("delegation timed out after {0}s")]
    Timeout(u64),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is an infrastructure failure.
    ///
    /// Infrastructure failures mean the handler never got a chance to run
    /// (missing registration, bus unavailable, worker spawn failure) and are
    /// safe to retry via the SUBPROCESS fallback. Business-logic failures,
    /// serialization errors, and timeouts are terminal.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::UnregisteredHandler(_) | Error::Spawn(_) | Error::BusUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_classification() {
        assert!(Error::UnregisteredHandler("qa".into()).is_infrastructure());
        assert!(Error::Spawn("exec format error".into()).is_infrastructure());
        assert!(Error::BusUnavailable("not initialized".into()).is_infrastructure());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(!Error::HandlerExecution("boom".into()).is_infrastructure());
        assert!(!Error::Serialization("bad json".into()).is_infrastructure());
        assert!(!Error::Timeout(30).is_infrastructure());
        assert!(!Error::InvalidRequest("empty task".into()).is_infrastructure());
        assert!(!Error::ProfileNotFound("ghost".into()).is_infrastructure());
    }

    #[test]
    fn test_display_contains_agent_type() {
        let err = Error::UnregisteredHandler("engineer".into());
        assert!(err.to_string().contains("engineer"));
    }
}
