//! Worker side of the subprocess protocol
//!
//! The worker is the child half of SUBPROCESS mode: it reads one serialized
//! `DelegationRequest` from stdin, executes it against a bus populated with
//! the built-in handlers, writes the serialized `DelegationResult` to stdout,
//! and exits 0 iff the delegation completed.

use crate::bus::MessageBus;
use crate::delegation::{DelegationRequest, DelegationResult, OrchestrationMode};
use crate::error::{Error, Result};
use crate::handlers::{register_builtin_handlers, BuiltinHandler};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

/// Execute one request the way the worker process does.
///
/// Builds a bus with the built-in handlers. Agent types outside the stock
/// set get a generic handler registered on the fly so a HYBRID fallback for
/// a custom agent type still yields a structured result.
pub async fn execute_request(request: &DelegationRequest) -> DelegationResult {
    let started = Instant::now();

    let bus = MessageBus::new();
    register_builtin_handlers(&bus);
    if !bus.is_registered(&request.agent_type) {
        bus.register(
            request.agent_type.clone(),
            Arc::new(BuiltinHandler::new(request.agent_type.clone())),
        );
    }

    let mut result = match bus.dispatch(&request.agent_type, request).await {
        Ok(outcome) if outcome.success => {
            DelegationResult::completed(request, outcome.output, OrchestrationMode::Subprocess)
        }
        Ok(outcome) => DelegationResult::failed(
            request,
            outcome
                .error
                .unwrap_or_else(|| "agent reported failure".to_string()),
            OrchestrationMode::Subprocess,
        ),
        Err(e) => DelegationResult::failed(request, e.to_string(), OrchestrationMode::Subprocess),
    };
    result.duration_ms = started.elapsed().as_millis() as u64;
    result
}

/// Run the worker protocol over stdin/stdout.
///
/// Returns the process exit code: 0 for a completed delegation, 1 otherwise.
///
/// # Errors
/// Only IO/decoding failures on the protocol itself; a failed delegation is
/// still reported as a structured result on stdout.
pub async fn run_worker() -> Result<i32> {
    let mut input = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut input)
        .await
        .map_err(|e| Error::Internal(format!("failed to read request from stdin: {e}")))?;

    let request: DelegationRequest = serde_json::from_slice(&input)
        .map_err(|e| Error::Serialization(format!("malformed request on stdin: {e}")))?;

    info!(
        request_id = %request.request_id,
        agent_type = %request.agent_type,
        "worker executing delegation"
    );

    let result = execute_request(&request).await;

    let encoded = serde_json::to_vec(&result)
        .map_err(|e| Error::Serialization(format!("failed to encode result: {e}")))?;
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(&encoded)
        .await
        .map_err(|e| Error::Internal(format!("failed to write result: {e}")))?;
    stdout
        .flush()
        .await
        .map_err(|e| Error::Internal(format!("failed to flush result: {e}")))?;

    Ok(if result.is_success() { 0 } else { 1 })
}
