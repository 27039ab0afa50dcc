//! Delegation metrics
//!
//! In-memory recorder for completed delegations and their state transitions.
//! Recording is append-only and never fails; readers get snapshots.

use crate::delegation::{DelegationResult, DelegationStatus, OrchestrationMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// States a delegation moves through inside the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// Request accepted by the dispatcher
    Received,
    /// Execution mode decided
    ModeSelected,
    /// Primary execution running
    Executing,
    /// SUBPROCESS fallback running after a local infrastructure failure
    FallbackExecuting,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::ModeSelected => "mode_selected",
            Self::Executing => "executing",
            Self::FallbackExecuting => "fallback_executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One finished delegation as recorded for metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationRecord {
    /// Request identifier
    pub request_id: Uuid,
    /// Agent type delegated to
    pub agent_type: String,
    /// Mode that produced the result
    pub mode: OrchestrationMode,
    /// Terminal status
    pub status: DelegationStatus,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether the result came from the SUBPROCESS fallback
    pub fallback: bool,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

/// A state transition observed during dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Request the transition belongs to
    pub request_id: Uuid,
    /// State entered
    pub state: DispatchState,
    /// When the transition happened
    pub at: DateTime<Utc>,
}

/// Aggregate view over everything recorded so far.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSummary {
    /// Total delegations recorded
    pub total: u64,
    /// Delegations that completed
    pub completed: u64,
    /// Delegations that failed
    pub failed: u64,
    /// Delegations with partial deliverables
    pub partial: u64,
    /// Results produced by LOCAL execution
    pub local: u64,
    /// Results produced by SUBPROCESS execution
    pub subprocess: u64,
    /// Results reported as HYBRID (both attempts failed)
    pub hybrid: u64,
    /// Results that came via the HYBRID fallback path
    pub fallback_count: u64,
    /// completed / total, 0.0 with no records
    pub success_rate: f64,
    /// Mean duration across all records
    pub avg_duration_ms: f64,
}

/// Append-only recorder for delegation outcomes and transitions.
#[derive(Debug, Default)]
pub struct DelegationRecorder {
    records: RwLock<Vec<DelegationRecord>>,
    transitions: RwLock<Vec<TransitionEvent>>,
}

impl DelegationRecorder {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished delegation
    pub fn record(&self, result: &DelegationResult, fallback: bool) {
        let record = DelegationRecord {
            request_id: result.request_id,
            agent_type: result.agent_type.clone(),
            mode: result.mode_used,
            status: result.status,
            duration_ms: result.duration_ms,
            fallback,
            recorded_at: Utc::now(),
        };
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.push(record);
    }

    /// Record a state transition
    pub fn record_transition(&self, request_id: Uuid, state: DispatchState) {
        let event = TransitionEvent {
            request_id,
            state,
            at: Utc::now(),
        };
        let mut transitions = self.transitions.write().unwrap_or_else(|e| e.into_inner());
        transitions.push(event);
    }

    /// The most recent `n` records, newest last
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<DelegationRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }

    /// All transitions for one request, in recording order
    #[must_use]
    pub fn transitions_for(&self, request_id: Uuid) -> Vec<TransitionEvent> {
        let transitions = self.transitions.read().unwrap_or_else(|e| e.into_inner());
        transitions
            .iter()
            .filter(|t| t.request_id == request_id)
            .cloned()
            .collect()
    }

    /// Number of records written so far
    #[must_use]
    pub fn len(&self) -> usize {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.len()
    }

    /// Whether nothing has been recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate counters over everything recorded
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut summary = MetricsSummary::default();
        let mut total_duration: u128 = 0;

        for record in records.iter() {
            summary.total += 1;
            match record.status {
                DelegationStatus::Completed => summary.completed += 1,
                DelegationStatus::Failed => summary.failed += 1,
                DelegationStatus::Partial => summary.partial += 1,
            }
            match record.mode {
                OrchestrationMode::Local => summary.local += 1,
                OrchestrationMode::Subprocess => summary.subprocess += 1,
                OrchestrationMode::Hybrid => summary.hybrid += 1,
            }
            if record.fallback {
                summary.fallback_count += 1;
            }
            total_duration += u128::from(record.duration_ms);
        }

        if summary.total > 0 {
            summary.success_rate = summary.completed as f64 / summary.total as f64;
            summary.avg_duration_ms = total_duration as f64 / summary.total as f64;
        }
        summary
    }
}
