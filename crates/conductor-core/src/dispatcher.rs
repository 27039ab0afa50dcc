//! Delegation dispatcher
//!
//! The single entry point for delegating work to an agent. `delegate()` is
//! infallible from the caller's point of view: every path, including
//! validation failures and infrastructure breakage, returns a
//! `DelegationResult` so callers never deal with a raw error.
//!
//! Mode selection is forced config > marker detection. HYBRID runs LOCAL
//! first and falls back to SUBPROCESS exactly once, and only for
//! infrastructure failures; business-logic failures, serialization errors,
//! and timeouts are terminal.

use crate::bus::MessageBus;
use crate::context::ContextFilterSet;
use crate::delegation::{DelegationRequest, DelegationResult, OrchestrationMode};
use crate::detect::ModeDetector;
use crate::error::{Error, Result};
use crate::metrics::{DelegationRecorder, DispatchState, MetricsSummary};
use crate::profiles::{render_task_prompt, AgentProfile, CacheStats, ProfileResolver};
use crate::subprocess::{SubprocessExecutor, WorkerCommand};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Skip detection and always use this mode
    pub force_mode: Option<OrchestrationMode>,
    /// Timeout applied when the request carries no override
    pub default_timeout_secs: u64,
    /// Command used to launch worker subprocesses
    pub worker: WorkerCommand,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            force_mode: None,
            default_timeout_secs: 300,
            worker: WorkerCommand::default(),
        }
    }
}

/// Combined dispatcher status: aggregate metrics plus cache counters.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatcherSummary {
    /// Aggregate delegation metrics
    pub metrics: MetricsSummary,
    /// Profile cache counters
    pub profile_cache: CacheStats,
}

/// Orchestrates delegations across LOCAL, SUBPROCESS, and HYBRID modes.
pub struct Dispatcher {
    resolver: Arc<ProfileResolver>,
    filters: ContextFilterSet,
    bus: Arc<MessageBus>,
    detector: ModeDetector,
    executor: SubprocessExecutor,
    recorder: Arc<DelegationRecorder>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher from its collaborators
    #[must_use]
    pub fn new(
        resolver: Arc<ProfileResolver>,
        filters: ContextFilterSet,
        bus: Arc<MessageBus>,
        detector: ModeDetector,
        config: DispatcherConfig,
    ) -> Self {
        let executor = SubprocessExecutor::new(config.worker.clone());
        Self {
            resolver,
            filters,
            bus,
            detector,
            executor,
            recorder: Arc::new(DelegationRecorder::new()),
            config,
        }
    }

    /// The message bus handlers are registered on
    #[must_use]
    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    /// The profile resolver
    #[must_use]
    pub fn resolver(&self) -> &Arc<ProfileResolver> {
        &self.resolver
    }

    /// The metrics recorder
    #[must_use]
    pub fn recorder(&self) -> &Arc<DelegationRecorder> {
        &self.recorder
    }

    /// Aggregate metrics plus profile cache counters
    #[must_use]
    pub fn summary(&self) -> DispatcherSummary {
        DispatcherSummary {
            metrics: self.recorder.summary(),
            profile_cache: self.resolver.cache_stats(),
        }
    }

    /// Delegate a task to an agent.
    ///
    /// Never returns an error: validation failures, handler errors, and
    /// infrastructure breakage all come back as a `DelegationResult` with
    /// `status = Failed` and a populated `error`.
    pub async fn delegate(&self, request: DelegationRequest) -> DelegationResult {
        let started = Instant::now();
        self.recorder
            .record_transition(request.request_id, DispatchState::Received);

        let profile = match self.validate(&request) {
            Ok(profile) => profile,
            Err(e) => {
                let mut result =
                    DelegationResult::failed(&request, e.to_string(), OrchestrationMode::Local);
                result.duration_ms = started.elapsed().as_millis() as u64;
                self.recorder
                    .record_transition(request.request_id, DispatchState::Failed);
                self.recorder.record(&result, false);
                return result;
            }
        };

        let mode = self.select_mode();
        self.recorder
            .record_transition(request.request_id, DispatchState::ModeSelected);
        info!(
            request_id = %request.request_id,
            agent_type = %request.agent_type,
            mode = %mode,
            "delegating task"
        );

        self.recorder
            .record_transition(request.request_id, DispatchState::Executing);
        let (outcome, fallback) = match mode {
            OrchestrationMode::Local => (self.execute_local(&request, &profile).await, false),
            OrchestrationMode::Subprocess => (self.executor.execute(&request).await, false),
            OrchestrationMode::Hybrid => self.execute_hybrid(&request, &profile).await,
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => DelegationResult::failed(&request, e.to_string(), mode),
        };
        result.duration_ms = started.elapsed().as_millis() as u64;

        let final_state = if result.is_success() {
            DispatchState::Completed
        } else {
            DispatchState::Failed
        };
        self.recorder
            .record_transition(request.request_id, final_state);
        self.recorder.record(&result, fallback);
        result
    }

    /// Validate the request and resolve the agent profile.
    fn validate(&self, request: &DelegationRequest) -> Result<Arc<AgentProfile>> {
        if request.task_description.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "task description is empty".to_string(),
            ));
        }
        self.resolver
            .resolve(&request.agent_type)
            .map_err(|e| match e {
                Error::ProfileNotFound(name) => Error::InvalidRequest(format!(
                    "agent type '{name}' has no profile in any tier"
                )),
                other => other,
            })
    }

    fn select_mode(&self) -> OrchestrationMode {
        self.config
            .force_mode
            .unwrap_or_else(|| self.detector.detect())
    }

    /// LOCAL execution: filter context, dispatch on the bus, wrap the
    /// outcome. A handler's business failure is a failed result, not an
    /// error, so HYBRID never retries it.
    async fn execute_local(
        &self,
        request: &DelegationRequest,
        profile: &AgentProfile,
    ) -> Result<DelegationResult> {
        let mut local = request.clone();
        local.context = self.filters.filter(&request.agent_type, &request.context);

        let timeout_secs = request
            .timeout_secs
            .unwrap_or(self.config.default_timeout_secs);
        let outcome = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.bus.dispatch(&request.agent_type, &local),
        )
        .await
        .map_err(|_| Error::Timeout(timeout_secs))??;

        if outcome.success {
            let mut output = outcome.output;
            output.entry("prompt").or_insert_with(|| {
                json!(render_task_prompt(profile, request))
            });
            Ok(DelegationResult::completed(
                request,
                output,
                OrchestrationMode::Local,
            ))
        } else {
            Ok(DelegationResult::failed(
                request,
                outcome
                    .error
                    .unwrap_or_else(|| "agent reported failure".to_string()),
                OrchestrationMode::Local,
            ))
        }
    }

    /// HYBRID: LOCAL first, one-shot SUBPROCESS fallback on infrastructure
    /// failure. Returns the result plus whether the fallback produced it.
    async fn execute_hybrid(
        &self,
        request: &DelegationRequest,
        profile: &AgentProfile,
    ) -> (Result<DelegationResult>, bool) {
        let primary_err = match self.execute_local(request, profile).await {
            Ok(result) => return (Ok(result), false),
            Err(e) if e.is_infrastructure() => e,
            Err(e) => return (Err(e), false),
        };

        warn!(
            request_id = %request.request_id,
            error = %primary_err,
            "local execution failed, falling back to subprocess"
        );
        self.recorder
            .record_transition(request.request_id, DispatchState::FallbackExecuting);

        match self.executor.execute(request).await {
            Ok(result) => (Ok(result), true),
            Err(fallback_err) => {
                // Both attempts failed: surface both traces on one result.
                let mut result = DelegationResult::failed(
                    request,
                    primary_err.to_string(),
                    OrchestrationMode::Hybrid,
                );
                result.fallback_error = Some(fallback_err.to_string());
                (Ok(result), true)
            }
        }
    }
}

/// Convenience constructor wiring the stock collaborators.
///
/// Built-in handlers are registered on a fresh bus; profiles resolve from
/// the working directory hierarchy (with an optional system tier override);
/// mode detection starts there too.
#[must_use]
pub fn build_dispatcher(
    working_dir: &std::path::Path,
    system_agents_dir: Option<std::path::PathBuf>,
    config: DispatcherConfig,
) -> Dispatcher {
    let bus = Arc::new(MessageBus::new());
    crate::handlers::register_builtin_handlers(&bus);
    Dispatcher::new(
        Arc::new(ProfileResolver::from_working_dir(working_dir, system_agents_dir)),
        ContextFilterSet::with_defaults(),
        bus,
        ModeDetector::with_path(working_dir),
        config,
    )
}
