//! End-to-end dispatch tests wiring the real collaborators together.

use conductor_core::context::ContextFilterSet;
use conductor_core::delegation::{DelegationRequest, DelegationStatus, OrchestrationMode};
use conductor_core::detect::{ModeDetector, MARKER_FILENAME};
use conductor_core::dispatcher::{Dispatcher, DispatcherConfig};
use conductor_core::handlers::register_builtin_handlers;
use conductor_core::metrics::DispatchState;
use conductor_core::profiles::ProfileResolver;
use conductor_core::subprocess::WorkerCommand;
use conductor_core::MessageBus;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn project_with_profiles(marker: Option<&str>) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let agents = tmp.path().join(".conductor/agents");
    std::fs::create_dir_all(&agents).unwrap();
    std::fs::write(
        agents.join("engineer.md"),
        "# Engineer\n\n## Role\nSenior implementation engineer\n\n## Capabilities\n- write code\n",
    )
    .unwrap();
    if let Some(content) = marker {
        std::fs::write(tmp.path().join(MARKER_FILENAME), content).unwrap();
    }
    tmp
}

fn dispatcher_for(project: &TempDir, config: DispatcherConfig) -> Dispatcher {
    let bus = Arc::new(MessageBus::new());
    register_builtin_handlers(&bus);
    let resolver = Arc::new(ProfileResolver::new(
        project.path().join(".conductor/agents"),
        PathBuf::from("/nonexistent/user"),
        PathBuf::from("/nonexistent/system"),
    ));
    Dispatcher::new(
        resolver,
        ContextFilterSet::with_defaults(),
        bus,
        ModeDetector::with_path(project.path()),
        config,
    )
}

#[tokio::test]
async fn marker_enables_local_execution_end_to_end() {
    let project = project_with_profiles(Some("CONDUCTOR_ORCHESTRATION: ENABLED\n"));
    let dispatcher = dispatcher_for(&project, DispatcherConfig::default());

    let request = DelegationRequest::new("engineer", "implement the parser")
        .with_requirements(vec!["handle escapes".into()])
        .with_deliverables(vec!["parser module".into()]);
    let result = dispatcher.delegate(request.clone()).await;

    assert_eq!(result.status, DelegationStatus::Completed);
    assert_eq!(result.mode_used, OrchestrationMode::Local);

    let states: Vec<_> = dispatcher
        .recorder()
        .transitions_for(request.request_id)
        .iter()
        .map(|t| t.state)
        .collect();
    assert_eq!(
        states,
        vec![
            DispatchState::Received,
            DispatchState::ModeSelected,
            DispatchState::Executing,
            DispatchState::Completed,
        ]
    );
}

#[tokio::test]
async fn hybrid_falls_back_to_worker_for_unregistered_agent() {
    let project = project_with_profiles(None);
    let request = DelegationRequest::new("engineer", "implement the parser");
    // Stand-in worker that answers the protocol with a canned result.
    let result_json = format!(
        r#"{{"request_id":"{}","agent_type":"engineer","status":"completed","output":{{"result":"done in worker"}},"duration_ms":7,"mode_used":"subprocess"}}"#,
        request.request_id
    );
    let config = DispatcherConfig {
        force_mode: Some(OrchestrationMode::Hybrid),
        worker: WorkerCommand::new("sh").with_args(vec![
            "-c".to_string(),
            format!("cat >/dev/null; printf '%s' '{result_json}'"),
        ]),
        ..DispatcherConfig::default()
    };
    let dispatcher = dispatcher_for(&project, config);
    dispatcher.bus().unregister("engineer");

    let result = dispatcher.delegate(request.clone()).await;

    assert_eq!(result.status, DelegationStatus::Completed);
    assert_eq!(result.mode_used, OrchestrationMode::Subprocess);
    assert_eq!(
        result.output.get("result").unwrap().as_str().unwrap(),
        "done in worker"
    );

    let summary = dispatcher.summary();
    assert_eq!(summary.metrics.total, 1);
    assert_eq!(summary.metrics.fallback_count, 1);
}

#[tokio::test]
async fn detection_without_marker_selects_subprocess() {
    let project = project_with_profiles(None);
    let detector = ModeDetector::with_path(project.path());
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);
}
