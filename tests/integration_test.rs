//! Integration tests for Conductor
//!
//! These tests verify the wiring the CLI relies on: profile resolution from
//! a working directory, marker-driven mode detection, and the full dispatch
//! path through `build_dispatcher`.

use conductor_core::delegation::{DelegationRequest, DelegationStatus, OrchestrationMode};
use conductor_core::detect::{ModeDetector, MARKER_FILENAME};
use conductor_core::dispatcher::{build_dispatcher, DispatcherConfig};
use conductor_core::profiles::{ProfileResolver, ProfileTier};
use tempfile::TempDir;

fn project_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let agents = tmp.path().join(".conductor/agents");
    std::fs::create_dir_all(&agents).unwrap();
    std::fs::write(
        agents.join("qa.md"),
        "# QA Agent\n\n## Role\nQuality assurance specialist\n\n## Capabilities\n- run tests\n- validate releases\n",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join(MARKER_FILENAME),
        "# Project\nCONDUCTOR_ORCHESTRATION: ENABLED\n",
    )
    .unwrap();
    tmp
}

#[tokio::test]
async fn test_build_dispatcher_delegates_locally() {
    let project = project_dir();
    let dispatcher = build_dispatcher(project.path(), None, DispatcherConfig::default());

    let request = DelegationRequest::new("qa", "smoke test the release")
        .with_deliverables(vec!["test report".into()]);
    let result = dispatcher.delegate(request).await;

    assert_eq!(result.status, DelegationStatus::Completed);
    assert_eq!(result.mode_used, OrchestrationMode::Local);
    assert!(result.error.is_none());
}

#[test]
fn test_working_dir_profile_resolution() {
    let project = project_dir();
    let resolver = ProfileResolver::from_working_dir(project.path(), None);

    let profile = resolver.resolve("qa").unwrap();
    assert_eq!(profile.tier, ProfileTier::Project);
    assert_eq!(profile.role, "Quality assurance specialist");
    assert_eq!(profile.capabilities.len(), 2);
}

#[test]
fn test_marker_detection_from_project_root() {
    let project = project_dir();
    let detector = ModeDetector::with_path(project.path());
    assert!(detector.is_orchestration_enabled());

    let empty = TempDir::new().unwrap();
    let detector = ModeDetector::with_path(empty.path());
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);
}
