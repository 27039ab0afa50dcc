use super::*;
use serde_json::json;

fn sample_request() -> DelegationRequest {
    let mut context = TaskContext::new();
    context.insert("project_overview".to_string(), json!("demo project"));
    DelegationRequest::new("engineer", "Implement the widget")
        .with_requirements(vec!["must compile".into(), "must have tests".into()])
        .with_deliverables(vec!["widget.rs".into()])
        .with_priority(Priority::High)
        .with_context(context)
        .with_timeout(120)
}

#[test]
fn test_request_builder() {
    let req = sample_request();
    assert_eq!(req.agent_type, "engineer");
    assert_eq!(req.requirements.len(), 2);
    assert_eq!(req.deliverables, vec!["widget.rs".to_string()]);
    assert_eq!(req.priority, Priority::High);
    assert_eq!(req.timeout_secs, Some(120));
}

#[test]
fn test_request_json_round_trip() {
    // The SUBPROCESS protocol serializes the request to the child's stdin;
    // the child must reconstruct an equivalent request.
    let req = sample_request();
    let json = serde_json::to_string(&req).unwrap();
    let back: DelegationRequest = serde_json::from_str(&json).unwrap();

    assert_eq!(back.request_id, req.request_id);
    assert_eq!(back.agent_type, req.agent_type);
    assert_eq!(back.task_description, req.task_description);
    assert_eq!(back.requirements, req.requirements);
    assert_eq!(back.deliverables, req.deliverables);
    assert_eq!(back.priority, req.priority);
    assert_eq!(back.context, req.context);
}

#[test]
fn test_request_deserialize_defaults() {
    // A minimal request from an older worker still parses.
    let json = format!(
        r#"{{"request_id":"{}","agent_type":"qa","task_description":"run tests","submitted_at":"2026-08-30T00:00:00Z"}}"#,
        Uuid::new_v4()
    );
    let req: DelegationRequest = serde_json::from_str(&json).unwrap();
    assert!(req.requirements.is_empty());
    assert_eq!(req.priority, Priority::Medium);
    assert!(req.timeout_secs.is_none());
}

#[test]
fn test_mode_parse() {
    use std::str::FromStr;

    assert_eq!(
        OrchestrationMode::from_str("local").unwrap(),
        OrchestrationMode::Local
    );
    assert_eq!(
        OrchestrationMode::from_str("HYBRID").unwrap(),
        OrchestrationMode::Hybrid
    );
    assert!(OrchestrationMode::from_str("turbo").is_err());
}

#[test]
fn test_mode_serde_lowercase() {
    let json = serde_json::to_string(&OrchestrationMode::Subprocess).unwrap();
    assert_eq!(json, "\"subprocess\"");
}

#[test]
fn test_result_constructors() {
    let req = sample_request();

    let ok = DelegationResult::completed(&req, Map::new(), OrchestrationMode::Local);
    assert!(ok.is_success());
    assert_eq!(ok.request_id, req.request_id);
    assert!(ok.error.is_none());

    let failed = DelegationResult::failed(&req, "handler blew up", OrchestrationMode::Local);
    assert!(!failed.is_success());
    assert_eq!(failed.error.as_deref(), Some("handler blew up"));
    assert_eq!(failed.status, DelegationStatus::Failed);
}

#[test]
fn test_result_json_round_trip() {
    let req = sample_request();
    let mut output = Map::new();
    output.insert("result".to_string(), json!("done"));
    let result = DelegationResult::completed(&req, output, OrchestrationMode::Subprocess);

    let json = serde_json::to_string(&result).unwrap();
    // error/fallback_error are elided when absent
    assert!(!json.contains("fallback_error"));

    let back: DelegationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.status, DelegationStatus::Completed);
    assert_eq!(back.mode_used, OrchestrationMode::Subprocess);
    assert_eq!(back.output.get("result"), Some(&json!("done")));
}
