use super::*;
use crate::delegation::OrchestrationMode;
use tempfile::TempDir;

fn write_marker(dir: &Path, content: &str) {
    std::fs::write(dir.join(MARKER_FILENAME), content).unwrap();
}

#[test]
fn test_marker_enabled_in_start_dir() {
    let tmp = TempDir::new().unwrap();
    write_marker(
        tmp.path(),
        "# Project Config\nCONDUCTOR_ORCHESTRATION: ENABLED\n",
    );

    let detector = ModeDetector::with_path(tmp.path());
    assert_eq!(detector.detect(), OrchestrationMode::Local);
    assert!(detector.is_orchestration_enabled());
}

#[test]
fn test_no_marker_means_subprocess() {
    let tmp = TempDir::new().unwrap();
    let detector = ModeDetector::with_path(tmp.path());
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);
}

#[test]
fn test_marker_without_flag_means_subprocess() {
    let tmp = TempDir::new().unwrap();
    write_marker(tmp.path(), "# Project Config\nSome other content\n");

    let detector = ModeDetector::with_path(tmp.path());
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);
}

#[test]
fn test_disabled_value_means_subprocess() {
    let tmp = TempDir::new().unwrap();
    write_marker(tmp.path(), "CONDUCTOR_ORCHESTRATION: DISABLED\n");

    let detector = ModeDetector::with_path(tmp.path());
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);
}

#[test]
fn test_flag_is_case_sensitive() {
    let tmp = TempDir::new().unwrap();
    write_marker(tmp.path(), "conductor_orchestration: enabled\n");

    let detector = ModeDetector::with_path(tmp.path());
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);
}

#[test]
fn test_parent_directory_search() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("level1/level2/level3");
    std::fs::create_dir_all(&nested).unwrap();
    write_marker(
        &tmp.path().join("level1"),
        "CONDUCTOR_ORCHESTRATION: ENABLED\n",
    );

    // level3 -> level2 -> level1 is within the search depth
    let detector = ModeDetector::with_path(&nested);
    assert_eq!(detector.detect(), OrchestrationMode::Local);
}

#[test]
fn test_parent_search_depth_limit() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("a/b/c/d");
    std::fs::create_dir_all(&nested).unwrap();
    // Marker four levels up is out of reach.
    write_marker(tmp.path(), "CONDUCTOR_ORCHESTRATION: ENABLED\n");

    let detector = ModeDetector::with_path(&nested);
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);
}

#[test]
fn test_detect_is_cached_until_reset() {
    let tmp = TempDir::new().unwrap();
    let detector = ModeDetector::with_path(tmp.path());
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);

    // The marker appears after the first detection; the cache still answers.
    write_marker(tmp.path(), "CONDUCTOR_ORCHESTRATION: ENABLED\n");
    assert_eq!(detector.detect(), OrchestrationMode::Subprocess);

    detector.reset();
    assert_eq!(detector.detect(), OrchestrationMode::Local);
}

#[test]
fn test_marker_enabled_parsing() {
    assert!(marker_enabled("CONDUCTOR_ORCHESTRATION: ENABLED"));
    assert!(marker_enabled("  CONDUCTOR_ORCHESTRATION:ENABLED  "));
    assert!(marker_enabled(
        "# heading\nCONDUCTOR_ORCHESTRATION: ENABLED\nmore text"
    ));
    assert!(!marker_enabled("CONDUCTOR_ORCHESTRATION: enabled"));
    assert!(!marker_enabled("CONDUCTOR_ORCHESTRATION: DISABLED"));
    assert!(!marker_enabled(""));
}
