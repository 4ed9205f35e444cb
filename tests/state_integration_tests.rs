//! Integration tests for ProjectModel with project events
//!
//! These tests verify that the ProjectModel correctly:
//! - Emits project events on mutations
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple threads
//! - Reconciles the live tree when parse results are applied

use camino::{Utf8Path, Utf8PathBuf};
use cmakesync::models::{BuildTarget, BuildType, Diagnostic, DiagnosticCategory, FileNode, Severity};
use cmakesync::services::ParsedProject;
use cmakesync::state::ParseResult;
use cmakesync::{ProjectEvent, ProjectModel};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

fn model() -> ProjectModel {
    ProjectModel::new("/src/demo", "/build/demo")
}

fn parse_result(name: &str, files: &[&str]) -> ParseResult {
    let mut app = BuildTarget::new("app");
    app.executable = Utf8PathBuf::from("/build/demo/app");
    let lib = BuildTarget {
        is_library: true,
        executable: Utf8PathBuf::from("/build/demo/libcore.a"),
        ..BuildTarget::new("core")
    };

    ParseResult {
        project: ParsedProject {
            project_name: name.to_string(),
            targets: vec![app, lib],
            files: files.iter().map(|f| FileNode::from_path(*f)).collect(),
            project_files: vec![FileNode::project_file("/src/demo/CMakeLists.txt")],
            ..ParsedProject::default()
        },
        build_type: BuildType::Debug,
        ..ParseResult::default()
    }
}

async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<ProjectEvent>) -> ProjectEvent {
    timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed")
}

#[tokio::test]
async fn test_parsing_started_emitted() {
    let model = model();
    let mut rx = model.subscribe();

    model.parsing_started();

    let event = next_event(&mut rx).await;
    assert_eq!(event, ProjectEvent::ParsingStarted);
    assert!(model.snapshot().is_parsing);
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let model = model();
    let mut rx1 = model.subscribe();
    let mut rx2 = model.subscribe();
    let mut rx3 = model.subscribe();

    model.data_available();

    for rx in [&mut rx1, &mut rx2, &mut rx3] {
        assert_eq!(next_event(rx).await, ProjectEvent::DataAvailable);
    }
}

#[tokio::test]
async fn test_apply_parse_events() {
    let model = model();
    let mut rx = model.subscribe();

    let (report, events) = model.apply_parse(parse_result("demo-project", &["/src/demo/main.cpp"]));

    assert_eq!(report.added.len(), 2);
    assert!(events.contains(&ProjectEvent::DisplayNameChanged {
        name: "demo-project".to_string()
    }));
    assert!(events.contains(&ProjectEvent::TargetsChanged));
    assert_eq!(
        events.last(),
        Some(&ProjectEvent::FileListChanged { added: 2, removed: 0 })
    );

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        received.push(event);
    }
    assert_eq!(received, events);
}

#[test]
fn test_reparse_updates_tree_in_place() {
    let model = model();
    model.apply_parse(parse_result("demo", &["/src/demo/main.cpp", "/src/demo/util/old.cpp"]));

    let (report, events) =
        model.apply_parse(parse_result("demo", &["/src/demo/main.cpp", "/src/demo/new.cpp"]));

    assert_eq!(report.added, vec![Utf8PathBuf::from("/src/demo/new.cpp")]);
    assert_eq!(report.removed, vec![Utf8PathBuf::from("/src/demo/util/old.cpp")]);
    assert!(!events.contains(&ProjectEvent::TargetsChanged));

    let state = model.snapshot();
    assert!(state.root.find_file(Utf8Path::new("/src/demo/main.cpp")).is_some());
    assert!(state.root.folder(Utf8Path::new("/src/demo/util")).is_none());
    assert_eq!(state.files.len(), 3);
}

#[test]
fn test_target_queries() {
    let model = model();
    model.apply_parse(parse_result("demo", &[]));

    assert_eq!(model.build_target_titles(false), vec!["app", "core"]);
    assert_eq!(model.build_target_titles(true), vec!["app"]);
    assert!(model.has_build_target("core"));
    assert!(!model.has_build_target("missing"));
    assert!(model.build_target_for_title("core").unwrap().is_library);
    assert_eq!(model.snapshot().build_type, BuildType::Debug);
}

#[test]
fn test_empty_project_name_keeps_current() {
    let model = model();
    model.apply_parse(parse_result("", &[]));
    assert_eq!(model.project_name(), "demo");
}

#[tokio::test]
async fn test_parsing_started_clears_only_build_system_diagnostics() {
    let model = model();
    model.add_diagnostic(Diagnostic::new(
        DiagnosticCategory::BuildSystem,
        Severity::Error,
        "stale",
    ));
    model.add_diagnostic(Diagnostic::new(DiagnosticCategory::Compile, Severity::Warning, "unused"));
    model.append_output("old output");

    let mut rx = model.subscribe();
    model.parsing_started();

    assert_eq!(
        next_event(&mut rx).await,
        ProjectEvent::DiagnosticsCleared {
            category: DiagnosticCategory::BuildSystem
        }
    );

    let state = model.snapshot();
    assert_eq!(state.diagnostics.len(), 1);
    assert_eq!(state.diagnostics[0].category, DiagnosticCategory::Compile);
    assert!(state.output_log.is_empty());
}

#[test]
fn test_concurrent_readers_and_writer() {
    let model = Arc::new(model());

    let writer = {
        let model = Arc::clone(&model);
        std::thread::spawn(move || {
            for i in 0..50 {
                model.append_output(format!("line {}", i));
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let len = model.read(|state| state.output_log.len());
                    assert!(len <= 50);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(model.snapshot().output_log.len(), 50);
}

#[test]
fn test_clones_share_state() {
    let model = model();
    let clone = model.clone();

    clone.apply_parse(parse_result("shared", &["/src/demo/main.cpp"]));

    assert_eq!(model.project_name(), "shared");
    assert!(model.contains_file(Utf8Path::new("/src/demo/main.cpp")));
}
