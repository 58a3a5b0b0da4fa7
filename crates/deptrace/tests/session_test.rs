//! Loading models from disk, one-shot analysis and watch-mode reloads

use deptrace::agent::{WatchSession, WatchStatus};
use deptrace::{analyze, load_config, AnalysisRequest};
use deptrace_core::dependency::{AnalysisMode, AnalyzerConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ENTRY: &str = "app.Main.main([Ljava/lang/String;)V";

fn model(with_override: bool) -> String {
    let a_methods = if with_override {
        r#"[{ "descriptor": "foo()V", "program": { "variable_count": 1, "blocks": [{ "instructions": [{ "op": "return", "value": null }] }] } }]"#
    } else {
        "[]"
    };
    format!(
        r#"{{
  "classes": [
    {{ "name": "java.lang.Object" }},
    {{ "name": "java.lang.String", "parent": "java.lang.Object" }},
    {{
      "name": "app.Base",
      "parent": "java.lang.Object",
      "methods": [{{ "descriptor": "foo()V", "program": {{ "variable_count": 1, "blocks": [{{ "instructions": [{{ "op": "return", "value": null }}] }}] }} }}]
    }},
    {{ "name": "app.A", "parent": "app.Base", "methods": {a_methods} }},
    {{
      "name": "app.Main",
      "parent": "java.lang.Object",
      "methods": [{{
        "descriptor": "main([Ljava/lang/String;)V",
        "modifiers": ["static"],
        "program": {{
          "variable_count": 3,
          "blocks": [{{
            "instructions": [
              {{ "op": "construct", "receiver": 2, "class": "app.A" }},
              {{ "op": "invoke", "receiver": null, "instance": 2, "method": "app.Base.foo()V", "arguments": [], "dispatch": {{ "virtual": "app.Base" }} }},
              {{ "op": "return", "value": null }}
            ]
          }}]
        }}
      }}]
    }}
  ]
}}"#
    )
}

fn request(path: &Path, config: AnalyzerConfig) -> AnalysisRequest {
    AnalysisRequest {
        model: path.to_path_buf(),
        entry: ENTRY.parse().unwrap(),
        config,
    }
}

fn reachable(report: &deptrace_analysis::ReachabilityReport) -> Vec<&str> {
    report.methods.iter().map(|m| m.reference.as_str()).collect()
}

#[test]
fn test_analyze_model_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, model(true)).unwrap();

    let (analyzer, report) = analyze(&request(&path, AnalyzerConfig::default())).unwrap();

    assert_eq!(reachable(&report), vec![ENTRY, "app.A.foo()V"]);
    assert_eq!(report.devirtualization.devirtualized, 1);
    assert!(report.diagnostics.is_empty());

    let arguments = analyzer.variable_types(&ENTRY.parse().unwrap(), 1);
    assert_eq!(arguments.len(), 1);
    assert_eq!(arguments[0].to_string(), "java.lang.String[]");
}

#[test]
fn test_missing_model_is_reported() {
    let dir = TempDir::new().unwrap();
    let error = analyze(&request(&dir.path().join("absent.json"), AnalyzerConfig::default())).unwrap_err();
    assert!(format!("{error:#}").contains("failed to load class model"));
}

#[test]
fn test_unknown_entry_point_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, model(true)).unwrap();

    let mut request = request(&path, AnalyzerConfig::default());
    request.entry = "app.Main.start()V".parse().unwrap();
    let error = analyze(&request).unwrap_err();
    assert!(error.to_string().contains("cannot be resolved"));
}

#[test]
fn test_config_file_and_precise_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deptrace.json");
    fs::write(&path, r#"{ "async_supported": true }"#).unwrap();

    let config = load_config(Some(&path), false).unwrap();
    assert_eq!(config.mode, AnalysisMode::Fast);
    assert!(config.async_supported);

    let config = load_config(Some(&path), true).unwrap();
    assert_eq!(config.mode, AnalysisMode::Precise);
    assert!(config.async_supported);

    assert_eq!(load_config(None, false).unwrap(), AnalyzerConfig::default());
}

#[test]
fn test_watch_reload_evicts_changed_classes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, model(true)).unwrap();

    let (mut session, report) = WatchSession::start(request(&path, AnalyzerConfig::precise())).unwrap();
    assert_eq!(reachable(&report), vec![ENTRY, "app.A.foo()V"]);
    assert!(session.reload().unwrap().is_none());

    fs::write(&path, model(false)).unwrap();
    let report = session.reload().unwrap().expect("model changed");

    assert_eq!(reachable(&report), vec![ENTRY, "app.Base.foo()V"]);
    assert_eq!(report.generation, 1);
    let state = session.state();
    assert_eq!(state.status, WatchStatus::Watching);
    assert_eq!(state.runs, 2);
    assert_eq!(state.last_changed, vec!["app.A".to_string()]);
    assert_eq!(state.last_eviction.unwrap().method_records, 1);

    let arguments = session.analyzer().variable_types(&ENTRY.parse().unwrap(), 1);
    assert_eq!(arguments.len(), 1);
}

#[test]
fn test_watch_reload_keeps_session_on_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, model(true)).unwrap();
    let (mut session, _) = WatchSession::start(request(&path, AnalyzerConfig::default())).unwrap();

    fs::write(&path, "{ not json").unwrap();
    assert!(session.reload().is_err());
    assert_eq!(session.analyzer().generation(), 0);
    assert!(session.analyzer().is_settled());
}

fn model_without_main() -> String {
    let mut model: serde_json::Value = serde_json::from_str(&model(true)).unwrap();
    model["classes"]
        .as_array_mut()
        .unwrap()
        .retain(|class| class["name"] != "app.Main");
    model.to_string()
}

#[test]
fn test_watch_recovers_entry_point_removed_for_one_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, model(true)).unwrap();
    let (mut session, _) = WatchSession::start(request(&path, AnalyzerConfig::default())).unwrap();

    fs::write(&path, model_without_main()).unwrap();
    let report = session.reload().unwrap().expect("model changed");
    assert!(report.methods.is_empty());
    assert_eq!(session.state().status, WatchStatus::Error);
    assert!(session
        .state()
        .last_error
        .as_deref()
        .is_some_and(|error| error.contains(ENTRY)));

    fs::write(&path, model(true)).unwrap();
    let report = session.reload().unwrap().expect("model changed");
    assert_eq!(reachable(&report), vec![ENTRY, "app.A.foo()V"]);
    assert_eq!(session.state().status, WatchStatus::Watching);
    assert_eq!(session.state().last_error, None);
    assert_eq!(
        session.analyzer().variable_types(&ENTRY.parse().unwrap(), 1).len(),
        1
    );
}
