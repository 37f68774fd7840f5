// Analysis runner tests
//
// The engine is a shell script; each test decides what it prints, how it
// exits, and how long it takes.

use serde_json::Value;
use std::time::{Duration, Instant};

use crate::engine::{parse_engine_stdout, stderr_excerpt, AnalysisRunner, RawEngineOutput};
use crate::request::SourceFile;
use crate::tests::helpers::tools::THREE_FINDINGS_REPORT;
use crate::tests::helpers::{test_config, unique_temp_dir, FakeTools};
use crate::workspace::{Workspace, WorkspaceManager};

async fn prepared_workspace(tools: &FakeTools) -> Workspace {
    let manager = WorkspaceManager::new(&tools.config().workspace);
    let workspace = manager.create().await.unwrap();
    workspace
        .materialize(&[SourceFile::new("contracts/A.sol", "pragma solidity ^0.8.19;")])
        .await
        .unwrap();
    workspace
}

fn runner_for(tools: &FakeTools) -> AnalysisRunner {
    AnalysisRunner::from_config(&tools.config().engine).unwrap()
}

// ----------------------------------------------------------------------------
// Output parsing
// ----------------------------------------------------------------------------

#[test]
fn test_parse_whole_document() {
    let doc = parse_engine_stdout("{\n  \"success\": true,\n  \"results\": {}\n}\n").unwrap();
    assert_eq!(doc["success"], Value::Bool(true));
}

#[test]
fn test_parse_skips_noise_before_json_line() {
    let stdout = format!(
        "Compiling contracts/A.sol...\nINFO:Detectors: 3 results\n{}\n",
        THREE_FINDINGS_REPORT
    );
    let doc = parse_engine_stdout(&stdout).unwrap();
    assert_eq!(doc["results"]["detectors"].as_array().unwrap().len(), 3);
}

#[test]
fn test_parse_rejects_non_reports() {
    assert_eq!(parse_engine_stdout(""), None);
    assert_eq!(parse_engine_stdout("   \n"), None);
    assert_eq!(parse_engine_stdout("[1, 2, 3]"), None);
    assert_eq!(parse_engine_stdout("Error: compilation failed\n{not json"), None);
}

#[test]
fn test_raw_output_defaults() {
    let raw = RawEngineOutput::from_document(serde_json::json!({"results": {}}));
    assert!(raw.success());
    assert_eq!(raw.error(), None);
    assert!(raw.detectors().is_empty());

    let failed = RawEngineOutput::failure("boom");
    assert!(!failed.success());
    assert_eq!(failed.error().as_deref(), Some("boom"));
    assert!(failed.detectors().is_empty());
}

#[test]
fn test_stderr_excerpt_is_bounded() {
    assert_eq!(stderr_excerpt(""), "No output from analysis engine");
    let long = "x".repeat(5000);
    assert_eq!(stderr_excerpt(&long).len(), 2000);
}

#[test]
fn test_arguments_filter_dependency_paths() {
    let dir = unique_temp_dir("engine_args");
    let mut config = test_config(dir.path()).engine;
    config.exclude_paths = vec!["node_modules".to_string(), "lib".to_string()];
    let runner = AnalysisRunner::from_config(&config).unwrap();

    let args: Vec<String> = runner
        .arguments("/ws/A.sol")
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        args,
        vec!["/ws/A.sol", "--json", "-", "--no-fail", "--filter-paths", "node_modules|lib"]
    );
}

// ----------------------------------------------------------------------------
// Engine invocation
// ----------------------------------------------------------------------------

#[cfg(unix)]
#[tokio::test]
async fn test_run_parses_report_behind_noise() {
    let body = format!("echo 'Compiling...'\necho '{}'", THREE_FINDINGS_REPORT);
    let tools = FakeTools::new("engine_report", &body);
    let workspace = prepared_workspace(&tools).await;

    let raw = runner_for(&tools)
        .run(&workspace, "contracts/A.sol", None, Duration::from_secs(20))
        .await;

    assert!(raw.success());
    assert_eq!(raw.detectors().len(), 3);
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_passes_compiler_version_and_workspace_cwd() {
    let body = r#"printf '{"success":true,"error":null,"results":{"detectors":[]},"solc":"%s","cwd":"%s","target":"%s"}\n' "$SOLC_VERSION" "$(pwd)" "$1""#;
    let tools = FakeTools::new("engine_env", body);
    let workspace = prepared_workspace(&tools).await;

    let raw = runner_for(&tools)
        .run(&workspace, "contracts/A.sol", Some("0.8.19"), Duration::from_secs(20))
        .await;

    let doc = raw.document();
    assert_eq!(doc["solc"], "0.8.19");
    let cwd = std::path::PathBuf::from(doc["cwd"].as_str().unwrap());
    assert_eq!(
        cwd.canonicalize().unwrap(),
        workspace.root().canonicalize().unwrap()
    );
    assert!(doc["target"].as_str().unwrap().ends_with("contracts/A.sol"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_without_json_reports_stderr() {
    let body = "echo 'Error: Source file requires different compiler version' >&2\nexit 1";
    let tools = FakeTools::new("engine_stderr", body);
    let workspace = prepared_workspace(&tools).await;

    let raw = runner_for(&tools)
        .run(&workspace, "contracts/A.sol", None, Duration::from_secs(20))
        .await;

    assert!(!raw.success());
    assert!(raw
        .error()
        .unwrap()
        .contains("requires different compiler version"));
    assert!(raw.detectors().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_with_no_output_at_all() {
    let tools = FakeTools::new("engine_silent", "exit 3");
    let workspace = prepared_workspace(&tools).await;

    let raw = runner_for(&tools)
        .run(&workspace, "contracts/A.sol", None, Duration::from_secs(20))
        .await;

    assert!(!raw.success());
    assert_eq!(raw.error().as_deref(), Some("No output from analysis engine"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_times_out_and_terminates_engine() {
    let tools = FakeTools::new("engine_timeout", "exec sleep 30");
    let workspace = prepared_workspace(&tools).await;

    let start = Instant::now();
    let raw = runner_for(&tools)
        .run(&workspace, "contracts/A.sol", None, Duration::from_secs(1))
        .await;

    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(!raw.success());
    let error = raw.error().unwrap();
    assert!(error.contains("timed out"), "unexpected error: {}", error);
    assert!(error.contains("1s"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_missing_engine_is_a_soft_failure() {
    let dir = unique_temp_dir("engine_missing");
    let config = test_config(dir.path());
    let runner = AnalysisRunner::from_config(&config.engine).unwrap();
    let manager = WorkspaceManager::new(&config.workspace);
    let workspace = manager.create().await.unwrap();

    let raw = runner
        .run(&workspace, "A.sol", None, Duration::from_secs(5))
        .await;

    assert!(!raw.success());
    assert!(raw.error().unwrap().contains("Failed to launch"));
    assert_eq!(runner.version().await, None);
    tokio_test::assert_err!(runner.list_detectors().await);
}

// ----------------------------------------------------------------------------
// Version and detector catalogue
// ----------------------------------------------------------------------------

#[cfg(unix)]
#[tokio::test]
async fn test_version_and_detector_listing() {
    let tools = FakeTools::new("engine_catalogue", "exit 0");
    let runner = runner_for(&tools);

    assert_eq!(runner.version().await.as_deref(), Some("0.10.4"));

    let detectors = tokio_test::assert_ok!(runner.list_detectors().await);
    assert_eq!(detectors.len(), 2);
    assert_eq!(detectors[0]["check"], "reentrancy-eth");
}

#[cfg(unix)]
#[tokio::test]
async fn test_detector_listing_rejects_non_array() {
    let dir = unique_temp_dir("engine_catalogue_bad");
    let mut config = test_config(dir.path());
    config.engine.command = crate::tests::helpers::tools::write_script(
        dir.path(),
        "engine.sh",
        "echo '{\"detectors\": []}'",
    );
    let runner = AnalysisRunner::from_config(&config.engine).unwrap();

    let err = runner.list_detectors().await.unwrap_err();
    assert!(err.to_string().contains("expected a JSON array"));
}
