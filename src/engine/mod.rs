// src/engine/mod.rs
//! Analysis Engine Runner
//!
//! Runs the external static-analysis engine (Slither's CLI contract) against a
//! materialized workspace and turns whatever comes back into a raw report.
//! Every failure, including launch errors and timeouts, comes back as a
//! synthesized report with `success: false`; nothing escapes as an error.

pub mod parse;

use serde_json::{json, Value};
use std::ffi::OsString;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, ProcessError};
use crate::process::CommandLine;
use crate::toolchain::SOLC_VERSION_ENV;
use crate::workspace::Workspace;

pub use parse::parse_engine_stdout;

/// Longest stderr excerpt carried into a failure message
pub const MAX_STDERR_CHARS: usize = 2000;

const NO_OUTPUT_MESSAGE: &str = "No output from analysis engine";

/// The engine's JSON report, or a synthesized report of the same shape
#[derive(Debug, Clone, PartialEq)]
pub struct RawEngineOutput {
    document: Value,
}

impl RawEngineOutput {
    pub fn from_document(document: Value) -> Self {
        Self { document }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            document: json!({
                "success": false,
                "error": message.into(),
                "results": { "detectors": [] },
            }),
        }
    }

    /// The engine's own verdict; reports without one count as successful
    pub fn success(&self) -> bool {
        self.document
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn error(&self) -> Option<String> {
        self.document
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Raw detector records from `results.detectors`, empty when absent
    pub fn detectors(&self) -> &[Value] {
        self.document
            .get("results")
            .and_then(|results| results.get("detectors"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisRunner {
    engine: CommandLine,
    exclude_paths: Vec<String>,
    timeout: Duration,
    version_timeout: Duration,
    detectors_timeout: Duration,
}

impl AnalysisRunner {
    pub fn from_config(config: &EngineConfig) -> Result<Self, ProcessError> {
        Ok(Self {
            engine: CommandLine::from_parts(&config.command)?,
            exclude_paths: config.exclude_paths.clone(),
            timeout: config.timeout(),
            version_timeout: Duration::from_secs(config.version_timeout_secs),
            detectors_timeout: Duration::from_secs(config.detectors_timeout_secs),
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    /// Engine arguments: target, JSON report on stdout, no failure exit on findings,
    /// and dependency directories filtered out
    pub fn arguments(&self, target: impl Into<OsString>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            target.into(),
            "--json".into(),
            "-".into(),
            "--no-fail".into(),
        ];
        if !self.exclude_paths.is_empty() {
            args.push("--filter-paths".into());
            args.push(self.exclude_paths.join("|").into());
        }
        args
    }

    /// Analyze `main_file` inside `workspace`, bounded by `timeout`.
    ///
    /// When `compiler_version` is given it is passed to the engine's process
    /// environment, so this run does not depend on the global compiler selection.
    pub async fn run(
        &self,
        workspace: &Workspace,
        main_file: &str,
        compiler_version: Option<&str>,
        timeout: Duration,
    ) -> RawEngineOutput {
        match self.try_run(workspace, main_file, compiler_version, timeout).await {
            Ok(output) => output,
            Err(e) => {
                warn!("❌ Analysis engine failed: {}", e);
                RawEngineOutput::failure(e.to_string())
            }
        }
    }

    async fn try_run(
        &self,
        workspace: &Workspace,
        main_file: &str,
        compiler_version: Option<&str>,
        timeout: Duration,
    ) -> Result<RawEngineOutput, EngineError> {
        let target = workspace
            .resolve(main_file)
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        let envs: Vec<(&str, &str)> = compiler_version
            .map(|version| vec![(SOLC_VERSION_ENV, version)])
            .unwrap_or_default();

        info!("🔍 Running {} on {}", self.engine.program(), main_file);
        let output = self
            .engine
            .run_in(self.arguments(target), Some(workspace.root()), &envs, timeout)
            .await?;

        debug!(
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "engine finished"
        );

        if let Some(document) = parse_engine_stdout(&output.stdout) {
            return Ok(RawEngineOutput::from_document(document));
        }

        Err(EngineError::NoJsonOutput(stderr_excerpt(&output.stderr)))
    }

    /// Engine version string, `None` if it cannot be determined
    pub async fn version(&self) -> Option<String> {
        match self.engine.run(["--version"], self.version_timeout).await {
            Ok(output) => Some(output.stdout.trim().to_string()).filter(|v| !v.is_empty()),
            Err(e) => {
                debug!("Engine version query failed: {}", e);
                None
            }
        }
    }

    /// The engine's own detector catalogue
    pub async fn list_detectors(&self) -> Result<Vec<Value>, EngineError> {
        let output = self
            .engine
            .run(["--list-detectors-json"], self.detectors_timeout)
            .await?;

        let stdout = output.stdout.trim();
        if stdout.is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(stdout) {
            Ok(Value::Array(detectors)) => Ok(detectors),
            Ok(other) => Err(EngineError::Malformed(format!(
                "expected a JSON array of detectors, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(EngineError::Malformed(e.to_string())),
        }
    }
}

/// First `MAX_STDERR_CHARS` characters of stderr, or a fixed message when empty
pub fn stderr_excerpt(stderr: &str) -> String {
    if stderr.is_empty() {
        NO_OUTPUT_MESSAGE.to_string()
    } else {
        stderr.chars().take(MAX_STDERR_CHARS).collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
