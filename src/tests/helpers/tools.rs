//! Stand-ins for the external tools.
//!
//! Scripts are run as `sh <script>` so nothing has to be marked executable,
//! and tests never exec a file that was just written.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use crate::config::ServiceConfig;
use crate::error::ToolchainError;
use crate::toolchain::ToolchainManager;

use super::unique_temp_dir;

/// A realistic engine report with one High and two Low findings
pub const THREE_FINDINGS_REPORT: &str = r#"{"success":true,"error":null,"results":{"detectors":[{"check":"reentrancy-eth","impact":"High","confidence":"Medium","description":"Reentrancy in Vault.withdraw()","elements":[{"type":"function","name":"withdraw","source_mapping":{"filename_relative":"contracts/Vault.sol","lines":[12,13,14,15]}}],"id":"abc123"},{"check":"solc-version","impact":"Low","confidence":"High","description":"Pragma version too recent"},{"check":"timestamp","impact":"Low","confidence":"Medium","description":"Dangerous comparison"}]}}"#;

/// Config with every external tool pointing at a binary that does not exist
pub fn test_config(root: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.workspace.root = root.join("workspaces");
    config.engine.command = vec!["solscan-test-missing-engine".to_string()];
    config.engine.timeout_secs = 20;
    config.engine.version_timeout_secs = 5;
    config.engine.detectors_timeout_secs = 5;
    config.toolchain.manager_command = vec!["solscan-test-missing-solc-select".to_string()];
    config.toolchain.compiler_command = vec!["solscan-test-missing-solc".to_string()];
    config.toolchain.install_timeout_secs = 5;
    config.toolchain.query_timeout_secs = 5;
    config.limits.max_concurrent_analyses = 4;
    config.logging.file_logging = false;
    config
}

/// Write a shell script and return the command line that runs it
pub fn write_script(dir: &Path, name: &str, body: &str) -> Vec<String> {
    let path: PathBuf = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    vec!["sh".to_string(), path.to_string_lossy().into_owned()]
}

/// Fake engine: answers `--version` and `--list-detectors-json`, runs
/// `analysis_body` for anything else (with the target file as `$1`)
pub fn engine_script(analysis_body: &str) -> String {
    format!(
        r#"case "$1" in
  --version) echo "0.10.4" ;;
  --list-detectors-json) echo '[{{"check":"reentrancy-eth","impact":"High","confidence":"Medium"}},{{"check":"timestamp","impact":"Low","confidence":"Medium"}}]' ;;
  *)
{}
  ;;
esac"#,
        analysis_body
    )
}

/// solc-select stand-in: 0.8.19 and 0.8.28 installed, every install fails
pub const SOLC_SELECT_SCRIPT: &str = r#"case "$1" in
  versions) printf '0.8.19 (current, set by /tmp/global-version)\n0.8.28\n' ;;
  install) echo "Unknown version '$2'" >&2; exit 1 ;;
  use) echo "Switched global version to $2" ;;
  *) exit 2 ;;
esac"#;

pub const SOLC_SCRIPT: &str = r#"echo "solc, the solidity compiler commandline interface"
echo "Version: 0.8.19+commit.7dd6d404.Linux.g++""#;

/// A temp directory holding fake engine and toolchain scripts
pub struct FakeTools {
    pub dir: TempDir,
    config: ServiceConfig,
}

impl FakeTools {
    pub fn new(test_name: &str, analysis_body: &str) -> Self {
        let dir = unique_temp_dir(test_name);
        let mut config = test_config(dir.path());
        config.engine.command = write_script(dir.path(), "engine.sh", &engine_script(analysis_body));
        config.toolchain.manager_command =
            write_script(dir.path(), "solc-select.sh", SOLC_SELECT_SCRIPT);
        config.toolchain.compiler_command = write_script(dir.path(), "solc.sh", SOLC_SCRIPT);
        Self { dir, config }
    }

    /// Engine that prints `report` as its only output
    pub fn reporting(test_name: &str, report: &str) -> Self {
        Self::new(test_name, &format!("echo '{}'", report))
    }

    pub fn config(&self) -> ServiceConfig {
        self.config.clone()
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.config.workspace.root.clone()
    }

    /// Number of entries left under the workspace root
    pub fn leftover_workspaces(&self) -> usize {
        match std::fs::read_dir(self.workspace_root()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// In-memory toolchain manager that records every call
#[derive(Default)]
pub struct FakeToolchain {
    installed: Mutex<Vec<String>>,
    installable: Vec<String>,
    fail_listing: bool,
    active: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub fn with_installed(versions: &[&str]) -> Self {
        Self {
            installed: Mutex::new(versions.iter().map(|v| v.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn installable(mut self, versions: &[&str]) -> Self {
        self.installable = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn active(&self) -> Option<String> {
        self.active.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(action: &'static str, stderr: &str) -> ToolchainError {
        ToolchainError::CommandFailed {
            action,
            status: "exit status: 1".to_string(),
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
impl ToolchainManager for FakeToolchain {
    async fn installed_versions(&self) -> Result<Vec<String>, ToolchainError> {
        self.record("versions".to_string());
        if self.fail_listing {
            return Err(Self::failure("versions", "listing unavailable"));
        }
        Ok(self.installed.lock().unwrap().clone())
    }

    async fn install(&self, version: &str) -> Result<(), ToolchainError> {
        self.record(format!("install {}", version));
        if self.installable.iter().any(|v| v == version) {
            self.installed.lock().unwrap().push(version.to_string());
            Ok(())
        } else {
            Err(Self::failure("install", "unknown version"))
        }
    }

    async fn activate(&self, version: &str) -> Result<(), ToolchainError> {
        self.record(format!("use {}", version));
        if self.installed.lock().unwrap().iter().any(|v| v == version) {
            *self.active.lock().unwrap() = Some(version.to_string());
            Ok(())
        } else {
            Err(Self::failure("use", "version not installed"))
        }
    }

    async fn active_version(&self) -> Result<String, ToolchainError> {
        self.active()
            .ok_or_else(|| Self::failure("--version", "no compiler selected"))
    }
}
