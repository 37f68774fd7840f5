//! Toolchain manager seam and its `solc-select` implementation.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::config::ToolchainConfig;
use crate::error::{ProcessError, ToolchainError};
use crate::process::{CommandLine, ProcessOutput};

use super::pragma::is_plain_version;

/// Environment variable the solc-select shim reads to pick a compiler per invocation
pub const SOLC_VERSION_ENV: &str = "SOLC_VERSION";

static COMPILER_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version:\s*(\S+)").unwrap());

/// Operations the resolver needs from an external compiler version manager.
///
/// `activate` mutates process-wide state outside this service; see
/// `ToolchainIsolation` for how the orchestrator copes with that.
#[async_trait]
pub trait ToolchainManager: Send + Sync {
    /// Versions currently installed
    async fn installed_versions(&self) -> Result<Vec<String>, ToolchainError>;

    async fn install(&self, version: &str) -> Result<(), ToolchainError>;

    /// Make `version` the globally selected compiler
    async fn activate(&self, version: &str) -> Result<(), ToolchainError>;

    /// Version reported by the currently selected compiler binary
    async fn active_version(&self) -> Result<String, ToolchainError>;
}

/// `solc-select` (or anything with the same `versions`/`install`/`use` CLI)
#[derive(Debug, Clone)]
pub struct SolcSelect {
    manager: CommandLine,
    compiler: CommandLine,
    install_timeout: Duration,
    query_timeout: Duration,
}

impl SolcSelect {
    pub fn from_config(config: &ToolchainConfig) -> Result<Self, ProcessError> {
        let compiler = if config.compiler_command.is_empty() {
            CommandLine::from_parts(&["solc".to_string()])?
        } else {
            CommandLine::from_parts(&config.compiler_command)?
        };

        Ok(Self {
            manager: CommandLine::from_parts(&config.manager_command)?,
            compiler,
            install_timeout: Duration::from_secs(config.install_timeout_secs),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        })
    }

    async fn invoke(
        &self,
        action: &'static str,
        args: &[&str],
        limit: Duration,
    ) -> Result<ProcessOutput, ToolchainError> {
        let output = self
            .manager
            .run(args, limit)
            .await
            .map_err(|source| ToolchainError::Process { action, source })?;

        if !output.success {
            return Err(ToolchainError::CommandFailed {
                action,
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl ToolchainManager for SolcSelect {
    async fn installed_versions(&self) -> Result<Vec<String>, ToolchainError> {
        let output = self.invoke("versions", &["versions"], self.query_timeout).await?;
        let versions = parse_installed_versions(&output.stdout);
        debug!("Installed compiler versions: {:?}", versions);
        Ok(versions)
    }

    async fn install(&self, version: &str) -> Result<(), ToolchainError> {
        self.invoke("install", &["install", version], self.install_timeout)
            .await
            .map(|_| ())
    }

    async fn activate(&self, version: &str) -> Result<(), ToolchainError> {
        self.invoke("use", &["use", version], self.query_timeout)
            .await
            .map(|_| ())
    }

    async fn active_version(&self) -> Result<String, ToolchainError> {
        let output = self
            .compiler
            .run(["--version"], self.query_timeout)
            .await
            .map_err(|source| ToolchainError::Process {
                action: "--version",
                source,
            })?;
        Ok(parse_compiler_version(&output.stdout))
    }
}

/// Parse `solc-select versions` output, one version per line with optional annotations.
///
/// ```text
/// 0.8.19 (current, set by /root/.solc-select/global-version)
/// 0.8.28
/// ```
pub fn parse_installed_versions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|token| is_plain_version(token))
        .map(str::to_string)
        .collect()
}

/// Reduce `solc --version` output to its `Version:` value, or the trimmed text
pub fn parse_compiler_version(stdout: &str) -> String {
    COMPILER_VERSION_RE
        .captures(stdout)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| stdout.trim().to_string())
}
