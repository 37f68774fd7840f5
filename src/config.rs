// Service configuration
//
// Layered the same way everywhere: built-in defaults, then an optional TOML
// file, then SOLSCAN_* environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "SOLSCAN_CONFIG";

/// Compiler version used whenever nothing better can be determined
pub const DEFAULT_COMPILER_VERSION: &str = "0.8.28";

/// Patch numbers tried (in order) within the requested major.minor line
pub const DEFAULT_FALLBACK_PATCHES: [u32; 6] = [28, 26, 24, 20, 19, 0];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
    pub server: ServerConfig,
    pub workspace: WorkspaceSettings,
    pub engine: EngineConfig,
    pub toolchain: ToolchainConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where per-request workspaces are created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub root: PathBuf,
    pub prefix: String,
    pub max_name_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Program plus leading arguments, e.g. `["slither"]` or `["python3", "-m", "slither"]`
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Directories the engine must not report findings from
    pub exclude_paths: Vec<String>,
    pub version_timeout_secs: u64,
    pub detectors_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub manager_command: Vec<String>,
    pub compiler_command: Vec<String>,
    pub default_version: String,
    pub fallback_patches: Vec<u32>,
    pub install_timeout_secs: u64,
    pub query_timeout_secs: u64,
    pub isolation: ToolchainIsolation,
}

/// How concurrent requests are kept from observing each other's compiler selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolchainIsolation {
    /// The resolved version is handed to each engine invocation via `SOLC_VERSION`
    #[default]
    PerInvocation,
    /// A process-wide lock spans version activation and the engine run
    Serialized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_concurrent_analyses: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8545,
        }
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("solscan-contracts"),
            prefix: "slither_".to_string(),
            max_name_attempts: 16,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: vec!["slither".to_string()],
            timeout_secs: 120,
            exclude_paths: vec!["node_modules".to_string()],
            version_timeout_secs: 10,
            detectors_timeout_secs: 30,
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            manager_command: vec!["solc-select".to_string()],
            compiler_command: vec!["solc".to_string()],
            default_version: DEFAULT_COMPILER_VERSION.to_string(),
            fallback_patches: DEFAULT_FALLBACK_PATCHES.to_vec(),
            install_timeout_secs: 120,
            query_timeout_secs: 30,
            isolation: ToolchainIsolation::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_analyses: num_cpus::get().max(1),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".solscan/logs"),
            file_logging: true,
        }
    }
}

impl ServerConfig {
    /// Bind the listening socket. `host` may be a name ("localhost") or an IP literal.
    pub async fn bind(&self) -> std::io::Result<tokio::net::TcpListener> {
        tokio::net::TcpListener::bind((self.host.as_str(), self.port)).await
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServiceConfig {
    /// Load configuration: defaults, then `path` (or `$SOLSCAN_CONFIG`), then env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                let mut config = Self::from_file(&path)?;
                config.source = Some(path);
                config
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SOLSCAN_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SOLSCAN_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("SOLSCAN_PORT is not a valid port: {}", port))?;
        }
        if let Some(root) = std::env::var_os("SOLSCAN_WORKSPACE_ROOT") {
            self.workspace.root = PathBuf::from(root);
        }
        if let Ok(max) = std::env::var("SOLSCAN_MAX_CONCURRENT") {
            self.limits.max_concurrent_analyses = max
                .parse()
                .with_context(|| format!("SOLSCAN_MAX_CONCURRENT is not a number: {}", max))?;
        }
        if let Ok(secs) = std::env::var("SOLSCAN_ENGINE_TIMEOUT_SECS") {
            self.engine.timeout_secs = secs
                .parse()
                .with_context(|| format!("SOLSCAN_ENGINE_TIMEOUT_SECS is not a number: {}", secs))?;
        }
        if let Some(dir) = std::env::var_os("SOLSCAN_LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Expand `~` and `$VAR` in configured paths
    fn expand_paths(&mut self) -> Result<()> {
        self.workspace.root = expand(&self.workspace.root)?;
        self.logging.directory = expand(&self.logging.directory)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.engine.command.is_empty() {
            anyhow::bail!("engine.command must name a program");
        }
        if self.toolchain.manager_command.is_empty() {
            anyhow::bail!("toolchain.manager_command must name a program");
        }
        if self.limits.max_concurrent_analyses == 0 {
            anyhow::bail!("limits.max_concurrent_analyses must be at least 1");
        }
        if self.workspace.max_name_attempts == 0 {
            anyhow::bail!("workspace.max_name_attempts must be at least 1");
        }
        Ok(())
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
