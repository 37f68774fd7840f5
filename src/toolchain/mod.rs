// src/toolchain/mod.rs
//! Compiler Toolchain Resolution
//!
//! Decides which compiler version an analysis runs under and makes sure it is
//! installed and selected. Resolution order for a requested version:
//! 1. already installed -> activate it
//! 2. install it -> activate it
//! 3. first installed candidate from the same major.minor line
//!    (patches `.28, .26, .24, .20, .19, .0` by default)
//! 4. the default version, activated unconditionally
//!
//! Resolution is total: tool failures are logged and fed into the next step,
//! never returned to the caller.

pub mod manager;
pub mod pragma;

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ToolchainConfig;

pub use manager::{SolcSelect, ToolchainManager, SOLC_VERSION_ENV};
pub use pragma::{detect_version, find_pragma_version};

/// Requested version vs. the version that ended up active
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub requested: String,
    pub actual: String,
}

impl ResolvedVersion {
    pub fn fell_back(&self) -> bool {
        self.requested != self.actual
    }
}

pub struct ToolchainResolver {
    manager: Arc<dyn ToolchainManager>,
    default_version: String,
    fallback_patches: Vec<u32>,
}

impl ToolchainResolver {
    pub fn new(manager: Arc<dyn ToolchainManager>, config: &ToolchainConfig) -> Self {
        Self {
            manager,
            default_version: config.default_version.clone(),
            fallback_patches: config.fallback_patches.clone(),
        }
    }

    pub fn manager(&self) -> &Arc<dyn ToolchainManager> {
        &self.manager
    }

    /// Version named by the source's pragma, or the configured default
    pub fn detect_version(&self, source: &str) -> String {
        find_pragma_version(source).unwrap_or_else(|| self.default_version.clone())
    }

    /// Same-line candidates tried when `version` cannot be installed
    pub fn fallback_candidates(&self, version: &str) -> Vec<String> {
        let line = pragma::major_minor(version);
        self.fallback_patches
            .iter()
            .map(|patch| format!("{}.{}", line, patch))
            .filter(|candidate| pragma::is_plain_version(candidate))
            .collect()
    }

    /// Make some compiler version active, preferring `version`. Never fails.
    pub async fn ensure_active(&self, version: &str) -> ResolvedVersion {
        let installed = match self.manager.installed_versions().await {
            Ok(versions) => versions,
            Err(e) => {
                warn!("⚠️ Could not list installed compilers: {}", e);
                Vec::new()
            }
        };

        if pragma::is_plain_version(version) {
            if installed.iter().any(|v| v == version) {
                debug!("Compiler {} already installed", version);
                self.activate(version).await;
                return self.resolved(version, version);
            }

            info!("📦 Installing compiler {}", version);
            match self.manager.install(version).await {
                Ok(()) => {
                    self.activate(version).await;
                    return self.resolved(version, version);
                }
                Err(e) => warn!("⚠️ Installing compiler {} failed: {}", version, e),
            }
        } else {
            warn!("⚠️ '{}' is not a plain X.Y.Z version, skipping install", version);
        }

        if let Some(candidate) = self
            .fallback_candidates(version)
            .into_iter()
            .find(|candidate| installed.contains(candidate))
        {
            info!("↩️ Falling back from {} to installed compiler {}", version, candidate);
            self.activate(&candidate).await;
            return self.resolved(version, &candidate);
        }

        info!(
            "↩️ No usable compiler for {}, using default {}",
            version, self.default_version
        );
        let default = self.default_version.clone();
        self.activate(&default).await;
        self.resolved(version, &default)
    }

    async fn activate(&self, version: &str) {
        if let Err(e) = self.manager.activate(version).await {
            warn!("⚠️ Activating compiler {} failed: {}", version, e);
        }
    }

    fn resolved(&self, requested: &str, actual: &str) -> ResolvedVersion {
        ResolvedVersion {
            requested: requested.to_string(),
            actual: actual.to_string(),
        }
    }
}
