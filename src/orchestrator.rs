// Analysis Orchestrator
//
// Sequences one request through the pipeline:
//   Validating -> Materializing -> ResolvingVersion -> Analyzing -> Normalizing -> Cleanup -> Done
//
// Validation failures are the only hard errors. From Materializing onward every
// failure (including a panic) becomes `AnalysisResult { success: false }`, and
// Cleanup runs no matter which stage failed.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{ServiceConfig, ToolchainIsolation};
use crate::engine::{AnalysisRunner, RawEngineOutput};
use crate::error::{AnalysisError, ProcessError, ValidationError};
use crate::report::{normalize, AnalysisResult};
use crate::request::{AnalysisRequest, SourceFile};
use crate::toolchain::{ResolvedVersion, SolcSelect, ToolchainManager, ToolchainResolver};
use crate::workspace::{Workspace, WorkspaceManager};

/// Occupancy of the bounded analysis pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotStats {
    pub available: usize,
    pub in_use: usize,
    pub max_total: usize,
}

pub struct Orchestrator {
    workspaces: WorkspaceManager,
    resolver: ToolchainResolver,
    runner: AnalysisRunner,
    isolation: ToolchainIsolation,
    slots: Arc<Semaphore>,
    max_slots: usize,
    /// Held across activation and the engine run in `Serialized` mode
    toolchain_lock: Mutex<()>,
}

impl Orchestrator {
    /// Build the production pipeline, backed by the configured toolchain manager CLI
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ProcessError> {
        let manager = SolcSelect::from_config(&config.toolchain)?;
        Self::new(config, Arc::new(manager))
    }

    pub fn new(
        config: &ServiceConfig,
        manager: Arc<dyn ToolchainManager>,
    ) -> Result<Self, ProcessError> {
        let max_slots = config.limits.max_concurrent_analyses.max(1);

        Ok(Self {
            workspaces: WorkspaceManager::new(&config.workspace),
            resolver: ToolchainResolver::new(manager, &config.toolchain),
            runner: AnalysisRunner::from_config(&config.engine)?,
            isolation: config.toolchain.isolation,
            slots: Arc::new(Semaphore::new(max_slots)),
            max_slots,
            toolchain_lock: Mutex::new(()),
        })
    }

    pub fn runner(&self) -> &AnalysisRunner {
        &self.runner
    }

    pub fn resolver(&self) -> &ToolchainResolver {
        &self.resolver
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn slot_stats(&self) -> SlotStats {
        let available = self.slots.available_permits();
        SlotStats {
            available,
            in_use: self.max_slots.saturating_sub(available),
            max_total: self.max_slots,
        }
    }

    /// Analyze with the engine's configured timeout
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, ValidationError> {
        let timeout = self.runner.default_timeout();
        self.analyze_with_timeout(request, timeout).await
    }

    pub async fn analyze_with_timeout(
        &self,
        request: AnalysisRequest,
        timeout: Duration,
    ) -> Result<AnalysisResult, ValidationError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("analyze", request_id = %request_id);

        async move {
            // Validating
            let main = match request.main_file() {
                Ok(main) => main,
                Err(e) => {
                    warn!("🚫 Rejected request: {}", e);
                    return Err(e);
                }
            };
            let main_file = main.relative_path.clone();
            let requested_version = request
                .compiler_version
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.resolver.detect_version(&main.content));

            info!(
                files = request.files.len(),
                main_file = %main_file,
                requested_version = %requested_version,
                "📥 Analysis request accepted"
            );

            Ok(self
                .execute(&request.files, &main_file, &requested_version, timeout)
                .await)
        }
        .instrument(span)
        .await
    }

    /// Everything after validation. Always returns a well-formed result.
    async fn execute(
        &self,
        files: &[SourceFile],
        main_file: &str,
        requested_version: &str,
        timeout: Duration,
    ) -> AnalysisResult {
        let _permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            Err(e) => return AnalysisResult::failure(format!("Analysis pool closed: {}", e), 0),
        };

        // Materializing starts the clock
        let start = Instant::now();

        let mut workspace = match self.workspaces.create().await {
            Ok(workspace) => workspace,
            Err(e) => {
                error!("❌ Workspace creation failed: {}", e);
                return AnalysisResult::failure(e.to_string(), elapsed_ms(start));
            }
        };

        let outcome = AssertUnwindSafe(self.run_pipeline(
            &workspace,
            files,
            main_file,
            requested_version,
            timeout,
        ))
        .catch_unwind()
        .await;

        // Cleanup
        workspace.destroy().await;

        let duration_ms = elapsed_ms(start);
        let result = match outcome {
            Ok(Ok(mut result)) => {
                result.duration_ms = duration_ms;
                result
            }
            Ok(Err(e)) => {
                warn!("❌ Analysis failed: {}", e);
                AnalysisResult::failure(e.to_string(), duration_ms)
            }
            Err(panic) => {
                let e = AnalysisError::Panicked(panic_message(panic.as_ref()));
                error!("💥 {}", e);
                AnalysisResult::failure(e.to_string(), duration_ms)
            }
        };

        info!(
            success = result.success,
            findings = result.summary.total,
            duration_ms = result.duration_ms,
            "🏁 Analysis finished"
        );
        result
    }

    async fn run_pipeline(
        &self,
        workspace: &Workspace,
        files: &[SourceFile],
        main_file: &str,
        requested_version: &str,
        timeout: Duration,
    ) -> Result<AnalysisResult, AnalysisError> {
        workspace.materialize(files).await?;

        let (resolved, raw) = self
            .resolve_and_run(workspace, main_file, requested_version, timeout)
            .await;
        if resolved.fell_back() {
            info!(
                "Compiler {} unavailable, analyzed with {}",
                resolved.requested, resolved.actual
            );
        }

        let engine_version = self.runner.version().await;

        let mut result = normalize(&raw);
        result.resolved_compiler_version = Some(resolved.actual);
        result.engine_version = engine_version;
        Ok(result)
    }

    /// ResolvingVersion + Analyzing, isolated from other requests' compiler selection
    async fn resolve_and_run(
        &self,
        workspace: &Workspace,
        main_file: &str,
        requested_version: &str,
        timeout: Duration,
    ) -> (ResolvedVersion, RawEngineOutput) {
        match self.isolation {
            ToolchainIsolation::PerInvocation => {
                let resolved = self.resolver.ensure_active(requested_version).await;
                let raw = self
                    .runner
                    .run(workspace, main_file, Some(&resolved.actual), timeout)
                    .await;
                (resolved, raw)
            }
            ToolchainIsolation::Serialized => {
                let _guard = self.toolchain_lock.lock().await;
                debug!("🔒 Holding toolchain lock");
                let resolved = self.resolver.ensure_active(requested_version).await;
                let raw = self.runner.run(workspace, main_file, None, timeout).await;
                (resolved, raw)
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
