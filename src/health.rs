// Centralized Health Check System
//
// Reports the versions of the external tools the pipeline depends on. A failed
// probe degrades to "unknown"; the health check itself never fails.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::orchestrator::{Orchestrator, SlotStats};

pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(rename = "slither_version")]
    pub engine_version: String,
    #[serde(rename = "solc_version")]
    pub active_compiler_version: String,
    pub analysis_slots: SlotHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotHealth {
    pub available: usize,
    pub in_use: usize,
    pub max_total: usize,
}

impl From<SlotStats> for SlotHealth {
    fn from(stats: SlotStats) -> Self {
        Self {
            available: stats.available,
            in_use: stats.in_use,
            max_total: stats.max_total,
        }
    }
}

pub struct HealthChecker;

impl HealthChecker {
    pub async fn check(orchestrator: &Orchestrator) -> HealthReport {
        let (engine_version, compiler_version) = tokio::join!(
            orchestrator.runner().version(),
            orchestrator.resolver().manager().active_version(),
        );

        let active_compiler_version = match compiler_version {
            Ok(version) if !version.is_empty() => version,
            Ok(_) => UNKNOWN_VERSION.to_string(),
            Err(e) => {
                debug!("Compiler version probe failed: {}", e);
                UNKNOWN_VERSION.to_string()
            }
        };

        HealthReport {
            status: "healthy".to_string(),
            engine_version: engine_version.unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            active_compiler_version,
            analysis_slots: orchestrator.slot_stats().into(),
        }
    }

    /// One-line status for terminals and logs
    pub fn status_message(report: &HealthReport) -> String {
        let ready = report.engine_version != UNKNOWN_VERSION
            && report.active_compiler_version != UNKNOWN_VERSION;
        let marker = if ready { "🟢" } else { "🟡" };
        format!(
            "{} Slither {} | solc {} | slots {}/{} free",
            marker,
            report.engine_version,
            report.active_compiler_version,
            report.analysis_slots.available,
            report.analysis_slots.max_total
        )
    }
}
