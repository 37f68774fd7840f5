// Result normalization
//
// Shapes raw engine output into typed findings plus a per-impact summary.
// Timing and tool version fields are filled in by the orchestrator.

pub mod finding;
pub mod markdown;

use serde::{Deserialize, Serialize};

use crate::engine::RawEngineOutput;

pub use finding::{Confidence, Finding, Impact};

/// Finding counts per impact bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub informational: usize,
    pub optimization: usize,
}

impl Summary {
    /// `total` counts everything; buckets count exact impact labels only
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Summary {
            total: findings.len(),
            ..Summary::default()
        };

        for finding in findings {
            match finding.impact {
                Impact::High => summary.high += 1,
                Impact::Medium => summary.medium += 1,
                Impact::Low => summary.low += 1,
                Impact::Informational => summary.informational += 1,
                Impact::Optimization => summary.optimization += 1,
                Impact::Unknown | Impact::Other(_) => {}
            }
        }
        summary
    }

    pub fn count(&self, impact: &Impact) -> usize {
        match impact {
            Impact::High => self.high,
            Impact::Medium => self.medium,
            Impact::Low => self.low,
            Impact::Informational => self.informational,
            Impact::Optimization => self.optimization,
            Impact::Unknown | Impact::Other(_) => 0,
        }
    }
}

/// Outcome of one analysis request.
///
/// `success: false` means the pipeline could not complete; a clean scan is
/// `success: true` with no findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, rename = "solc_version")]
    pub resolved_compiler_version: Option<String>,
    #[serde(default, rename = "slither_version")]
    pub engine_version: Option<String>,
}

impl AnalysisResult {
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            findings: Vec::new(),
            summary: Summary::default(),
            error: Some(error.into()),
            duration_ms,
            resolved_compiler_version: None,
            engine_version: None,
        }
    }

    pub fn findings_with_impact<'a>(&'a self, impact: &'a Impact) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| &f.impact == impact)
    }
}

/// Convert raw engine output into findings and a summary
pub fn normalize(raw: &RawEngineOutput) -> AnalysisResult {
    let findings: Vec<Finding> = raw.detectors().iter().map(Finding::from_detector).collect();
    let summary = Summary::from_findings(&findings);

    AnalysisResult {
        success: raw.success(),
        findings,
        summary,
        error: raw.error(),
        duration_ms: 0,
        resolved_compiler_version: None,
        engine_version: None,
    }
}
