//! Markdown rendering of an analysis result, for merging into audit reports.

use std::fmt::Write;

use super::{AnalysisResult, Impact};

const UNKNOWN: &str = "unknown";

fn marker(impact: &Impact) -> &'static str {
    match impact {
        Impact::High => "🔴",
        Impact::Medium => "🟠",
        Impact::Low => "🟡",
        Impact::Informational => "🔵",
        _ => "⚪",
    }
}

pub fn render(result: &AnalysisResult) -> String {
    let engine = result.engine_version.as_deref().unwrap_or(UNKNOWN);
    let compiler = result.resolved_compiler_version.as_deref().unwrap_or(UNKNOWN);

    if !result.success {
        if let Some(error) = &result.error {
            return format!("## Static Analysis\n\n> ⚠️ Analysis failed: {}\n", error);
        }
    }

    if result.findings.is_empty() {
        return format!(
            "## Static Analysis\n\n✅ No known vulnerability patterns detected.\n\n\
             *Duration: {}ms | Slither {} | solc {}*\n",
            result.duration_ms, engine, compiler
        );
    }

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "## Static Analysis Results\n");
    let _ = writeln!(
        out,
        "*Detected **{}** findings | Duration: {}ms | Slither {} | solc {}*\n",
        result.summary.total, result.duration_ms, engine, compiler
    );

    let _ = writeln!(out, "### Summary\n");
    let _ = writeln!(out, "| Impact | Count |");
    let _ = writeln!(out, "|--------|-------|");
    for impact in &Impact::BUCKETS {
        let count = result.summary.count(impact);
        if count > 0 {
            let _ = writeln!(out, "| {} {} | {} |", marker(impact), impact, count);
        }
    }
    let _ = writeln!(out);

    for impact in &Impact::BUCKETS {
        let group: Vec<_> = result.findings_with_impact(impact).collect();
        if group.is_empty() {
            continue;
        }

        let _ = writeln!(out, "### {} {} Severity\n", marker(impact), impact);
        for finding in group {
            match &finding.swc_id {
                Some(swc) => {
                    let _ = writeln!(out, "#### {} ({})\n", finding.check, swc);
                }
                None => {
                    let _ = writeln!(out, "#### {}\n", finding.check);
                }
            }
            let _ = writeln!(out, "{}\n", finding.description.trim());

            let locations = finding.locations();
            if !locations.is_empty() {
                let _ = writeln!(out, "**Locations:**");
                for (file, first, last) in locations {
                    let _ = writeln!(out, "- `{}` (lines {}-{})", file, first, last);
                }
                let _ = writeln!(out);
            }
        }
    }

    out
}
