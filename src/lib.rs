// Solscan - Smart Contract Static Analysis Service Library
//!
//! Solscan accepts Solidity sources, resolves the compiler version they need,
//! runs an external static-analysis engine (Slither) in an isolated workspace
//! and returns normalized, severity-bucketed findings.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod orchestrator;
pub mod process;
pub mod report;
pub mod request;
pub mod state;
pub mod toolchain;
pub mod workspace;

#[cfg(test)]
pub mod tests;

// Re-export common types
pub use config::ServiceConfig;
pub use error::{AnalysisError, ValidationError};
pub use orchestrator::Orchestrator;
pub use report::{AnalysisResult, Finding, Impact, Summary};
pub use request::{AnalysisRequest, SourceFile};
pub use state::AppState;
