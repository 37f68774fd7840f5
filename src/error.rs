// Error taxonomy for the analysis pipeline
//
// Only `ValidationError` ever crosses the service boundary as a hard failure.
// Every other kind is converted into a soft `AnalysisResult { success: false }`
// by the orchestrator, and `ToolchainError` never leaves the resolver at all.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Request rejected before any work begins (HTTP 400)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No contract files provided")]
    NoFiles,

    #[error("No .sol files found")]
    NoMainFile,

    #[error("Main file '{0}' is not part of the request")]
    MainFileNotFound(String),
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to create workspace under {root}: {source}")]
    CreateFailed {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not allocate a unique workspace name after {attempts} attempts")]
    NamesExhausted { attempts: usize },

    #[error("Path escapes the workspace root: {0}")]
    PathTraversal(String),

    #[error("Invalid file path: {0:?}")]
    InvalidPath(String),

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a bounded subprocess invocation
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("timed out after {}", format_duration(*.0))]
    Timeout(Duration),

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("empty command line")]
    EmptyCommand,
}

/// Toolchain manager failures. Always recovered by the resolver's fallback chain.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("toolchain manager {action} failed: {source}")]
    Process {
        action: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error("toolchain manager {action} exited with {status}: {stderr}")]
    CommandFailed {
        action: &'static str,
        status: String,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Analysis engine timed out after {}", format_duration(*.0))]
    Timeout(Duration),

    #[error("Failed to launch analysis engine: {0}")]
    Launch(String),

    #[error("{0}")]
    NoJsonOutput(String),

    #[error("Unexpected analysis engine output: {0}")]
    Malformed(String),
}

impl From<ProcessError> for EngineError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Timeout(limit) => EngineError::Timeout(limit),
            other => EngineError::Launch(other.to_string()),
        }
    }
}

/// Everything that can go wrong after validation has passed
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Analysis pipeline panicked: {0}")]
    Panicked(String),
}

/// Render a timeout the way users configure it: whole seconds when possible
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
