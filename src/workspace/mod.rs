// src/workspace/mod.rs
//! Per-request workspace management
//!
//! Every analysis gets its own uniquely-named directory under the configured
//! root. The directory holds exactly the files of that request and is removed
//! when the request finishes, whichever way it finishes:
//! - `Workspace::destroy` on the normal and handled-error paths
//! - `Drop` as the last resort when a task unwinds or is cancelled

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::WorkspaceSettings;
use crate::error::WorkspaceError;
use crate::request::{normalize_separators, SourceFile};

/// Allocates isolated workspaces under one root directory
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    prefix: String,
    max_attempts: usize,
}

impl WorkspaceManager {
    pub fn new(settings: &WorkspaceSettings) -> Self {
        Self {
            root: settings.root.clone(),
            prefix: settings.prefix.clone(),
            max_attempts: settings.max_name_attempts.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, uniquely-named workspace directory
    pub async fn create(&self) -> Result<Workspace, WorkspaceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| WorkspaceError::CreateFailed {
                root: self.root.clone(),
                source,
            })?;

        for attempt in 1..=self.max_attempts {
            let name = format!("{}{}", self.prefix, Uuid::new_v4().simple());
            let path = self.root.join(name);

            // create_dir (not create_dir_all) so a name collision is detected
            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!("📁 Created workspace {} (attempt {})", path.display(), attempt);
                    return Ok(Workspace::new(path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Workspace name collision at {}, retrying", path.display());
                }
                Err(source) => {
                    return Err(WorkspaceError::CreateFailed {
                        root: self.root.clone(),
                        source,
                    });
                }
            }
        }

        Err(WorkspaceError::NamesExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// One request's private directory
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    destroyed: bool,
}

impl Workspace {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            destroyed: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request-supplied relative path inside this workspace.
    ///
    /// Resolution is lexical: absolute paths, drive prefixes and any `..`
    /// component are rejected outright rather than normalized away.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, WorkspaceError> {
        let relative = clean_relative_path(relative_path)?;
        let resolved = self.root.join(&relative);

        if !resolved.starts_with(&self.root) {
            return Err(WorkspaceError::PathTraversal(relative_path.to_string()));
        }
        Ok(resolved)
    }

    /// Write one file, creating intermediate directories as needed
    pub async fn write(&self, file: &SourceFile) -> Result<PathBuf, WorkspaceError> {
        let path = self.resolve(&file.relative_path)?;
        write_resolved(&path, file.content.as_bytes()).await?;
        Ok(path)
    }

    /// Write every file of a request.
    ///
    /// All paths are resolved before the first byte is written, so a request
    /// containing a single escaping path leaves the workspace untouched.
    pub async fn materialize(&self, files: &[SourceFile]) -> Result<Vec<PathBuf>, WorkspaceError> {
        let resolved = files
            .iter()
            .map(|file| self.resolve(&file.relative_path))
            .collect::<Result<Vec<_>, _>>()?;

        for (path, file) in resolved.iter().zip(files) {
            write_resolved(path, file.content.as_bytes()).await?;
        }

        debug!("📝 Materialized {} files into {}", files.len(), self.root.display());
        Ok(resolved)
    }

    /// Remove the workspace directory. Idempotent; failures are logged, never returned.
    pub async fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!("🧹 Removed workspace {}", self.root.display());
                self.destroyed = true;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.destroyed = true;
            }
            Err(e) => {
                // Left for Drop to retry
                warn!("Failed to remove workspace {}: {}", self.root.display(), e);
            }
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove workspace {} on drop: {}", self.root.display(), e);
            }
        }
    }
}

async fn write_resolved(path: &Path, content: &[u8]) -> Result<(), WorkspaceError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| WorkspaceError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|source| WorkspaceError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Turn a client path into a clean relative path, or refuse it
fn clean_relative_path(raw: &str) -> Result<PathBuf, WorkspaceError> {
    let normalized = normalize_separators(raw);
    if normalized.trim().is_empty() {
        return Err(WorkspaceError::InvalidPath(raw.to_string()));
    }

    let mut clean = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(WorkspaceError::PathTraversal(raw.to_string()));
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(WorkspaceError::InvalidPath(raw.to_string()));
    }
    Ok(clean)
}
