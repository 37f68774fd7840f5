// Request types accepted by the analysis pipeline

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// File extension the analysis engine treats as a compilable source
pub const SOURCE_EXTENSION: &str = ".sol";

/// Client paths may use Windows separators; everything downstream sees `/`
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// One contract source file, addressed relative to the workspace root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    #[serde(rename = "path", alias = "relative_path")]
    pub relative_path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }

    pub fn normalized_path(&self) -> String {
        normalize_separators(&self.relative_path)
    }

    pub fn is_source(&self) -> bool {
        self.relative_path.ends_with(SOURCE_EXTENSION)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub main_file: Option<String>,
    #[serde(default, rename = "solc_version", alias = "compiler_version")]
    pub compiler_version: Option<String>,
}

impl AnalysisRequest {
    /// Reject requests that cannot be analyzed and pick the main file.
    ///
    /// An explicit `main_file` must name one of the request's files; otherwise
    /// the first file with a `.sol` extension is used.
    pub fn main_file(&self) -> Result<&SourceFile, ValidationError> {
        if self.files.is_empty() {
            return Err(ValidationError::NoFiles);
        }

        match self.main_file.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => {
                let wanted = normalize_separators(name);
                self.files
                    .iter()
                    .find(|file| file.normalized_path() == wanted)
                    .ok_or_else(|| ValidationError::MainFileNotFound(name.to_string()))
            }
            None => self
                .files
                .iter()
                .find(|file| file.is_source())
                .ok_or(ValidationError::NoMainFile),
        }
    }
}
