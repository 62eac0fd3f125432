//! Content files.
//!
//! A content file is a versioned JSON document holding a partial content
//! repository and, optionally, a replacement phase table:
//!
//! ```json
//! {
//!   "version": 1,
//!   "content": { "tips": { "default": ["Sit tight!"] } },
//!   "phases": [
//!     { "kind": "micro", "start_ms": 0, "end_ms": 3000 },
//!     { "kind": "tip", "start_ms": 3000, "end_ms": null }
//!   ]
//! }
//! ```

use crate::content::ContentOverride;
use crate::phase::PhaseTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from reading or writing content files.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current content file version.
pub const CONTENT_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFile {
    /// Format version for compatibility checking.
    pub version: u32,

    /// Categories to replace.
    #[serde(default)]
    pub content: ContentOverride,

    /// Replacement phase table, validated on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<PhaseTable>,
}

impl ContentFile {
    pub fn new(content: ContentOverride) -> Self {
        Self {
            version: CONTENT_FILE_VERSION,
            content,
            phases: None,
        }
    }

    pub fn with_phases(mut self, phases: PhaseTable) -> Self {
        self.phases = Some(phases);
        self
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let file: Self = serde_json::from_str(json)?;
        if file.version != CONTENT_FILE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: CONTENT_FILE_VERSION,
                found: file.version,
            });
        }
        Ok(file)
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }
}
