//! The currently chosen capture file.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::Path;

pub const CSV_MEDIA_TYPE: &str = "text/csv";

/// A capture file held as an opaque payload. Content is never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    name: String,
    media_type: &'static str,
    content: Bytes,
}

impl Artifact {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: CSV_MEDIA_TYPE,
            content: content.into(),
        }
    }

    /// Read a file from disk. Zero-length files are accepted.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Holds at most one artifact; a new selection replaces the old one wholesale.
#[derive(Debug, Default)]
pub struct FileSelection {
    current: Option<Artifact>,
}

impl FileSelection {
    pub fn select(&mut self, artifact: Artifact) {
        self.current = Some(artifact);
    }

    pub fn current(&self) -> Option<&Artifact> {
        self.current.as_ref()
    }
}
