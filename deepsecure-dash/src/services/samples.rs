//! Sample catalogue for the "try sample" action
//!
//! Samples are plain files in the configured samples directory. Entries
//! without a file are listed as coming soon and cannot be loaded.

use axum::body::Bytes;
use deepsecure_common::events::MediaCategory;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::services::intake::IncomingFile;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Unknown sample: {0}")]
    Unknown(String),

    #[error("Sample '{0}' is not available yet")]
    ComingSoon(String),

    #[error("Failed to read sample {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One catalogue entry
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SampleEntry {
    pub name: &'static str,
    pub label: &'static str,
    pub category: MediaCategory,
    /// Whether the sample is known to be authentic
    pub authentic: bool,
    /// File name inside the samples directory; `None` for coming-soon entries
    pub file: Option<&'static str>,
}

impl SampleEntry {
    pub fn available(&self) -> bool {
        self.file.is_some()
    }
}

const BUILTIN_SAMPLES: &[SampleEntry] = &[
    SampleEntry {
        name: "real-image",
        label: "Authentic portrait",
        category: MediaCategory::Image,
        authentic: true,
        file: Some("real-portrait.jpg"),
    },
    SampleEntry {
        name: "fake-image",
        label: "AI-generated portrait",
        category: MediaCategory::Image,
        authentic: false,
        file: Some("fake-portrait.jpg"),
    },
    SampleEntry {
        name: "real-video",
        label: "Authentic interview clip",
        category: MediaCategory::Video,
        authentic: true,
        file: Some("real-interview.mp4"),
    },
    SampleEntry {
        name: "fake-video",
        label: "Face-swapped interview clip",
        category: MediaCategory::Video,
        authentic: false,
        file: Some("fake-interview.mp4"),
    },
    SampleEntry {
        name: "real-audio",
        label: "Authentic voice recording",
        category: MediaCategory::Audio,
        authentic: true,
        file: None,
    },
    SampleEntry {
        name: "fake-audio",
        label: "Cloned voice recording",
        category: MediaCategory::Audio,
        authentic: false,
        file: None,
    },
];

/// Samples known to the dashboard
pub struct SampleCatalog {
    dir: PathBuf,
    entries: &'static [SampleEntry],
}

impl SampleCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: BUILTIN_SAMPLES,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[SampleEntry] {
        self.entries
    }

    pub fn find(&self, name: &str) -> Option<&SampleEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Read a sample from disk as an incoming file
    ///
    /// The MIME type is left for intake to sniff.
    pub async fn load(&self, name: &str) -> Result<(SampleEntry, IncomingFile), SampleError> {
        let entry = self
            .find(name)
            .ok_or_else(|| SampleError::Unknown(name.to_string()))?;
        let file_name = entry
            .file
            .ok_or_else(|| SampleError::ComingSoon(name.to_string()))?;

        let path = self.dir.join(file_name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| SampleError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(sample = name, path = %path.display(), size = bytes.len(), "Sample loaded");
        Ok((
            entry.clone(),
            IncomingFile {
                name: file_name.to_string(),
                content_type: None,
                bytes: Bytes::from(bytes),
            },
        ))
    }
}
