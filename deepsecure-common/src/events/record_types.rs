//! Record-level types shared by events and the dashboard service

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of one uploaded-file record
///
/// Assigned at intake and never reused, so updates and removals cannot be
/// applied to the wrong record when the record list changes underneath an
/// in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Coarse media category
///
/// Selects both the accepted file types at intake and the detection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Audio,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 3] = [MediaCategory::Image, MediaCategory::Video, MediaCategory::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Image => "image",
            MediaCategory::Video => "video",
            MediaCategory::Audio => "audio",
        }
    }

    /// Category of a MIME type by its top-level type (`image/png` -> Image)
    pub fn from_mime(mime: &str) -> Option<Self> {
        let top = mime.split('/').next()?.trim().to_ascii_lowercase();
        match top.as_str() {
            "image" => Some(MediaCategory::Image),
            "video" => Some(MediaCategory::Video),
            "audio" => Some(MediaCategory::Audio),
            _ => None,
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(MediaCategory::Image),
            "video" => Ok(MediaCategory::Video),
            "audio" => Ok(MediaCategory::Audio),
            other => Err(format!("Unknown media category: {}", other)),
        }
    }
}

/// Analysis status of a record
///
/// Starts `Analyzing` and moves to one terminal state exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Analyzing,
    Authentic,
    Fake,
    Inconclusive,
}

impl RecordStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecordStatus::Analyzing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Analyzing => "analyzing",
            RecordStatus::Authentic => "authentic",
            RecordStatus::Fake => "fake",
            RecordStatus::Inconclusive => "inconclusive",
        }
    }
}

/// Where a record's detection request currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStage {
    /// Record created, request not yet started
    Queued,
    /// Multipart body being sent
    Uploading,
    /// Response head received, body pending
    AwaitingResponse,
    /// Record resolved (success or failure)
    Complete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_mime() {
        assert_eq!(MediaCategory::from_mime("image/jpeg"), Some(MediaCategory::Image));
        assert_eq!(MediaCategory::from_mime("VIDEO/mp4"), Some(MediaCategory::Video));
        assert_eq!(MediaCategory::from_mime("audio/wav"), Some(MediaCategory::Audio));
        assert_eq!(MediaCategory::from_mime("application/pdf"), None);
        assert_eq!(MediaCategory::from_mime(""), None);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Video".parse::<MediaCategory>(), Ok(MediaCategory::Video));
        assert!("text".parse::<MediaCategory>().is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RecordStatus::Analyzing.is_terminal());
        assert!(RecordStatus::Authentic.is_terminal());
        assert!(RecordStatus::Fake.is_terminal());
        assert!(RecordStatus::Inconclusive.is_terminal());
    }

    #[test]
    fn test_stage_ordering() {
        assert!(RequestStage::Queued < RequestStage::Uploading);
        assert!(RequestStage::Uploading < RequestStage::AwaitingResponse);
        assert!(RequestStage::AwaitingResponse < RequestStage::Complete);
    }

    #[test]
    fn test_record_id_serializes_as_plain_uuid() {
        let id = RecordId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
