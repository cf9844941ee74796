//! File intake
//!
//! Filters incoming files against the active category's accept-list and
//! turns the accepted ones into records.

use axum::body::Bytes;
use deepsecure_common::events::MediaCategory;
use serde::Serialize;
use thiserror::Error;

use crate::models::{extension_of, UploadedFile};
use crate::services::preview_store::{PreviewHandle, PreviewStore};

/// Fallback MIME type when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Intake errors
#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    #[error("'{name}' is not an accepted {category} file")]
    NotAccepted {
        name: String,
        category: MediaCategory,
    },

    #[error("File has no name")]
    Unnamed,
}

/// A file as received from the browser or read from the samples directory
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A file with its resolved MIME type, ready for submission
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl MediaFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Accepted MIME wildcard and extensions for one category
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AcceptList {
    pub category: MediaCategory,
    pub mime_wildcard: &'static str,
    pub extensions: &'static [&'static str],
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "flv", "wmv"];
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

impl AcceptList {
    pub fn for_category(category: MediaCategory) -> Self {
        match category {
            MediaCategory::Image => Self {
                category,
                mime_wildcard: "image/*",
                extensions: IMAGE_EXTENSIONS,
            },
            MediaCategory::Video => Self {
                category,
                mime_wildcard: "video/*",
                extensions: VIDEO_EXTENSIONS,
            },
            MediaCategory::Audio => Self {
                category,
                mime_wildcard: "audio/*",
                extensions: AUDIO_EXTENSIONS,
            },
        }
    }

    /// MIME matches the category wildcard, or the extension is listed
    pub fn accepts(&self, name: &str, mime_type: &str) -> bool {
        if MediaCategory::from_mime(mime_type) == Some(self.category) {
            return true;
        }
        extension_of(name)
            .map(|ext| self.extensions.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// MIME type guessed from a known media extension
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let mime = match extension_of(name)?.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        _ => return None,
    };
    Some(mime)
}

/// MIME type of an incoming file
///
/// The client-declared type wins unless it is missing or generic. Otherwise
/// the content is sniffed, then the extension is consulted.
pub fn resolve_mime(file: &IncomingFile) -> String {
    let declared = file
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != OCTET_STREAM);
    if let Some(declared) = declared {
        return declared.to_ascii_lowercase();
    }

    if let Some(kind) = infer::get(&file.bytes) {
        return kind.mime_type().to_string();
    }

    mime_from_extension(&file.name)
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// A file that passed intake
#[derive(Debug)]
pub struct AcceptedFile {
    pub record: UploadedFile,
    pub preview: Option<PreviewHandle>,
    pub media: MediaFile,
}

/// A file that did not pass intake
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Rejection {
    pub name: String,
    pub reason: String,
}

/// Result of one intake call
#[derive(Debug, Default)]
pub struct IntakeBatch {
    pub accepted: Vec<AcceptedFile>,
    pub rejected: Vec<Rejection>,
}

/// Intake for one active category
pub struct FileIntake {
    accept: AcceptList,
    previews: PreviewStore,
}

impl FileIntake {
    pub fn new(category: MediaCategory, previews: PreviewStore) -> Self {
        Self {
            accept: AcceptList::for_category(category),
            previews,
        }
    }

    pub fn accept_list(&self) -> &AcceptList {
        &self.accept
    }

    /// Check one file and build its record
    pub fn admit(&self, file: IncomingFile) -> Result<AcceptedFile, IntakeError> {
        if file.name.trim().is_empty() {
            return Err(IntakeError::Unnamed);
        }

        let mime_type = resolve_mime(&file);
        if !self.accept.accepts(&file.name, &mime_type) {
            return Err(IntakeError::NotAccepted {
                name: file.name,
                category: self.accept.category,
            });
        }

        let record = UploadedFile::new(file.name.clone(), file.bytes.len() as u64, mime_type.clone());
        let preview = record
            .wants_preview()
            .then(|| self.previews.create(mime_type.clone(), file.bytes.clone()));

        Ok(AcceptedFile {
            record,
            preview,
            media: MediaFile {
                name: file.name,
                mime_type,
                bytes: file.bytes,
            },
        })
    }

    /// Admit files in input order, collecting rejections
    pub fn intake(&self, files: Vec<IncomingFile>) -> IntakeBatch {
        let mut batch = IntakeBatch::default();
        for file in files {
            let name = file.name.clone();
            match self.admit(file) {
                Ok(accepted) => batch.accepted.push(accepted),
                Err(e) => {
                    tracing::info!(name = %name, category = %self.accept.category, reason = %e, "File rejected at intake");
                    batch.rejected.push(Rejection {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepsecure_common::events::{RecordStatus, RequestStage};

    // Minimal PNG signature, enough for content sniffing
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    fn incoming(name: &str, content_type: Option<&str>, bytes: &'static [u8]) -> IncomingFile {
        IncomingFile {
            name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_accept_by_mime_or_extension() {
        let images = AcceptList::for_category(MediaCategory::Image);
        assert!(images.accepts("anything", "image/heic"));
        assert!(images.accepts("photo.JPEG", "text/plain"));
        assert!(!images.accepts("clip.mp4", "video/mp4"));

        let audio = AcceptList::for_category(MediaCategory::Audio);
        assert!(audio.accepts("voice.m4a", OCTET_STREAM));
        assert!(!audio.accepts("voice.txt", "text/plain"));
    }

    #[test]
    fn test_resolve_mime_prefers_declared_type() {
        let file = incoming("a.png", Some("Image/PNG"), b"");
        assert_eq!(resolve_mime(&file), "image/png");
    }

    #[test]
    fn test_resolve_mime_sniffs_generic_upload() {
        let file = incoming("upload.bin", Some(OCTET_STREAM), PNG_MAGIC);
        assert_eq!(resolve_mime(&file), "image/png");
    }

    #[test]
    fn test_resolve_mime_falls_back_to_extension() {
        let file = incoming("clip.mov", None, b"not a real movie");
        assert_eq!(resolve_mime(&file), "video/quicktime");

        let unknown = incoming("notes", None, b"plain words");
        assert_eq!(resolve_mime(&unknown), OCTET_STREAM);
    }

    #[test]
    fn test_intake_keeps_order_and_reports_rejections() {
        let previews = PreviewStore::new();
        let intake = FileIntake::new(MediaCategory::Image, previews.clone());

        let batch = intake.intake(vec![
            incoming("one.png", Some("image/png"), b"1"),
            incoming("notes.txt", Some("text/plain"), b"2"),
            incoming("two.jpg", Some("image/jpeg"), b"3"),
        ]);

        let names: Vec<&str> = batch.accepted.iter().map(|a| a.record.name.as_str()).collect();
        assert_eq!(names, vec!["one.png", "two.jpg"]);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].name, "notes.txt");
        assert_eq!(batch.rejected[0].reason, "'notes.txt' is not an accepted image file");

        for accepted in &batch.accepted {
            assert_eq!(accepted.record.status, RecordStatus::Analyzing);
            assert_eq!(accepted.record.stage, RequestStage::Queued);
            assert!(accepted.preview.is_some());
        }
        assert_eq!(previews.len(), 2);
    }

    #[test]
    fn test_audio_gets_no_preview() {
        let previews = PreviewStore::new();
        let intake = FileIntake::new(MediaCategory::Audio, previews.clone());

        let accepted = intake
            .admit(incoming("voice.wav", Some("audio/wav"), b"RIFF"))
            .unwrap();
        assert!(accepted.preview.is_none());
        assert!(previews.is_empty());
    }

    #[test]
    fn test_extension_match_keeps_declared_mime() {
        let intake = FileIntake::new(MediaCategory::Image, PreviewStore::new());
        let accepted = intake
            .admit(incoming("odd.jpg", Some("text/plain"), b"x"))
            .unwrap();

        // Accepted by extension; the submission step decides what to do with it
        assert_eq!(accepted.media.mime_type, "text/plain");
        assert!(accepted.preview.is_none());
    }

    #[test]
    fn test_unnamed_file_rejected() {
        let intake = FileIntake::new(MediaCategory::Video, PreviewStore::new());
        let err = intake.admit(incoming("  ", Some("video/mp4"), b"x")).unwrap_err();
        assert_eq!(err, IntakeError::Unnamed);
    }
}
