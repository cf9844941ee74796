//! Data models for the dashboard service

pub mod claim;
pub mod detection;
pub mod record;

pub use claim::{Assessment, ClaimAnalysis, ForensicData, Origin, VerdictTone};
pub use detection::{
    parse_detection, AudioAnalysis, Detection, DetectionSummary, FrameAnalysis, FrameResult,
    ImageForensics, MappingError, ModelPrediction,
};
pub use record::{
    extension_of, format_size, ColorTag, DetectionOutcome, RecordError, UploadedFile,
};
