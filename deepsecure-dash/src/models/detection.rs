//! Detection service response schema and mapping
//!
//! Each endpoint category has its own response shape. Bodies are parsed
//! against the shape of the category that was requested, then range-checked.
//! Anything that does not fit fails closed with a `MappingError`, which the
//! submission client turns into an inconclusive record.

use deepsecure_common::events::MediaCategory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Response mapping errors
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("Invalid JSON response: {0}")]
    Parse(String),

    #[error("Detection service error: {0}")]
    ServiceReported(String),

    #[error("Response schema mismatch: {0}")]
    SchemaMismatch(String),
}

/// Fields every detection endpoint returns
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DetectionSummary {
    pub is_fake: bool,
    /// Confidence in the verdict, 0.0 to 1.0
    pub confidence: f64,
    #[serde(default)]
    pub fake_probability: Option<f64>,
    /// Service-generated sentence ("The image is FAKE. Confidence: 0.870")
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub detection_method: Option<String>,
    #[serde(default)]
    pub models_used: Option<Vec<String>>,
    /// Per-model predictions keyed by model name
    ///
    /// The single-model fallback path reports these as `model_predictions`.
    #[serde(default, alias = "model_predictions")]
    pub individual_predictions: Option<BTreeMap<String, ModelPrediction>>,
}

/// One model's prediction inside an ensemble response
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ModelPrediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fake_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fake: Option<bool>,
    /// Set when this model failed; the other fields are then absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelPrediction {
    /// Probability that the input is fake, derived from whichever field is present
    pub fn fake_score(&self) -> Option<f64> {
        self.fake_probability
            .or_else(|| self.real_probability.map(|p| 1.0 - p))
    }

    /// Verdict of this model, falling back to the 0.5 threshold
    pub fn verdict_is_fake(&self) -> Option<bool> {
        self.is_fake.or_else(|| self.fake_score().map(|p| p > 0.5))
    }
}

/// Per-video frame breakdown (internal shape)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameAnalysis {
    pub total_frames_analyzed: u32,
    pub fake_frames: u32,
    pub real_frames: u32,
    pub consistency_score: f64,
    pub frame_results: Vec<FrameResult>,
}

/// One analysed video frame (internal shape)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameResult {
    pub frame_index: u32,
    pub fake_probability: f64,
    pub is_fake: bool,
    pub confidence: f64,
}

/// Audio indicators, passed through with the service's own field names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioAnalysis {
    pub spectral_analysis: f64,
    pub temporal_consistency: f64,
    pub voice_quality: f64,
    pub prosodic_features: f64,
}

/// Scores from the image endpoint's computer-vision fallback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageForensics {
    pub noise_analysis: f64,
    pub compression_artifacts: f64,
    pub face_consistency: f64,
}

/// Validated detection result, one variant per endpoint category
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Image {
        summary: DetectionSummary,
        forensics: Option<ImageForensics>,
    },
    Video {
        summary: DetectionSummary,
        frame_analysis: Option<FrameAnalysis>,
    },
    Audio {
        summary: DetectionSummary,
        analysis: Option<AudioAnalysis>,
    },
}

impl Detection {
    pub fn summary(&self) -> &DetectionSummary {
        match self {
            Detection::Image { summary, .. }
            | Detection::Video { summary, .. }
            | Detection::Audio { summary, .. } => summary,
        }
    }

    pub fn category(&self) -> MediaCategory {
        match self {
            Detection::Image { .. } => MediaCategory::Image,
            Detection::Video { .. } => MediaCategory::Video,
            Detection::Audio { .. } => MediaCategory::Audio,
        }
    }

    fn validate(&self) -> Result<(), MappingError> {
        let summary = self.summary();
        check_unit("confidence", summary.confidence)?;
        if let Some(p) = summary.fake_probability {
            check_unit("fake_probability", p)?;
        }

        match self {
            Detection::Video {
                frame_analysis: Some(frames),
                ..
            } => {
                check_unit("frame_analysis.consistency_score", frames.consistency_score)?;
                if frames.fake_frames.checked_add(frames.real_frames)
                    != Some(frames.total_frames_analyzed)
                {
                    return Err(MappingError::SchemaMismatch(format!(
                        "frame counts do not add up: {} fake + {} real != {} total",
                        frames.fake_frames, frames.real_frames, frames.total_frames_analyzed
                    )));
                }
                for frame in &frames.frame_results {
                    check_unit("frame_results.fake_probability", frame.fake_probability)?;
                    check_unit("frame_results.confidence", frame.confidence)?;
                }
            }
            Detection::Audio {
                analysis: Some(audio),
                ..
            } => {
                check_unit("analysis.spectral_analysis", audio.spectral_analysis)?;
                check_unit("analysis.temporal_consistency", audio.temporal_consistency)?;
                check_unit("analysis.voice_quality", audio.voice_quality)?;
                check_unit("analysis.prosodic_features", audio.prosodic_features)?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), MappingError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MappingError::SchemaMismatch(format!(
            "{} out of range 0..=1: {}",
            field, value
        )))
    }
}

// Wire shapes. Only the category-specific parts differ.

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(flatten)]
    summary: DetectionSummary,
    #[serde(default)]
    analysis: Option<ImageForensics>,
}

#[derive(Deserialize)]
struct VideoResponse {
    #[serde(flatten)]
    summary: DetectionSummary,
    #[serde(default)]
    frame_analysis: Option<WireFrameAnalysis>,
}

#[derive(Deserialize)]
struct AudioResponse {
    #[serde(flatten)]
    summary: DetectionSummary,
    #[serde(default)]
    analysis: Option<AudioAnalysis>,
}

#[derive(Deserialize)]
struct WireFrameAnalysis {
    total_frames_analyzed: u32,
    fake_frames: u32,
    real_frames: u32,
    consistency_score: f64,
    #[serde(default)]
    frame_results: Vec<WireFrameResult>,
}

#[derive(Deserialize)]
struct WireFrameResult {
    frame_index: u32,
    fake_probability: f64,
    is_fake: bool,
    confidence: f64,
}

impl From<WireFrameAnalysis> for FrameAnalysis {
    fn from(wire: WireFrameAnalysis) -> Self {
        Self {
            total_frames_analyzed: wire.total_frames_analyzed,
            fake_frames: wire.fake_frames,
            real_frames: wire.real_frames,
            consistency_score: wire.consistency_score,
            frame_results: wire
                .frame_results
                .into_iter()
                .map(|frame| FrameResult {
                    frame_index: frame.frame_index,
                    fake_probability: frame.fake_probability,
                    is_fake: frame.is_fake,
                    confidence: frame.confidence,
                })
                .collect(),
        }
    }
}

/// Parse a detection endpoint body for the requested category
pub fn parse_detection(category: MediaCategory, body: &[u8]) -> Result<Detection, MappingError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| MappingError::Parse(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| MappingError::SchemaMismatch("expected a JSON object".to_string()))?;

    // The service reports its own failures inside a 200 body
    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(MappingError::ServiceReported(message));
    }

    let schema = |e: serde_json::Error| MappingError::SchemaMismatch(e.to_string());
    let detection = match category {
        MediaCategory::Image => {
            let wire: ImageResponse = serde_json::from_value(value).map_err(schema)?;
            Detection::Image {
                summary: wire.summary,
                forensics: wire.analysis,
            }
        }
        MediaCategory::Video => {
            let wire: VideoResponse = serde_json::from_value(value).map_err(schema)?;
            Detection::Video {
                summary: wire.summary,
                frame_analysis: wire.frame_analysis.map(FrameAnalysis::from),
            }
        }
        MediaCategory::Audio => {
            let wire: AudioResponse = serde_json::from_value(value).map_err(schema)?;
            Detection::Audio {
                summary: wire.summary,
                analysis: wire.analysis,
            }
        }
    };

    detection.validate()?;
    Ok(detection)
}
