//! Result presenter
//!
//! Turns a record into a view model. Every section is optional and is left
//! out when its data is missing, so partial records always render.

use deepsecure_common::events::{MediaCategory, RecordId, RecordStatus, RequestStage};
use serde::Serialize;
use std::fmt;

use crate::models::{
    AudioAnalysis, ClaimAnalysis, FrameAnalysis, ImageForensics, UploadedFile, VerdictTone,
};

/// Frame rows shown before the list is cut off
pub const FRAME_ROW_LIMIT: usize = 10;
/// Method label when the service does not name one
pub const DEFAULT_METHOD: &str = "AI Analysis";

/// Percentage with one decimal place (0.87 -> "87.0%")
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Pending,
    Authentic,
    Fake,
    Warning,
}

impl BadgeTone {
    fn css_class(&self) -> &'static str {
        match self {
            BadgeTone::Pending => "badge-pending",
            BadgeTone::Authentic => "badge-authentic",
            BadgeTone::Fake => "badge-fake",
            BadgeTone::Warning => "badge-warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub label: String,
    pub tone: BadgeTone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub model: String,
    pub verdict: &'static str,
    pub fake_probability: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRow {
    pub label: String,
    pub verdict: &'static str,
    pub confidence: String,
    pub fake_probability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSection {
    pub ratio: String,
    pub consistency: String,
    pub rows: Vec<FrameRow>,
    /// Frames beyond the row limit
    pub hidden_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub label: &'static str,
    pub value: String,
    pub assessment: Option<&'static str>,
    pub flagged: bool,
}

/// Everything the dashboard shows for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub record_id: RecordId,
    pub name: String,
    pub size: String,
    pub color_class: &'static str,
    pub category: Option<MediaCategory>,
    pub preview: Option<String>,
    pub stage: RequestStage,
    pub badge: Badge,
    pub confidence: Option<String>,
    pub detection: Option<&'static str>,
    pub method: Option<String>,
    pub models_used: Vec<String>,
    pub predictions: Vec<PredictionRow>,
    pub frames: Option<FrameSection>,
    pub audio: Vec<IndicatorRow>,
    pub forensics: Vec<IndicatorRow>,
    pub error: Option<String>,
}

/// Build the view model for a record
pub fn present(record: &UploadedFile) -> ResultView {
    let decided = matches!(record.status, RecordStatus::Authentic | RecordStatus::Fake);
    let confidence = if decided {
        record.confidence.map(format_percent)
    } else {
        None
    };

    let detection = match record.status {
        RecordStatus::Authentic => Some("Real"),
        RecordStatus::Fake => Some("Fake"),
        _ => None,
    };

    let method = decided.then(|| {
        record
            .detection_method
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_METHOD.to_string())
    });

    ResultView {
        record_id: record.id,
        name: record.name.clone(),
        size: record.size.clone(),
        color_class: record.color.css_class(),
        category: record.category,
        preview: record.preview.clone(),
        stage: record.stage,
        badge: badge(record.status, confidence.as_deref(), record.error.is_some()),
        confidence,
        detection,
        method,
        models_used: record.models_used.clone().unwrap_or_default(),
        predictions: prediction_rows(record),
        frames: record.frame_analysis.as_ref().map(frame_section),
        audio: record.audio_analysis.as_ref().map(audio_rows).unwrap_or_default(),
        forensics: record
            .image_forensics
            .as_ref()
            .map(forensic_rows)
            .unwrap_or_default(),
        error: record.error.clone(),
    }
}

fn badge(status: RecordStatus, confidence: Option<&str>, has_error: bool) -> Badge {
    let with_confidence = |label: &str| match confidence {
        Some(c) => format!("{} ({})", label, c),
        None => label.to_string(),
    };
    match status {
        RecordStatus::Analyzing => Badge {
            label: "Analyzing...".to_string(),
            tone: BadgeTone::Pending,
        },
        RecordStatus::Authentic => Badge {
            label: with_confidence("Authentic"),
            tone: BadgeTone::Authentic,
        },
        RecordStatus::Fake => Badge {
            label: with_confidence("Deepfake"),
            tone: BadgeTone::Fake,
        },
        RecordStatus::Inconclusive => Badge {
            label: if has_error { "Error" } else { "Inconclusive" }.to_string(),
            tone: BadgeTone::Warning,
        },
    }
}

fn prediction_rows(record: &UploadedFile) -> Vec<PredictionRow> {
    let Some(predictions) = record.individual_predictions.as_ref() else {
        return Vec::new();
    };
    predictions
        .iter()
        .map(|(model, prediction)| {
            let verdict = match (&prediction.error, prediction.verdict_is_fake()) {
                (Some(_), _) => "Error",
                (None, Some(true)) => "Fake",
                (None, Some(false)) => "Real",
                (None, None) => "Unknown",
            };
            PredictionRow {
                model: model.clone(),
                verdict,
                fake_probability: prediction.fake_score().map(format_percent),
                error: prediction.error.clone(),
            }
        })
        .collect()
}

fn frame_section(frames: &FrameAnalysis) -> FrameSection {
    let rows = frames
        .frame_results
        .iter()
        .take(FRAME_ROW_LIMIT)
        .map(|frame| FrameRow {
            label: format!("#{}", frame.frame_index),
            verdict: if frame.is_fake { "Fake" } else { "Real" },
            confidence: format_percent(frame.confidence),
            fake_probability: format_percent(frame.fake_probability),
        })
        .collect();

    FrameSection {
        ratio: format!("{}/{}", frames.fake_frames, frames.total_frames_analyzed),
        consistency: format_percent(frames.consistency_score),
        rows,
        hidden_rows: frames.frame_results.len().saturating_sub(FRAME_ROW_LIMIT),
    }
}

fn audio_rows(audio: &AudioAnalysis) -> Vec<IndicatorRow> {
    let row = |label: &'static str,
               value: f64,
               flagged: bool,
               flagged_text: &'static str,
               normal_text: &'static str| IndicatorRow {
        label,
        value: format_percent(value),
        assessment: Some(if flagged { flagged_text } else { normal_text }),
        flagged,
    };
    vec![
        row(
            "Spectral analysis",
            audio.spectral_analysis,
            audio.spectral_analysis == 1.0,
            "Suspicious",
            "Normal",
        ),
        row(
            "Temporal consistency",
            audio.temporal_consistency,
            audio.temporal_consistency < 0.5,
            "Inconsistent",
            "Consistent",
        ),
        row(
            "Voice quality",
            audio.voice_quality,
            audio.voice_quality == 1.0,
            "Artificial",
            "Natural",
        ),
        row(
            "Prosodic features",
            audio.prosodic_features,
            audio.prosodic_features == 1.0,
            "Synthetic",
            "Natural",
        ),
    ]
}

fn forensic_rows(forensics: &ImageForensics) -> Vec<IndicatorRow> {
    [
        ("Noise analysis", forensics.noise_analysis),
        ("Compression artifacts", forensics.compression_artifacts),
        ("Face consistency", forensics.face_consistency),
    ]
    .into_iter()
    .map(|(label, value)| IndicatorRow {
        label,
        value: format_percent(value),
        assessment: None,
        flagged: false,
    })
    .collect()
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) [{}]", self.name, self.size, self.badge.label)?;
        if let Some(confidence) = &self.confidence {
            writeln!(f, "Confidence: {}", confidence)?;
        }
        if let Some(detection) = self.detection {
            writeln!(f, "Detection: {}", detection)?;
        }
        if let Some(method) = &self.method {
            writeln!(f, "Method: {}", method)?;
        }
        if !self.models_used.is_empty() {
            writeln!(f, "Models: {}", self.models_used.join(", "))?;
        }
        for row in &self.predictions {
            match (&row.error, &row.fake_probability) {
                (Some(error), _) => writeln!(f, "  {}: Error ({})", row.model, error)?,
                (None, Some(p)) => writeln!(f, "  {}: {} (fake probability {})", row.model, row.verdict, p)?,
                (None, None) => writeln!(f, "  {}: {}", row.model, row.verdict)?,
            }
        }
        if let Some(frames) = &self.frames {
            writeln!(
                f,
                "Frames: {} fake, consistency {}",
                frames.ratio, frames.consistency
            )?;
            for row in &frames.rows {
                writeln!(
                    f,
                    "  {} {} confidence {} fake probability {}",
                    row.label, row.verdict, row.confidence, row.fake_probability
                )?;
            }
            if frames.hidden_rows > 0 {
                writeln!(f, "  ... {} more frames", frames.hidden_rows)?;
            }
        }
        for row in self.audio.iter().chain(self.forensics.iter()) {
            match row.assessment {
                Some(assessment) => writeln!(f, "{}: {} {}", row.label, row.value, assessment)?,
                None => writeln!(f, "{}: {}", row.label, row.value)?,
            }
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {}", error)?;
        }
        Ok(())
    }
}

impl ResultView {
    /// HTML fragment for the dashboard page
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str(&format!(
            "<div class=\"result-card\" data-record-id=\"{}\">",
            self.record_id
        ));
        html.push_str(&format!(
            "<div class=\"file-header\"><span class=\"file-tag {}\"></span><span class=\"file-name\">{}</span><span class=\"file-size\">{}</span><span class=\"badge {}\">{}</span><button class=\"remove\" data-remove=\"{}\" title=\"Remove\">&times;</button></div>",
            self.color_class,
            escape_html(&self.name),
            escape_html(&self.size),
            self.badge.tone.css_class(),
            escape_html(&self.badge.label),
            self.record_id
        ));

        match (&self.preview, self.category) {
            (Some(preview), Some(MediaCategory::Video)) => html.push_str(&format!(
                "<video class=\"preview\" src=\"{}\" muted></video>",
                escape_html(preview)
            )),
            (Some(preview), _) => html.push_str(&format!(
                "<img class=\"preview\" src=\"{}\" alt=\"{}\">",
                escape_html(preview),
                escape_html(&self.name)
            )),
            (None, _) => {}
        }

        let mut summary = String::new();
        for (label, value) in [
            ("Confidence", self.confidence.as_deref()),
            ("Detection", self.detection),
            ("Method", self.method.as_deref()),
        ] {
            if let Some(value) = value {
                summary.push_str(&format!(
                    "<dt>{}</dt><dd>{}</dd>",
                    label,
                    escape_html(value)
                ));
            }
        }
        if !summary.is_empty() {
            html.push_str(&format!("<dl class=\"summary\">{}</dl>", summary));
        }

        if !self.models_used.is_empty() {
            html.push_str("<ul class=\"models\">");
            for model in &self.models_used {
                html.push_str(&format!("<li>{}</li>", escape_html(model)));
            }
            html.push_str("</ul>");
        }

        if !self.predictions.is_empty() {
            html.push_str("<table class=\"predictions\">");
            for row in &self.predictions {
                let detail = row
                    .error
                    .as_deref()
                    .or(row.fake_probability.as_deref())
                    .unwrap_or("");
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&row.model),
                    row.verdict,
                    escape_html(detail)
                ));
            }
            html.push_str("</table>");
        }

        if let Some(frames) = &self.frames {
            html.push_str(&format!(
                "<div class=\"frames\"><p>Fake frames: {} &middot; Consistency: {}</p><table>",
                frames.ratio, frames.consistency
            ));
            for row in &frames.rows {
                html.push_str(&format!(
                    "<tr class=\"frame\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    row.label, row.verdict, row.confidence, row.fake_probability
                ));
            }
            html.push_str("</table>");
            if frames.hidden_rows > 0 {
                html.push_str(&format!("<p>+{} more frames</p>", frames.hidden_rows));
            }
            html.push_str("</div>");
        }

        for (class, rows) in [("audio", &self.audio), ("forensics", &self.forensics)] {
            if rows.is_empty() {
                continue;
            }
            html.push_str(&format!("<ul class=\"{}\">", class));
            for row in rows {
                html.push_str(&format!(
                    "<li class=\"{}\">{}: {}{}</li>",
                    if row.flagged { "flagged" } else { "normal" },
                    row.label,
                    row.value,
                    row.assessment.map(|a| format!(" ({})", a)).unwrap_or_default()
                ));
            }
            html.push_str("</ul>");
        }

        if let Some(error) = &self.error {
            html.push_str(&format!(
                "<p class=\"error\">{}</p>",
                escape_html(error)
            ));
        }

        html.push_str("</div>");
        html
    }
}

/// View model for a claim-verification result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimView {
    pub claim: String,
    pub verdict: String,
    pub tone: VerdictTone,
    pub confidence: String,
    pub reasoning: String,
    pub origin_status: String,
    pub origin_url: Option<String>,
    pub origin_context: String,
    pub first_seen: Option<String>,
    pub best_guess: Option<String>,
    pub detected_objects: Vec<String>,
}

pub fn present_claim(analysis: &ClaimAnalysis) -> ClaimView {
    ClaimView {
        claim: analysis.claim.clone(),
        verdict: analysis.assessment.verdict.clone(),
        tone: analysis.verdict_tone(),
        confidence: format_percent(analysis.assessment.confidence),
        reasoning: analysis.assessment.reasoning.clone(),
        origin_status: analysis.origin.status.clone(),
        origin_url: analysis.origin.url.clone(),
        origin_context: analysis.origin.context.clone(),
        first_seen: analysis.origin.first_seen.clone(),
        best_guess: analysis.forensic_data.as_ref().map(|d| d.best_guess.clone()),
        detected_objects: analysis
            .forensic_data
            .as_ref()
            .map(|d| d.detected_objects.clone())
            .unwrap_or_default(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Detection, DetectionOutcome, DetectionSummary, FrameResult, ModelPrediction,
    };
    use std::collections::BTreeMap;

    fn summary(is_fake: bool, confidence: f64) -> DetectionSummary {
        DetectionSummary {
            is_fake,
            confidence,
            fake_probability: None,
            result: None,
            detection_method: None,
            models_used: None,
            individual_predictions: None,
        }
    }

    fn video_frames(total: u32, fake: u32) -> FrameAnalysis {
        FrameAnalysis {
            total_frames_analyzed: total,
            fake_frames: fake,
            real_frames: total - fake,
            consistency_score: 0.7,
            frame_results: (0..total)
                .map(|i| FrameResult {
                    frame_index: i,
                    fake_probability: if i < fake { 0.9 } else { 0.1 },
                    is_fake: i < fake,
                    confidence: 0.9,
                })
                .collect(),
        }
    }

    #[test]
    fn test_analyzing_record_renders() {
        let record = UploadedFile::new("clip.mp4", 1024, "video/mp4");
        let view = present(&record);

        assert_eq!(view.badge.label, "Analyzing...");
        assert!(view.confidence.is_none());
        assert!(view.detection.is_none());
        assert!(view.method.is_none());
        assert!(view.frames.is_none());
        assert!(view.audio.is_empty());
        assert!(view.to_string().starts_with("clip.mp4 (1.0 KB) [Analyzing...]"));
    }

    #[test]
    fn test_decided_without_confidence_has_plain_badge() {
        let mut record = UploadedFile::new("a.png", 10, "image/png");
        record.status = RecordStatus::Authentic;

        let view = present(&record);
        assert_eq!(view.badge.label, "Authentic");
        assert_eq!(view.method.as_deref(), Some(DEFAULT_METHOD));
        assert_eq!(view.detection, Some("Real"));
    }

    #[test]
    fn test_error_badge_has_no_percentage() {
        let mut record = UploadedFile::new("a.png", 10, "image/png");
        record
            .resolve(DetectionOutcome::Failed {
                error: "HTTP error! status: 500".to_string(),
            })
            .unwrap();

        let view = present(&record);
        assert_eq!(view.badge.label, "Error");
        assert_eq!(view.badge.tone, BadgeTone::Warning);
        assert!(view.confidence.is_none());
        assert!(!view.to_string().contains('%'));
        assert!(view.to_html().contains("HTTP error! status: 500"));
    }

    #[test]
    fn test_inconclusive_without_error() {
        let mut record = UploadedFile::new("a.png", 10, "image/png");
        record.status = RecordStatus::Inconclusive;
        assert_eq!(present(&record).badge.label, "Inconclusive");
    }

    #[test]
    fn test_frame_rows_capped() {
        let mut record = UploadedFile::new("clip.mp4", 10, "video/mp4");
        record
            .resolve(DetectionOutcome::Detected(Detection::Video {
                summary: summary(true, 0.6),
                frame_analysis: Some(video_frames(14, 3)),
            }))
            .unwrap();

        let frames = present(&record).frames.unwrap();
        assert_eq!(frames.ratio, "3/14");
        assert_eq!(frames.rows.len(), FRAME_ROW_LIMIT);
        assert_eq!(frames.hidden_rows, 4);
        assert_eq!(frames.rows[0].label, "#0");
        assert_eq!(frames.rows[0].verdict, "Fake");
        assert_eq!(frames.rows[3].verdict, "Real");
        assert_eq!(frames.consistency, "70.0%");
    }

    #[test]
    fn test_audio_indicator_labels() {
        let audio = AudioAnalysis {
            spectral_analysis: 1.0,
            temporal_consistency: 0.3,
            voice_quality: 0.0,
            prosodic_features: 1.0,
        };
        let rows = audio_rows(&audio);
        let assessments: Vec<_> = rows.iter().map(|r| r.assessment.unwrap()).collect();
        assert_eq!(
            assessments,
            vec!["Suspicious", "Inconsistent", "Natural", "Synthetic"]
        );
        assert!(rows[0].flagged);
        assert!(!rows[2].flagged);
    }

    #[test]
    fn test_prediction_rows() {
        let mut predictions = BTreeMap::new();
        predictions.insert(
            "efficientnet".to_string(),
            ModelPrediction {
                fake_probability: Some(0.9),
                real_probability: None,
                is_fake: None,
                error: None,
            },
        );
        predictions.insert(
            "xception".to_string(),
            ModelPrediction {
                fake_probability: None,
                real_probability: None,
                is_fake: None,
                error: Some("model not loaded".to_string()),
            },
        );
        let mut record = UploadedFile::new("a.png", 10, "image/png");
        record.individual_predictions = Some(predictions);

        let rows = present(&record).predictions;
        assert_eq!(rows[0].model, "efficientnet");
        assert_eq!(rows[0].verdict, "Fake");
        assert_eq!(rows[0].fake_probability.as_deref(), Some("90.0%"));
        assert_eq!(rows[1].verdict, "Error");
    }

    #[test]
    fn test_html_escapes_user_text() {
        let mut record = UploadedFile::new("<script>.png", 10, "image/png");
        record.status = RecordStatus::Inconclusive;
        record.error = Some("bad & worse".to_string());

        let html = present(&record).to_html();
        assert!(html.contains("&lt;script&gt;.png"));
        assert!(html.contains("bad &amp; worse"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_card_has_remove_control() {
        let record = UploadedFile::new("a.png", 10, "image/png");
        let html = present(&record).to_html();
        assert!(html.contains(&format!("data-remove=\"{}\"", record.id)));
    }

    #[test]
    fn test_preview_element_follows_category() {
        let mut video = UploadedFile::new("clip.mp4", 10, "video/mp4");
        video.preview = Some("/previews/v".to_string());
        let html = present(&video).to_html();
        assert!(html.contains("<video class=\"preview\" src=\"/previews/v\" muted></video>"));
        assert!(!html.contains("<img"));

        let mut image = UploadedFile::new("face.png", 10, "image/png");
        image.preview = Some("/previews/i".to_string());
        let html = present(&image).to_html();
        assert!(html.contains("<img class=\"preview\" src=\"/previews/i\""));
        assert!(!html.contains("<video"));

        let audio = UploadedFile::new("voice.mp3", 10, "audio/mpeg");
        let html = present(&audio).to_html();
        assert!(!html.contains("preview"));
    }

    #[test]
    fn test_claim_view() {
        let view = present_claim(&ClaimAnalysis::failed("claim", "Network error: refused"));
        assert_eq!(view.verdict, "Analysis Failed");
        assert_eq!(view.confidence, "0.0%");
        assert_eq!(view.tone, VerdictTone::Neutral);
        assert!(view.detected_objects.is_empty());
    }
}
