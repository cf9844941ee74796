//! Claim-verification ("Track") result model

use serde::{Deserialize, Serialize};

/// Verdict string for a failed analysis
pub const VERDICT_FAILED: &str = "Analysis Failed";
/// Verdict string when the service could not decide or was not asked
pub const VERDICT_UNCERTAIN: &str = "UNCERTAIN";
/// Origin status for a failed analysis
pub const ORIGIN_ANALYSIS_FAILED: &str = "ANALYSIS_FAILED";
/// Origin status for URL submissions
pub const ORIGIN_URL_NOT_SUPPORTED: &str = "URL_NOT_SUPPORTED";

/// Full claim-verification response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAnalysis {
    pub claim: String,
    pub assessment: Assessment,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forensic_data: Option<ForensicData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub verdict: String,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForensicData {
    pub best_guess: String,
    #[serde(default)]
    pub detected_objects: Vec<String>,
}

/// How a verdict should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictTone {
    Positive,
    Negative,
    Neutral,
}

impl ClaimAnalysis {
    /// Result shown when the request failed for any reason
    pub fn failed(claim: impl Into<String>, error: &str) -> Self {
        Self {
            claim: claim.into(),
            assessment: Assessment {
                verdict: VERDICT_FAILED.to_string(),
                confidence: 0.0,
                reasoning: format!("Analysis failed: {}", error),
            },
            origin: Origin {
                status: ORIGIN_ANALYSIS_FAILED.to_string(),
                url: None,
                context: "Could not analyze the content due to an error".to_string(),
                first_seen: None,
            },
            forensic_data: None,
        }
    }

    /// Result for URL submissions, which the service does not analyse
    pub fn url_not_supported(claim: Option<&str>, url: &str) -> Self {
        let claim = claim
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Analyze content from URL");
        Self {
            claim: claim.to_string(),
            assessment: Assessment {
                verdict: VERDICT_UNCERTAIN.to_string(),
                confidence: 0.0,
                reasoning: "URL analysis is not yet implemented. Please upload the file directly for analysis."
                    .to_string(),
            },
            origin: Origin {
                status: ORIGIN_URL_NOT_SUPPORTED.to_string(),
                url: Some(url.to_string()),
                context: "Direct file upload is required for content analysis".to_string(),
                first_seen: None,
            },
            forensic_data: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.origin.status == ORIGIN_ANALYSIS_FAILED
    }

    pub fn verdict_tone(&self) -> VerdictTone {
        match self.assessment.verdict.as_str() {
            "AGREES" => VerdictTone::Positive,
            "DISAGREES" => VerdictTone::Negative,
            _ => VerdictTone::Neutral,
        }
    }
}
