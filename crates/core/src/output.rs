//! The terminal, schema-validated artifact of a case run.
//!
//! The reasoning step's text must deserialize into exactly this shape; the
//! pipeline rejects anything else. Downstream persistence is owned by the
//! caller; these types are constructed once and never mutated after.

use crate::error::{Error, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Risk classification for the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    Medium,
    MediumHigh,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::MediumHigh => write!(f, "medium-high"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Confidence in the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// The kind of follow-up action recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    RepeatTest,
    MedReview,
    Monitor,
    Imaging,
    Referral,
    Lifestyle,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::RepeatTest => write!(f, "repeat_test"),
            ActionType::MedReview => write!(f, "med_review"),
            ActionType::Monitor => write!(f, "monitor"),
            ActionType::Imaging => write!(f, "imaging"),
            ActionType::Referral => write!(f, "referral"),
            ActionType::Lifestyle => write!(f, "lifestyle"),
        }
    }
}

/// Clinical assessment summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub risk_level: RiskLevel,
    pub confidence: Confidence,
    /// Concise explanation of the reasoning, at most 4000 chars.
    pub reasoning_summary: String,
}

/// A specific follow-up action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub action_type: ActionType,
    /// Human-readable action description.
    pub action_text: String,
    /// When this should be done (e.g., "7-14 days").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
}

/// Evidence fragment cited from the guideline corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Logical guideline identifier (e.g., "kdigo_aki_2024").
    pub guideline_id: String,
    /// Chunk identifier of the form `{guideline_id}:chunk-{index}`.
    pub chunk_id: String,
    /// Similarity score in [0, 1].
    pub similarity: f64,
    /// Text excerpt shown to humans.
    pub excerpt: String,
}

/// Fixed-shape execution descriptor attached to every output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    #[serde(default = "default_framework")]
    pub orchestration_framework: String,
    #[serde(default = "default_pipeline_name")]
    pub pipeline_name: String,
    #[serde(default = "default_model_provider")]
    pub model_provider: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_guideline_version")]
    pub guideline_version: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_framework() -> String {
    "labfollowup".into()
}

fn default_pipeline_name() -> String {
    "renal_followup".into()
}

fn default_model_provider() -> String {
    "openai".into()
}

fn default_model_name() -> String {
    "gpt-4.1-mini".into()
}

fn default_guideline_version() -> String {
    "v1".into()
}

fn default_language() -> String {
    "en".into()
}

impl Default for WorkflowMetadata {
    fn default() -> Self {
        Self {
            orchestration_framework: default_framework(),
            pipeline_name: default_pipeline_name(),
            model_provider: default_model_provider(),
            model_name: default_model_name(),
            guideline_version: default_guideline_version(),
            language: default_language(),
        }
    }
}

/// Complete structured output of one case run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalRecommendationOutput {
    /// Unique case identifier (UUID string).
    pub case_id: String,

    /// ISO-8601 timestamp, set at output-construction time.
    #[serde(default = "now_iso8601")]
    pub created_at: String,

    /// FHIR patient reference, passed through unchanged.
    pub patient_ref: String,

    /// FHIR observation reference, passed through unchanged.
    pub trigger_observation_ref: String,

    pub assessment: AssessmentSummary,

    /// Follow-up actions, 1 to 5 items.
    pub recommendations: Vec<RecommendationItem>,

    /// Guideline fragments the recommendations cite. May be empty when the
    /// search found nothing; the reasoning summary must acknowledge that.
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,

    #[serde(default)]
    pub metadata: WorkflowMetadata,
}

/// Current time as an ISO-8601 UTC string.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Maximum length of `reasoning_summary`.
pub const MAX_REASONING_SUMMARY_CHARS: usize = 4000;

/// Bounds on `recommendations`.
pub const MIN_RECOMMENDATIONS: usize = 1;
pub const MAX_RECOMMENDATIONS: usize = 5;

impl ClinicalRecommendationOutput {
    /// Range checks beyond what deserialization enforces.
    ///
    /// Enum fields reject unknown values during deserialization; this covers
    /// the cardinality and numeric bounds.
    pub fn validate(&self) -> Result<()> {
        let n = self.recommendations.len();
        if !(MIN_RECOMMENDATIONS..=MAX_RECOMMENDATIONS).contains(&n) {
            return Err(Error::MalformedOutput {
                reason: format!(
                    "expected {MIN_RECOMMENDATIONS}-{MAX_RECOMMENDATIONS} recommendations, got {n}"
                ),
            });
        }

        let summary_chars = self.assessment.reasoning_summary.chars().count();
        if summary_chars > MAX_REASONING_SUMMARY_CHARS {
            return Err(Error::MalformedOutput {
                reason: format!(
                    "reasoning_summary is {summary_chars} chars, max {MAX_REASONING_SUMMARY_CHARS}"
                ),
            });
        }

        for item in &self.evidence {
            if !(0.0..=1.0).contains(&item.similarity) {
                return Err(Error::MalformedOutput {
                    reason: format!(
                        "evidence similarity {} for chunk '{}' outside [0, 1]",
                        item.similarity, item.chunk_id
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "case_id": "550e8400-e29b-41d4-a716-446655440000",
            "created_at": "2026-02-11T09:30:00Z",
            "patient_ref": "Patient/123",
            "trigger_observation_ref": "Observation/12",
            "assessment": {
                "risk_level": "medium-high",
                "confidence": "high",
                "reasoning_summary": "Creatinine is elevated and rising against a CKD background."
            },
            "recommendations": [
                {
                    "action_type": "repeat_test",
                    "action_text": "Repeat serum creatinine measurement to confirm trend",
                    "timeframe": "7-14 days"
                }
            ],
            "evidence": [
                {
                    "guideline_id": "kdigo_aki_2024",
                    "chunk_id": "kdigo_aki_2024:chunk-6",
                    "similarity": 0.82,
                    "excerpt": "Repeat serum creatinine within 7 days of an abnormal result."
                }
            ],
            "metadata": {
                "orchestration_framework": "labfollowup",
                "pipeline_name": "renal_followup",
                "model_provider": "openai",
                "model_name": "gpt-4.1-mini",
                "guideline_version": "v1",
                "language": "en"
            }
        })
    }

    #[test]
    fn deserializes_full_schema() {
        let output: ClinicalRecommendationOutput =
            serde_json::from_value(sample_json()).unwrap();
        assert_eq!(output.assessment.risk_level, RiskLevel::MediumHigh);
        assert_eq!(output.assessment.confidence, Confidence::High);
        assert_eq!(output.recommendations[0].action_type, ActionType::RepeatTest);
        assert_eq!(output.evidence[0].chunk_id, "kdigo_aki_2024:chunk-6");
        output.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_risk_level() {
        let mut doc = sample_json();
        doc["assessment"]["risk_level"] = "extreme".into();
        let parsed: std::result::Result<ClinicalRecommendationOutput, _> =
            serde_json::from_value(doc);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_unknown_action_type() {
        let mut doc = sample_json();
        doc["recommendations"][0]["action_type"] = "prescribe".into();
        let parsed: std::result::Result<ClinicalRecommendationOutput, _> =
            serde_json::from_value(doc);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_metadata_and_created_at_use_defaults() {
        let mut doc = sample_json();
        doc.as_object_mut().unwrap().remove("metadata");
        doc.as_object_mut().unwrap().remove("created_at");
        let output: ClinicalRecommendationOutput = serde_json::from_value(doc).unwrap();
        assert_eq!(output.metadata.guideline_version, "v1");
        assert_eq!(output.metadata.language, "en");
        assert!(!output.created_at.is_empty());
    }

    #[test]
    fn validate_rejects_empty_recommendations() {
        let mut output: ClinicalRecommendationOutput =
            serde_json::from_value(sample_json()).unwrap();
        output.recommendations.clear();
        assert!(output.validate().is_err());
    }

    #[test]
    fn validate_rejects_too_many_recommendations() {
        let mut output: ClinicalRecommendationOutput =
            serde_json::from_value(sample_json()).unwrap();
        let item = output.recommendations[0].clone();
        output.recommendations = vec![item; 6];
        assert!(output.validate().is_err());
    }

    #[test]
    fn validate_rejects_similarity_out_of_range() {
        let mut output: ClinicalRecommendationOutput =
            serde_json::from_value(sample_json()).unwrap();
        output.evidence[0].similarity = 1.5;
        assert!(output.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_summary() {
        let mut output: ClinicalRecommendationOutput =
            serde_json::from_value(sample_json()).unwrap();
        output.assessment.reasoning_summary = "x".repeat(MAX_REASONING_SUMMARY_CHARS + 1);
        assert!(output.validate().is_err());
    }

    #[test]
    fn enum_display_matches_wire_form() {
        assert_eq!(RiskLevel::MediumHigh.to_string(), "medium-high");
        assert_eq!(Confidence::High.to_string(), "high");
        assert_eq!(ActionType::RepeatTest.to_string(), "repeat_test");
        assert_eq!(ActionType::MedReview.to_string(), "med_review");
    }

    #[test]
    fn timeframe_is_optional() {
        let mut doc = sample_json();
        doc["recommendations"][0]
            .as_object_mut()
            .unwrap()
            .remove("timeframe");
        let output: ClinicalRecommendationOutput = serde_json::from_value(doc).unwrap();
        assert!(output.recommendations[0].timeframe.is_none());
        let serialized = serde_json::to_string(&output).unwrap();
        assert!(!serialized.contains("timeframe"));
    }
}
