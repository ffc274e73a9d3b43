//! Structured-output recovery for the reasoning step.
//!
//! Models wrap JSON in prose or markdown fences despite instructions.
//! Extraction tries progressively looser strategies; each one is a pure
//! function over the raw text.

use labfollowup_core::output::ClinicalRecommendationOutput;
use labfollowup_core::Error;
use serde_json::Value;

/// Parse the reasoning step's raw text into the recommendation schema.
pub fn parse_recommendation(raw: &str) -> Result<ClinicalRecommendationOutput, Error> {
    let value = extract_json(raw).ok_or_else(|| Error::MalformedOutput {
        reason: "no JSON object found in the reasoning output".to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| Error::MalformedOutput {
        reason: format!("output does not match the recommendation schema: {e}"),
    })
}

/// Extract the first JSON object from raw model text.
///
/// Strategies, in order: the trimmed text is the object itself; a fenced
/// code block (```json or bare ```) holds the object; the slice from the
/// first `{` to the last `}` parses. First success wins.
pub fn extract_json(raw: &str) -> Option<Value> {
    parse_object(raw.trim())
        .or_else(|| fenced_block(raw).as_deref().and_then(parse_object))
        .or_else(|| brace_slice(raw).and_then(parse_object))
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Body of the first fenced code block, if the fence is closed.
fn fenced_block(raw: &str) -> Option<String> {
    let fence = raw.find("```json").or_else(|| raw.find("```"))?;
    let body_start = fence + raw[fence..].find('\n')? + 1;
    let body_end = body_start + raw[body_start..].find("```")?;
    Some(raw[body_start..body_end].trim().to_string())
}

fn brace_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use labfollowup_core::output::{ActionType, RiskLevel};

    fn document() -> String {
        serde_json::json!({
            "case_id": "550e8400-e29b-41d4-a716-446655440000",
            "created_at": "2026-02-11T09:30:00Z",
            "patient_ref": "Patient/123",
            "trigger_observation_ref": "Observation/12",
            "assessment": {
                "risk_level": "medium-high",
                "confidence": "high",
                "reasoning_summary": "Creatinine is elevated against a CKD background."
            },
            "recommendations": [{
                "action_type": "repeat_test",
                "action_text": "Repeat serum creatinine",
                "timeframe": "7-14 days"
            }],
            "evidence": []
        })
        .to_string()
    }

    #[test]
    fn bare_object_parses() {
        let output = parse_recommendation(&document()).unwrap();
        assert_eq!(output.assessment.risk_level, RiskLevel::MediumHigh);
        assert_eq!(output.recommendations[0].action_type, ActionType::RepeatTest);
    }

    #[test]
    fn json_fence_parses() {
        let raw = format!("Here is the result:\n```json\n{}\n```\n", document());
        let output = parse_recommendation(&raw).unwrap();
        assert_eq!(output.case_id, "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn bare_fence_parses() {
        let raw = format!("```\n{}\n```", document());
        assert!(parse_recommendation(&raw).is_ok());
    }

    #[test]
    fn prose_wrapped_object_parses() {
        let raw = format!(
            "Based on my analysis:\n\n{}\n\nLet me know if you need anything else.",
            document()
        );
        assert!(parse_recommendation(&raw).is_ok());
    }

    #[test]
    fn all_extraction_shapes_agree() {
        let doc = document();
        let bare = extract_json(&doc).unwrap();
        let fenced = extract_json(&format!("```json\n{doc}\n```")).unwrap();
        let wrapped = extract_json(&format!("prose {doc} trailing")).unwrap();
        assert_eq!(bare, fenced);
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn commentary_after_closed_fence_is_ignored() {
        let raw = format!(
            "```json\n{}\n```\nNote: this assessment is decision support only.",
            document()
        );
        assert!(parse_recommendation(&raw).is_ok());
    }

    #[test]
    fn no_json_is_malformed_output() {
        let err = parse_recommendation("I could not produce a recommendation.").unwrap_err();
        assert!(matches!(err, Error::MalformedOutput { .. }));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(extract_json("[1, 2, 3]").is_none());
        assert!(extract_json("\"just a string\"").is_none());
    }

    #[test]
    fn schema_mismatch_is_malformed_output() {
        let raw = r#"{"case_id": "abc", "unexpected": true}"#;
        let err = parse_recommendation(raw).unwrap_err();
        match err {
            Error::MalformedOutput { reason } => {
                assert!(reason.contains("schema"));
            }
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[test]
    fn unknown_enum_value_is_malformed_output() {
        let raw = document().replace("medium-high", "extreme");
        assert!(matches!(
            parse_recommendation(&raw),
            Err(Error::MalformedOutput { .. })
        ));
    }
}
