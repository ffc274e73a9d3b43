//! Task prompt templates, one per pipeline step.
//!
//! Each builder interpolates the case identifiers and lab-result fields
//! into a static template. Later steps also receive the prior steps'
//! outputs as labeled context blocks.

use labfollowup_core::CaseDescriptor;

/// Bare FHIR patient ID, with any "Patient/" prefix removed. Tools take
/// the bare ID, not the full reference.
fn patient_id(patient_ref: &str) -> &str {
    patient_ref.strip_prefix("Patient/").unwrap_or(patient_ref)
}

/// The trigger lab result as a labeled block, shared by all three tasks.
fn lab_block(case: &CaseDescriptor) -> String {
    let lab = &case.lab_result;
    format!(
        "**Lab Result:**\n- Test: {}\n- Value: {} {}\n- Status: {}",
        lab.test_name, lab.value, lab.unit, lab.status
    )
}

/// Task 1: gather patient clinical context.
pub fn context_task(case: &CaseDescriptor) -> String {
    format!(
        r#"Retrieve comprehensive clinical context for the patient.

**Patient:** {patient_ref}
**Patient ID (use this with tools):** {patient_id}
**Trigger Observation:** {observation_ref}

{lab_block}

**Your Tasks:**
1. Use the fetch_patient_context tool to retrieve patient context.
   IMPORTANT: pass ONLY the identifier (e.g., "123") as patient_id,
   NOT the full FHIR reference (e.g., NOT "Patient/123").

   Retrieve:
   - Recent lab results (focus on the same test)
   - Active medications
   - Known clinical conditions
   - Recent vital signs

2. Use the analyze_lab_trend tool to analyze trends for this specific test:
   - Is this value stable, increasing, or decreasing?
   - What is the change over time?

**Output Format:**
Provide a structured summary of:
- Patient clinical conditions
- Recent lab trends
- Active medications (especially those relevant to kidney function)
- Any relevant vital signs

Focus on information that helps understand the clinical significance
of this abnormal lab result."#,
        patient_ref = case.patient_ref,
        patient_id = patient_id(&case.patient_ref),
        observation_ref = case.trigger_observation_ref,
        lab_block = lab_block(case),
    )
}

/// Task 2: search clinical guidelines, informed by the context step.
pub fn evidence_task(case: &CaseDescriptor, patient_context: &str) -> String {
    format!(
        r#"Search clinical guidelines for evidence-based recommendations.

{lab_block}

**Patient Context (from the previous step):**
{patient_context}

**Your Tasks:**
1. Use the search_clinical_guidelines tool to find relevant guidelines addressing:
   - Clinical significance of this abnormal value
   - Recommended follow-up actions
   - Workup or diagnostic considerations
   - Treatment implications

2. Focus on guidelines relevant to the patient's clinical conditions
   and medication profile.

**Output Format:**
Provide a structured list of relevant guideline excerpts including:
- Guideline ID
- Chunk ID
- Similarity score
- Excerpt text

Return the top 3-5 most relevant guideline fragments."#,
        lab_block = lab_block(case),
        patient_context = patient_context,
    )
}

/// Task 3: synthesize the structured recommendation from both prior steps.
pub fn reasoning_task(case: &CaseDescriptor, patient_context: &str, evidence: &str) -> String {
    format!(
        r#"Synthesize patient context and clinical evidence to generate follow-up recommendations.

**Case Information:**
- Case ID: {case_id}
- Patient: {patient_ref}
- Trigger Observation: {observation_ref}

{lab_block}

**Patient Context (from the context step):**
{patient_context}

**Clinical Evidence (from the evidence step):**
{evidence}

**Your Tasks:**
1. Analyze the patient context
2. Review the clinical evidence
3. Identify trends and risk factors
4. Generate specific follow-up recommendations

**Assessment:**
- Determine risk level: low | medium | medium-high | high
- Determine confidence: low | medium | high
- Write a concise reasoning summary (2-3 sentences)

**Recommendations:**
Generate 1-5 specific, actionable recommendations. Each should have:
- action_type: repeat_test | med_review | monitor | imaging | referral | lifestyle
- action_text: Clear, specific action (e.g., "Repeat serum creatinine measurement to confirm trend")
- timeframe: When to do it (e.g., "7-14 days", "as soon as possible")

**Evidence:**
Reference the specific guideline chunks that support your recommendations.
Include guideline_id, chunk_id, similarity score, and excerpt.

**CRITICAL REQUIREMENTS:**
- Frame as clinical decision support, NOT diagnosis
- Use conservative, evidence-based language
- Do NOT prescribe medications
- Do NOT make definitive diagnoses
- ONLY return the structured JSON output

**Output Format:**
Return a valid JSON object matching this structure:
{{
  "case_id": "{case_id}",
  "created_at": "<ISO 8601 timestamp>",
  "patient_ref": "{patient_ref}",
  "trigger_observation_ref": "{observation_ref}",
  "assessment": {{
    "risk_level": "medium-high",
    "confidence": "high",
    "reasoning_summary": "Brief explanation of clinical reasoning..."
  }},
  "recommendations": [
    {{
      "action_type": "repeat_test",
      "action_text": "Specific action description",
      "timeframe": "7-14 days"
    }}
  ],
  "evidence": [
    {{
      "guideline_id": "kdigo_ckd_2024",
      "chunk_id": "kdigo_ckd_2024:chunk-6",
      "similarity": 0.82,
      "excerpt": "Guideline text excerpt..."
    }}
  ],
  "metadata": {{
    "orchestration_framework": "labfollowup",
    "pipeline_name": "renal_followup",
    "model_provider": "openai",
    "model_name": "gpt-4.1-mini",
    "guideline_version": "v1",
    "language": "en"
  }}
}}"#,
        case_id = case.case_id,
        patient_ref = case.patient_ref,
        observation_ref = case.trigger_observation_ref,
        lab_block = lab_block(case),
        patient_context = patient_context,
        evidence = evidence,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use labfollowup_core::{LabResult, LabStatus};

    fn case() -> CaseDescriptor {
        CaseDescriptor {
            case_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            patient_ref: "Patient/123".to_string(),
            trigger_observation_ref: "Observation/12".to_string(),
            lab_result: LabResult {
                test_name: "Creatinine".to_string(),
                value: 2.1,
                unit: "mg/dL".to_string(),
                status: LabStatus::Abnormal,
            },
        }
    }

    #[test]
    fn patient_id_strips_reference_prefix() {
        assert_eq!(patient_id("Patient/123"), "123");
        assert_eq!(patient_id("123"), "123");
    }

    #[test]
    fn context_task_names_bare_patient_id() {
        let prompt = context_task(&case());
        assert!(prompt.contains("**Patient:** Patient/123"));
        assert!(prompt.contains("**Patient ID (use this with tools):** 123"));
        assert!(prompt.contains("- Value: 2.1 mg/dL"));
        assert!(prompt.contains("- Status: abnormal"));
        assert!(prompt.contains("fetch_patient_context"));
        assert!(prompt.contains("analyze_lab_trend"));
    }

    #[test]
    fn evidence_task_embeds_prior_context() {
        let prompt = evidence_task(&case(), "CKD stage 3, creatinine rising");
        assert!(prompt.contains("**Patient Context (from the previous step):**"));
        assert!(prompt.contains("CKD stage 3, creatinine rising"));
        assert!(prompt.contains("search_clinical_guidelines"));
        assert!(prompt.contains("top 3-5 most relevant"));
    }

    #[test]
    fn reasoning_task_embeds_both_blocks_and_schema() {
        let prompt = reasoning_task(&case(), "patient facts", "guideline excerpts");
        assert!(prompt.contains("- Case ID: 550e8400-e29b-41d4-a716-446655440000"));
        assert!(prompt.contains("patient facts"));
        assert!(prompt.contains("guideline excerpts"));
        assert!(prompt.contains("\"case_id\": \"550e8400-e29b-41d4-a716-446655440000\""));
        assert!(prompt.contains("\"patient_ref\": \"Patient/123\""));
        assert!(prompt.contains("\"pipeline_name\": \"renal_followup\""));
        assert!(prompt.contains("repeat_test | med_review | monitor | imaging | referral | lifestyle"));
    }
}
