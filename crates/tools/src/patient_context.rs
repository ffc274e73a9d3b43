//! Patient context tool backed by the FHIR `$everything` operation.
//!
//! Fetches the full patient record bundle and renders the clinically
//! relevant slices (recent labs, active medications, active conditions,
//! recent vitals) as plain text the model can read directly.

use std::sync::Arc;

use async_trait::async_trait;
use labfollowup_core::fhir::{bundle_entries, FhirReader};
use labfollowup_core::{Tool, ToolError, ToolResult};
use serde_json::{json, Value};
use tracing::warn;

/// Tool that summarizes a patient's record for the context-gathering step.
pub struct PatientContextTool {
    fhir: Arc<dyn FhirReader>,
}

impl PatientContextTool {
    pub fn new(fhir: Arc<dyn FhirReader>) -> Self {
        Self { fhir }
    }
}

#[async_trait]
impl Tool for PatientContextTool {
    fn name(&self) -> &str {
        "fetch_patient_context"
    }

    fn description(&self) -> &str {
        "Fetch the patient's clinical context from the FHIR server: recent lab results, \
         active medications, active conditions, and recent vital signs. Use this to \
         understand the patient's overall clinical picture before assessing a lab result."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "patient_id": {
                    "type": "string",
                    "description": "FHIR patient ID (e.g., '123' from 'Patient/123')"
                },
                "test_name_hint": {
                    "type": "string",
                    "description": "Optional name of the lab test under review, used to focus the summary"
                }
            },
            "required": ["patient_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let patient_id = arguments["patient_id"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("'patient_id' is required".to_string()))?;

        match self.fhir.patient_everything(patient_id).await {
            Ok(bundle) => Ok(ToolResult::text(format_context(patient_id, &bundle))),
            Err(e) => {
                warn!(patient_id = %patient_id, error = %e, "Patient context fetch failed");
                Ok(ToolResult::degraded(format!(
                    "Error fetching patient context: {e}"
                )))
            }
        }
    }
}

// --- Bundle rendering ---

/// Renders a `$everything` bundle as a sectioned plain-text summary.
///
/// Sections appear in a fixed order (labs, medications, conditions,
/// vitals) and are omitted entirely when empty, so a sparse record
/// yields a short summary rather than empty headings.
fn format_context(patient_id: &str, bundle: &Value) -> String {
    let mut labs: Vec<String> = Vec::new();
    let mut medications: Vec<String> = Vec::new();
    let mut conditions: Vec<String> = Vec::new();
    let mut vitals: Vec<(String, String)> = Vec::new();

    for resource in bundle_entries(bundle) {
        match resource["resourceType"].as_str() {
            Some("Observation") => collect_observation(resource, &mut labs, &mut vitals),
            Some("MedicationRequest") => collect_medication(resource, &mut medications),
            Some("Condition") => collect_condition(resource, &mut conditions),
            _ => {}
        }
    }

    let mut output = format!("Patient ID: {patient_id}\n\n");

    if !labs.is_empty() {
        output.push_str("Recent Lab Results:\n");
        for lab in &labs {
            output.push_str(&format!("  - {lab}\n"));
        }
        output.push('\n');
    }

    if !medications.is_empty() {
        output.push_str("Active Medications:\n");
        for medication in &medications {
            output.push_str(&format!("  - {medication}\n"));
        }
        output.push('\n');
    }

    if !conditions.is_empty() {
        output.push_str("Clinical Conditions:\n");
        for condition in &conditions {
            output.push_str(&format!("  - {condition}\n"));
        }
        output.push('\n');
    }

    if !vitals.is_empty() {
        output.push_str("Recent Vitals:\n");
        for (name, value) in &vitals {
            output.push_str(&format!("  - {name}: {value}\n"));
        }
    }

    output
}

/// Routes an Observation into the lab list or the vitals list.
///
/// Vitals are keyed by display name so repeated readings collapse to
/// the most recent value. Observations without a recognizable category
/// are treated as labs.
fn collect_observation(resource: &Value, labs: &mut Vec<String>, vitals: &mut Vec<(String, String)>) {
    let name = resource["code"]["text"].as_str().unwrap_or("Unknown").to_string();
    let value = quantity_display(&resource["valueQuantity"]);
    let date = resource["effectiveDateTime"].as_str().unwrap_or("Unknown date");

    let category = resource["category"][0]["coding"][0]["code"]
        .as_str()
        .unwrap_or("")
        .to_lowercase();

    if !category.contains("laboratory") && category.contains("vital-signs") {
        match vitals.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => vitals.push((name, value)),
        }
    } else {
        labs.push(format!("{name}: {value} ({date})"));
    }
}

/// Keeps active and on-hold medication requests, dropping the rest.
fn collect_medication(resource: &Value, medications: &mut Vec<String>) {
    let status = resource["status"].as_str().unwrap_or("");
    if !matches!(status, "active" | "on-hold") {
        return;
    }

    let concept = &resource["medicationCodeableConcept"];
    let name = concept["text"]
        .as_str()
        .filter(|s| !s.is_empty())
        .or_else(|| concept["coding"][0]["display"].as_str())
        .unwrap_or("Unknown medication");

    let dosage = resource["dosageInstruction"][0]["text"].as_str().unwrap_or("");
    if dosage.is_empty() {
        medications.push(name.to_string());
    } else {
        medications.push(format!("{name} - {dosage}"));
    }
}

/// Keeps conditions whose clinical status is active, recurrence, or relapse.
fn collect_condition(resource: &Value, conditions: &mut Vec<String>) {
    let clinical_status = resource["clinicalStatus"]["coding"][0]["code"]
        .as_str()
        .unwrap_or("");
    if !matches!(clinical_status, "active" | "recurrence" | "relapse") {
        return;
    }

    let code = &resource["code"];
    let name = code["text"]
        .as_str()
        .filter(|s| !s.is_empty())
        .or_else(|| code["coding"][0]["display"].as_str())
        .unwrap_or("Unknown condition");

    let onset = resource["onsetDateTime"].as_str().unwrap_or("");
    if onset.is_empty() {
        conditions.push(name.to_string());
    } else {
        conditions.push(format!("{name} (since {onset})"));
    }
}

/// Renders a `valueQuantity` as "value unit", or "N/A" when absent.
fn quantity_display(quantity: &Value) -> String {
    match quantity.as_object() {
        Some(vq) if !vq.is_empty() => {
            let value = vq
                .get("value")
                .and_then(Value::as_f64)
                .map_or_else(|| "N/A".to_string(), |v| v.to_string());
            let unit = vq.get("unit").and_then(Value::as_str).unwrap_or("");
            format!("{value} {unit}")
        }
        _ => "N/A".to_string(),
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use labfollowup_core::error::FhirError;
    use labfollowup_core::fhir::ObservationSummary;

    struct CannedFhir {
        bundle: Value,
    }

    #[async_trait]
    impl FhirReader for CannedFhir {
        async fn fetch_observation(
            &self,
            reference: &str,
        ) -> Result<ObservationSummary, FhirError> {
            Err(FhirError::NotFound {
                resource: reference.to_string(),
            })
        }

        async fn patient_everything(&self, _patient_id: &str) -> Result<Value, FhirError> {
            Ok(self.bundle.clone())
        }

        async fn observation_history(
            &self,
            _patient_id: &str,
            _test_code: &str,
            _count: u32,
        ) -> Result<Value, FhirError> {
            Ok(json!({"resourceType": "Bundle", "entry": []}))
        }
    }

    struct UnreachableFhir;

    #[async_trait]
    impl FhirReader for UnreachableFhir {
        async fn fetch_observation(
            &self,
            reference: &str,
        ) -> Result<ObservationSummary, FhirError> {
            Err(FhirError::NotFound {
                resource: reference.to_string(),
            })
        }

        async fn patient_everything(&self, _patient_id: &str) -> Result<Value, FhirError> {
            Err(FhirError::Unreachable("connection refused".to_string()))
        }

        async fn observation_history(
            &self,
            _patient_id: &str,
            _test_code: &str,
            _count: u32,
        ) -> Result<Value, FhirError> {
            Err(FhirError::Unreachable("connection refused".to_string()))
        }
    }

    fn lab_observation(name: &str, value: f64, unit: &str, date: &str) -> Value {
        json!({
            "resourceType": "Observation",
            "code": {"text": name},
            "valueQuantity": {"value": value, "unit": unit},
            "effectiveDateTime": date,
            "category": [{"coding": [{"code": "laboratory"}]}]
        })
    }

    fn vital_observation(name: &str, value: f64, unit: &str) -> Value {
        json!({
            "resourceType": "Observation",
            "code": {"text": name},
            "valueQuantity": {"value": value, "unit": unit},
            "category": [{"coding": [{"code": "vital-signs"}]}]
        })
    }

    fn full_bundle() -> Value {
        json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": lab_observation("Creatinine", 2.1, "mg/dL", "2026-01-15")},
                {"resource": {
                    "resourceType": "MedicationRequest",
                    "status": "active",
                    "medicationCodeableConcept": {"text": "Lisinopril 10mg"},
                    "dosageInstruction": [{"text": "Once daily"}]
                }},
                {"resource": {
                    "resourceType": "Condition",
                    "clinicalStatus": {"coding": [{"code": "active"}]},
                    "code": {"text": "Chronic kidney disease"},
                    "onsetDateTime": "2024-03-01"
                }},
                {"resource": vital_observation("Blood Pressure", 142.0, "mmHg")}
            ]
        })
    }

    #[tokio::test]
    async fn renders_all_sections_in_order() {
        let tool = PatientContextTool::new(Arc::new(CannedFhir {
            bundle: full_bundle(),
        }));

        let result = tool
            .execute(json!({"patient_id": "123"}))
            .await
            .expect("execute should succeed");

        assert!(result.success);
        let expected = "Patient ID: 123\n\n\
            Recent Lab Results:\n  - Creatinine: 2.1 mg/dL (2026-01-15)\n\n\
            Active Medications:\n  - Lisinopril 10mg - Once daily\n\n\
            Clinical Conditions:\n  - Chronic kidney disease (since 2024-03-01)\n\n\
            Recent Vitals:\n  - Blood Pressure: 142 mmHg\n";
        assert_eq!(result.output, expected);
    }

    #[tokio::test]
    async fn empty_bundle_yields_header_only() {
        let tool = PatientContextTool::new(Arc::new(CannedFhir {
            bundle: json!({"resourceType": "Bundle", "entry": []}),
        }));

        let result = tool.execute(json!({"patient_id": "123"})).await.unwrap();

        assert_eq!(result.output, "Patient ID: 123\n\n");
    }

    #[tokio::test]
    async fn repeated_vitals_keep_latest_value() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": vital_observation("Heart Rate", 72.0, "bpm")},
                {"resource": vital_observation("Heart Rate", 88.0, "bpm")}
            ]
        });
        let tool = PatientContextTool::new(Arc::new(CannedFhir { bundle }));

        let result = tool.execute(json!({"patient_id": "9"})).await.unwrap();

        assert_eq!(
            result.output,
            "Patient ID: 9\n\nRecent Vitals:\n  - Heart Rate: 88 bpm\n"
        );
    }

    #[tokio::test]
    async fn uncategorized_observation_reads_as_lab() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [{"resource": {
                "resourceType": "Observation",
                "code": {"text": "Potassium"},
                "valueQuantity": {"value": 5.4, "unit": "mmol/L"},
                "effectiveDateTime": "2026-02-01"
            }}]
        });
        let tool = PatientContextTool::new(Arc::new(CannedFhir { bundle }));

        let result = tool.execute(json!({"patient_id": "9"})).await.unwrap();

        assert!(result.output.contains("Recent Lab Results:"));
        assert!(result
            .output
            .contains("  - Potassium: 5.4 mmol/L (2026-02-01)\n"));
    }

    #[tokio::test]
    async fn inactive_entries_are_skipped() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {
                    "resourceType": "MedicationRequest",
                    "status": "stopped",
                    "medicationCodeableConcept": {"text": "Old med"}
                }},
                {"resource": {
                    "resourceType": "Condition",
                    "clinicalStatus": {"coding": [{"code": "resolved"}]},
                    "code": {"text": "Past condition"}
                }}
            ]
        });
        let tool = PatientContextTool::new(Arc::new(CannedFhir { bundle }));

        let result = tool.execute(json!({"patient_id": "9"})).await.unwrap();

        assert_eq!(result.output, "Patient ID: 9\n\n");
    }

    #[tokio::test]
    async fn missing_value_quantity_renders_na() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [{"resource": {
                "resourceType": "Observation",
                "code": {"text": "Urinalysis"},
                "effectiveDateTime": "2026-02-01",
                "category": [{"coding": [{"code": "laboratory"}]}]
            }}]
        });
        let tool = PatientContextTool::new(Arc::new(CannedFhir { bundle }));

        let result = tool.execute(json!({"patient_id": "9"})).await.unwrap();

        assert!(result.output.contains("  - Urinalysis: N/A (2026-02-01)\n"));
    }

    #[tokio::test]
    async fn medication_display_falls_back_to_coding() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [{"resource": {
                "resourceType": "MedicationRequest",
                "status": "active",
                "medicationCodeableConcept": {
                    "coding": [{"display": "Metformin 500mg"}]
                }
            }}]
        });
        let tool = PatientContextTool::new(Arc::new(CannedFhir { bundle }));

        let result = tool.execute(json!({"patient_id": "9"})).await.unwrap();

        assert!(result.output.contains("  - Metformin 500mg\n"));
    }

    #[tokio::test]
    async fn fetch_failure_degrades_with_readable_message() {
        let tool = PatientContextTool::new(Arc::new(UnreachableFhir));

        let result = tool.execute(json!({"patient_id": "123"})).await.unwrap();

        assert!(!result.success);
        assert!(result.output.starts_with("Error fetching patient context:"));
    }

    #[tokio::test]
    async fn missing_patient_id_is_invalid() {
        let tool = PatientContextTool::new(Arc::new(CannedFhir {
            bundle: json!({}),
        }));

        let err = tool.execute(json!({})).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
