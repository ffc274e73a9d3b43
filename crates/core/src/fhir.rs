//! FHIR read access, the abstraction over the clinical-data repository.
//!
//! The pipeline never talks HTTP directly; it reads through this trait. The
//! concrete client lives in `labfollowup-fhir`, tests use canned resources.

use crate::case::{LabResult, LabStatus};
use crate::error::FhirError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The normalized trigger observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationSummary {
    /// Reconstructed reference in `Observation/{id}` form.
    pub observation_ref: String,

    /// The observation's subject (e.g., "Patient/123").
    pub patient_ref: String,

    pub test_name: String,
    pub value: f64,
    pub unit: String,

    /// Test code used for history searches (first `code.coding[].code`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,

    pub status: LabStatus,
}

impl ObservationSummary {
    pub fn lab_result(&self) -> LabResult {
        LabResult {
            test_name: self.test_name.clone(),
            value: self.value,
            unit: self.unit.clone(),
            status: self.status,
        }
    }
}

/// Read operations against the FHIR repository.
#[async_trait]
pub trait FhirReader: Send + Sync {
    /// Fetch and normalize a single observation.
    ///
    /// The reference may be bare ("12") or prefixed ("Observation/12");
    /// both resolve to the same resource.
    async fn fetch_observation(
        &self,
        reference: &str,
    ) -> std::result::Result<ObservationSummary, FhirError>;

    /// Fetch the complete record bundle for a patient
    /// (the `$everything` operation), as raw FHIR JSON.
    async fn patient_everything(
        &self,
        patient_id: &str,
    ) -> std::result::Result<serde_json::Value, FhirError>;

    /// Search historical observations for one test code, newest first,
    /// capped at `count` results. Returns the raw search bundle.
    async fn observation_history(
        &self,
        patient_id: &str,
        test_code: &str,
        count: u32,
    ) -> std::result::Result<serde_json::Value, FhirError>;
}

/// Resource entries of a FHIR bundle, in bundle order.
pub fn bundle_entries(bundle: &serde_json::Value) -> Vec<&serde_json::Value> {
    bundle
        .get("entry")
        .and_then(|e| e.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("resource"))
                .collect()
        })
        .unwrap_or_default()
}
