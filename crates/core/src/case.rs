//! Case domain types.
//!
//! A case is one end-to-end pipeline run for a single trigger observation.
//! The request resolves to a [`CaseDescriptor`] once the observation has been
//! fetched; the descriptor is immutable from then on.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming trigger, from the REST endpoint or the CLI.
///
/// Wire field names match the upstream trigger contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRequest {
    /// Observation reference, bare ("12") or prefixed ("Observation/12").
    #[serde(rename = "TriggerObservationRef")]
    pub trigger_observation_ref: String,

    /// Optional case ID. Generated if absent.
    #[serde(
        rename = "CaseId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub case_id: Option<Uuid>,
}

impl CaseRequest {
    pub fn new(trigger_observation_ref: impl Into<String>) -> Self {
        Self {
            trigger_observation_ref: trigger_observation_ref.into(),
            case_id: None,
        }
    }

    /// The case ID to use for this run: the supplied one, or a fresh v4 UUID.
    pub fn resolve_case_id(&self) -> String {
        self.case_id.unwrap_or_else(Uuid::new_v4).to_string()
    }
}

/// Abnormality status of the trigger lab result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabStatus {
    Normal,
    Abnormal,
    Critical,
}

impl std::fmt::Display for LabStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabStatus::Normal => write!(f, "normal"),
            LabStatus::Abnormal => write!(f, "abnormal"),
            LabStatus::Critical => write!(f, "critical"),
        }
    }
}

/// The trigger lab result, derived once from the fetched observation.
/// Read-only input to all three pipeline steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub status: LabStatus,
}

/// Everything the orchestrator needs to run one case.
#[derive(Debug, Clone)]
pub struct CaseDescriptor {
    /// UUID string, supplied or generated; stable for the whole run.
    pub case_id: String,

    /// FHIR patient reference (e.g., "Patient/123"), passed through unchanged.
    pub patient_ref: String,

    /// FHIR observation reference (e.g., "Observation/12"), passed through
    /// unchanged.
    pub trigger_observation_ref: String,

    pub lab_result: LabResult,
}

/// Ordered accumulation of step outputs, keyed by step name.
///
/// Written once per step by the orchestrator; later steps read earlier
/// outputs through a shared reference and can never mutate them. Scoped to
/// one case; nothing here is shared across concurrent runs.
#[derive(Debug, Default)]
pub struct PipelineContext {
    steps: Vec<(String, String)>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed step's output. Last write for a name wins on read,
    /// but the pipeline only ever records each step once.
    pub fn record(&mut self, step: impl Into<String>, output: impl Into<String>) {
        self.steps.push((step.into(), output.into()));
    }

    pub fn get(&self, step: &str) -> Option<&str> {
        self.steps
            .iter()
            .rev()
            .find(|(name, _)| name == step)
            .map(|(_, output)| output.as_str())
    }

    /// Completed steps in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps
            .iter()
            .map(|(name, output)| (name.as_str(), output.as_str()))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
