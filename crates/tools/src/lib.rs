//! Clinical tools exposed to the follow-up pipeline roles.
//!
//! Each pipeline step gets its own registry: the context step reads the
//! patient record over FHIR, the evidence step searches the guideline
//! store. Tools report upstream failures as readable degraded text
//! rather than errors, so a flaky FHIR server or guideline database
//! weakens the assessment instead of aborting the case.

pub mod guideline_search;
pub mod lab_trend;
pub mod patient_context;

pub use guideline_search::GuidelineSearchTool;
pub use lab_trend::LabTrendTool;
pub use patient_context::PatientContextTool;

use std::sync::Arc;

use labfollowup_core::fhir::FhirReader;
use labfollowup_core::{GuidelineStore, ToolRegistry};

/// Builds the tool registry for the context-gathering role.
pub fn context_registry(fhir: Arc<dyn FhirReader>, trend_lookback_days: u32) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(PatientContextTool::new(fhir.clone())));
    registry.register(Box::new(LabTrendTool::new(fhir, trend_lookback_days)));
    registry
}

/// Builds the tool registry for the evidence-retrieval role.
pub fn evidence_registry(store: Arc<dyn GuidelineStore>, top_k: usize) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GuidelineSearchTool::new(store, top_k)));
    registry
}
