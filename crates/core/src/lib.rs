//! # labfollowup-core
//!
//! Domain types, traits, and error definitions for the lab follow-up
//! recommendation pipeline. This crate defines the domain model that all
//! other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external system is reached through a trait defined here (`Provider`
//! for the LLM, `FhirReader` for the clinical-data repository,
//! `GuidelineStore` for the vector store, `Tool` for role capabilities).
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Testing the whole pipeline against scripted mocks
//! - Clean dependency graph (all crates depend inward on core)

pub mod case;
pub mod error;
pub mod fhir;
pub mod guidelines;
pub mod message;
pub mod output;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use case::{CaseDescriptor, CaseRequest, LabResult, LabStatus, PipelineContext};
pub use error::{Error, Result};
pub use fhir::{FhirReader, ObservationSummary};
pub use guidelines::{GuidelineChunk, GuidelineStore};
pub use message::{Message, MessageToolCall, Role};
pub use output::{
    ActionType, AssessmentSummary, ClinicalRecommendationOutput, Confidence, EvidenceItem,
    RecommendationItem, RiskLevel, WorkflowMetadata,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
