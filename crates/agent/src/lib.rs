//! # labfollowup-agent
//!
//! The orchestration layer: three specialist roles run in a fixed sequence
//! (patient context, guideline evidence, clinical reasoning) over a shared
//! step runner, and the final step's text is parsed and validated into a
//! [`labfollowup_core::ClinicalRecommendationOutput`].

pub mod output_parser;
pub mod pipeline;
pub mod prompts;
pub mod roles;
pub mod step_runner;
pub mod tasks;

pub use pipeline::LabFollowupPipeline;
pub use roles::RoleDefinition;
pub use step_runner::StepRunner;
