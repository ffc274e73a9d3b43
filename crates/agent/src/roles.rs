//! Role definitions consumed by the step runner.

use crate::prompts;

/// A specialist persona bound to one pipeline step. Plain data; the step
/// runner turns it into a system prompt and the pipeline binds the matching
/// tool registry.
#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    /// Names of the tools this role is allowed to call.
    pub tools: &'static [&'static str],
}

impl RoleDefinition {
    /// Step 1: gathers patient context from the FHIR record.
    pub fn context() -> Self {
        Self {
            name: prompts::CONTEXT_ROLE,
            goal: prompts::CONTEXT_GOAL,
            backstory: prompts::CONTEXT_BACKSTORY,
            tools: &["fetch_patient_context", "analyze_lab_trend"],
        }
    }

    /// Step 2: retrieves guideline evidence via semantic search.
    pub fn evidence() -> Self {
        Self {
            name: prompts::EVIDENCE_ROLE,
            goal: prompts::EVIDENCE_GOAL,
            backstory: prompts::EVIDENCE_BACKSTORY,
            tools: &["search_clinical_guidelines"],
        }
    }

    /// Step 3: synthesizes the structured recommendation. No tools; this
    /// role only reasons over the prior steps' outputs.
    pub fn reasoning() -> Self {
        Self {
            name: prompts::REASONING_ROLE,
            goal: prompts::REASONING_GOAL,
            backstory: prompts::REASONING_BACKSTORY,
            tools: &[],
        }
    }

    /// The system prompt sent to the provider for this role's step.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}.\n\n{}\n\nYour goal: {}",
            self.name,
            self.backstory.trim(),
            self.goal.trim()
        )
    }
}
