//! Sequential three-step orchestration of one follow-up case.
//!
//! Context gathering, evidence retrieval, reasoning. Each step's full text
//! output lands in the [`PipelineContext`] before the next step starts, and
//! the reasoning step's text must parse into the recommendation schema.
//! There are no retries and no timeouts here; the service layer owns
//! deadlines.

use std::sync::Arc;

use labfollowup_config::AppConfig;
use labfollowup_core::output::now_iso8601;
use labfollowup_core::{
    CaseDescriptor, ClinicalRecommendationOutput, Error, FhirReader, GuidelineStore,
    PipelineContext, Provider, ToolRegistry,
};
use tracing::info;

use crate::output_parser;
use crate::roles::RoleDefinition;
use crate::step_runner::StepRunner;
use crate::tasks;

/// Step names under which outputs are recorded in the [`PipelineContext`].
const CONTEXT_STEP: &str = "patient_context";
const EVIDENCE_STEP: &str = "guideline_evidence";

/// The full case pipeline, wired once at startup and shared across requests.
pub struct LabFollowupPipeline {
    runner: StepRunner,
    context_tools: ToolRegistry,
    evidence_tools: ToolRegistry,
    reasoning_tools: ToolRegistry,
    provider_name: String,
    model_name: String,
}

impl LabFollowupPipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        fhir: Arc<dyn FhirReader>,
        store: Arc<dyn GuidelineStore>,
        config: &AppConfig,
    ) -> Self {
        let provider_name = provider.name().to_string();
        let runner = StepRunner::new(provider, config.provider.model.clone())
            .with_temperature(config.provider.temperature)
            .with_max_tokens(config.pipeline.max_tokens)
            .with_max_tool_iterations(config.pipeline.max_tool_iterations);

        Self {
            runner,
            context_tools: labfollowup_tools::context_registry(
                fhir,
                config.pipeline.trend_lookback_days,
            ),
            evidence_tools: labfollowup_tools::evidence_registry(
                store,
                config.pipeline.guideline_top_k as usize,
            ),
            reasoning_tools: ToolRegistry::new(),
            provider_name,
            model_name: config.provider.model.clone(),
        }
    }

    /// Run the three steps for one case and return the validated output.
    pub async fn run(&self, case: &CaseDescriptor) -> Result<ClinicalRecommendationOutput, Error> {
        info!(
            case_id = %case.case_id,
            patient_ref = %case.patient_ref,
            observation = %case.trigger_observation_ref,
            test = %case.lab_result.test_name,
            "Starting lab follow-up pipeline"
        );

        let mut ctx = PipelineContext::new();

        let context_output = self
            .runner
            .run_step(
                &RoleDefinition::context(),
                &tasks::context_task(case),
                &self.context_tools,
            )
            .await?;
        ctx.record(CONTEXT_STEP, context_output);

        let evidence_output = self
            .runner
            .run_step(
                &RoleDefinition::evidence(),
                &tasks::evidence_task(case, ctx.get(CONTEXT_STEP).unwrap_or_default()),
                &self.evidence_tools,
            )
            .await?;
        ctx.record(EVIDENCE_STEP, evidence_output);

        let reasoning_output = self
            .runner
            .run_step(
                &RoleDefinition::reasoning(),
                &tasks::reasoning_task(
                    case,
                    ctx.get(CONTEXT_STEP).unwrap_or_default(),
                    ctx.get(EVIDENCE_STEP).unwrap_or_default(),
                ),
                &self.reasoning_tools,
            )
            .await?;

        let mut output = output_parser::parse_recommendation(&reasoning_output)?;

        // Identifiers and run metadata are authoritative here, not in the
        // model's echo of them.
        output.case_id = case.case_id.clone();
        output.patient_ref = case.patient_ref.clone();
        output.trigger_observation_ref = case.trigger_observation_ref.clone();
        output.created_at = now_iso8601();
        output.metadata.model_provider = self.provider_name.clone();
        output.metadata.model_name = self.model_name.clone();

        output.validate()?;

        info!(
            case_id = %output.case_id,
            risk = ?output.assessment.risk_level,
            recommendations = output.recommendations.len(),
            "Pipeline completed"
        );

        Ok(output)
    }
}
