pub mod evaluate;
pub mod ingest;
pub mod serve;

use std::sync::Arc;

use anyhow::Context;
use labfollowup_agent::LabFollowupPipeline;
use labfollowup_config::AppConfig;
use labfollowup_core::{FhirReader, GuidelineStore, Provider};
use labfollowup_fhir::FhirClient;
use labfollowup_guidelines::SqlGuidelineStore;
use labfollowup_providers::OpenAiProvider;

/// Handles shared by the `evaluate` and `serve` commands.
pub struct Runtime {
    pub fhir: Arc<dyn FhirReader>,
    pub pipeline: Arc<LabFollowupPipeline>,
}

/// Wire the FHIR client, provider, and guideline store into a pipeline.
pub async fn build_runtime(config: &AppConfig) -> anyhow::Result<Runtime> {
    let fhir: Arc<dyn FhirReader> = Arc::new(FhirClient::new(
        &config.fhir.base_url,
        &config.fhir.username,
        &config.fhir.password,
    ));

    let provider: Arc<dyn Provider> = Arc::new(
        OpenAiProvider::from_config(&config.provider).context("Failed to configure provider")?,
    );

    let store: Arc<dyn GuidelineStore> = Arc::new(
        SqlGuidelineStore::connect(&config.guidelines)
            .await
            .context("Failed to connect to the guideline store")?,
    );

    let pipeline = Arc::new(LabFollowupPipeline::new(
        provider,
        fhir.clone(),
        store,
        config,
    ));

    Ok(Runtime { fhir, pipeline })
}
