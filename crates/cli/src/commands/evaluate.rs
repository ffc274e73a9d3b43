//! `labfollowup evaluate`: run one case from the command line.

use anyhow::Context;
use labfollowup_config::AppConfig;
use labfollowup_core::{CaseDescriptor, ClinicalRecommendationOutput};
use uuid::Uuid;

pub async fn run(observation_id: String, case_id: Option<Uuid>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let runtime = super::build_runtime(&config).await?;

    let observation = runtime
        .fhir
        .fetch_observation(&observation_id)
        .await
        .context("Error fetching observation from FHIR server")?;

    let case = CaseDescriptor {
        case_id: case_id.unwrap_or_else(Uuid::new_v4).to_string(),
        patient_ref: observation.patient_ref.clone(),
        trigger_observation_ref: observation.observation_ref.clone(),
        lab_result: observation.lab_result(),
    };

    println!("🏥 Lab Follow-up Recommendation Agent");
    println!("   Case ID:     {}", case.case_id);
    println!("   Patient:     {}", case.patient_ref);
    println!("   Observation: {}", case.trigger_observation_ref);
    println!("   Lab Test:    {}", case.lab_result.test_name);
    println!(
        "   Value:       {} {}",
        case.lab_result.value, case.lab_result.unit
    );
    println!("   Status:      {}", case.lab_result.status);

    let output = runtime
        .pipeline
        .run(&case)
        .await
        .context("Pipeline failed")?;

    print_summary(&output);

    println!("\n📄 Structured JSON:\n");
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Human-readable summary printed before the JSON document.
fn print_summary(output: &ClinicalRecommendationOutput) {
    println!("\n🎯 Assessment:");
    println!("   Risk Level:  {}", output.assessment.risk_level);
    println!("   Confidence:  {}", output.assessment.confidence);
    println!("   Reasoning:   {}", output.assessment.reasoning_summary);

    println!("\n💡 Recommendations ({}):", output.recommendations.len());
    for (i, rec) in output.recommendations.iter().enumerate() {
        println!("   {}. [{}] {}", i + 1, rec.action_type, rec.action_text);
        if let Some(timeframe) = &rec.timeframe {
            println!("      Timeframe: {timeframe}");
        }
    }

    println!("\n📚 Evidence ({}):", output.evidence.len());
    for (i, item) in output.evidence.iter().enumerate() {
        println!(
            "   {}. {} (similarity: {:.3})",
            i + 1,
            item.guideline_id,
            item.similarity
        );
        println!("      Chunk: {}", item.chunk_id);
        println!("      \"{}\"", excerpt_preview(&item.excerpt));
    }
}

/// First 100 characters of an excerpt, with an ellipsis when trimmed.
fn excerpt_preview(excerpt: &str) -> String {
    let mut preview: String = excerpt.chars().take(100).collect();
    if excerpt.chars().count() > 100 {
        preview.push_str("...");
    }
    preview
}
