//! `labfollowup ingest`: chunk and load guideline documents.

use anyhow::Context;
use labfollowup_config::AppConfig;
use labfollowup_guidelines::SqlGuidelineStore;
use std::path::PathBuf;

pub async fn run(dir: PathBuf) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let store = SqlGuidelineStore::connect(&config.guidelines)
        .await
        .context("Failed to connect to the guideline store")?;
    store
        .migrate()
        .await
        .context("Failed to prepare the chunk table")?;

    println!("📚 Guideline Ingestion");
    println!("   Directory: {}", dir.display());
    println!("   Table:     {}", config.guidelines.qualified_table());

    let report = labfollowup_guidelines::ingest_directory(&store, &dir)
        .await
        .with_context(|| format!("Ingestion failed for {}", dir.display()))?;

    println!("\nDocuments ({}):", report.documents.len());
    for doc in &report.documents {
        let marker = if doc.truncated { " (truncated)" } else { "" };
        println!(
            "   {} \"{}\": {} chunks{}",
            doc.guideline_id, doc.title, doc.chunks, marker
        );
    }

    println!("\nChunks upserted this run: {}", report.chunks_upserted);
    println!(
        "Chunk table now holds {} rows ({} embedded)",
        report.chunks_total, report.chunks_embedded
    );

    Ok(())
}
