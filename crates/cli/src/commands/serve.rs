//! `labfollowup serve`: start the REST gateway.

use anyhow::Context;
use labfollowup_config::AppConfig;
use labfollowup_gateway::AppState;

pub async fn run(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let runtime = super::build_runtime(&config).await?;

    println!("🏥 Lab Follow-up Gateway");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   FHIR:      {}", config.fhir.base_url);
    println!("   Model:     {}", config.provider.model);

    let state = AppState {
        pipeline: runtime.pipeline,
        fhir: runtime.fhir,
        fhir_base_url: config.fhir.base_url.clone(),
    };

    labfollowup_gateway::serve(&config.server, state).await?;

    Ok(())
}
