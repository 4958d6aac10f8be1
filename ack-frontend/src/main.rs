use ack_frontend::cli::Cli;
use ack_frontend::commands;
use ack_frontend::config::get_configuration;
use ack_frontend::preview::PdftoppmBackend;
use ack_frontend::services::DocumentClient;
use ack_frontend::DocumentWorkflow;
use clap::Parser;
use dotenvy::dotenv;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("ack-frontend", &configuration.logging)?;

    let client = DocumentClient::new(configuration.api.clone())?;
    client.login().await?;

    let backend = Arc::new(PdftoppmBackend::new(configuration.preview.clone()));
    let workflow = DocumentWorkflow::new(Arc::new(client), backend, configuration.preview.scale);

    commands::run(cli.command, &workflow).await
}
