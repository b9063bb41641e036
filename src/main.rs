use ollama_mcp::config::Config;
use ollama_mcp::gateway::Gateway;
use ollama_mcp::mcp::GatewayServer;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Starting Ollama MCP server (backend {}, default model {})",
        config.base_url,
        config.default_model
    );

    let server = GatewayServer::new(Gateway::from_config(config));
    let service = server.serve(stdio()).await?;
    let reason = service.waiting().await?;
    tracing::info!("Server stopped: {:?}", reason);

    Ok(())
}
