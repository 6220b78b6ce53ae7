use anyhow::Result;
use clap::Parser;
use railmcp_core::ApiConfig;
use railmcp_server::{api, config::AppState};

#[derive(Parser, Debug)]
#[command(name = "railmcp")]
#[command(about = "MCP tool server for the Railway platform API", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3333")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railmcp=info,tower_http=info".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Starting railmcp MCP server");

    // Backend credential and endpoint come from the environment.
    let api_config = ApiConfig::from_env()?;
    let state = AppState::new(&api_config)?;
    tracing::info!(commands = state.registry.len(), "command table loaded");

    let addr = format!("{}:{}", args.host, args.port);
    api::serve(&addr, state).await?;

    Ok(())
}
