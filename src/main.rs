use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use todo_house_push::{
    routes,
    state::{AppConfig, AppState},
    utils::vapid::{VapidCredentials, VapidKeyPair},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "todo-house-push", about = "Web Push notification relay for Todo House")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a fresh VAPID key pair as env lines
    GenerateVapidKeys,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::GenerateVapidKeys => {
            print!("{}", VapidKeyPair::generate().to_env_lines());
            Ok(())
        }
        Command::Serve => serve().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "todo_house_push=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    if let Err(e) = VapidCredentials::from_config(&config) {
        tracing::warn!("{}; notifications will fail until VAPID_PUBLIC_KEY and VAPID_PRIVATE_KEY are set", e);
    }

    let bind_addr = config.bind_addr;
    let app = routes::router(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
