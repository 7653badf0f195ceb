//! Nihongo Coach command-line client

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nihongo_coach::{
    api::{ApiClient, TracingNavigator},
    cli::{self, App, Cli},
    config::Config,
    session::{SessionHandle, SessionStore},
    storage::create_storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nihongo_coach=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::debug!(base_url = %config.api.base_url, "Configuration loaded");

    let storage = create_storage(&config.storage).await?;
    let handle = Arc::new(SessionHandle::new(storage.clone()));
    let api = ApiClient::new(&config.api, handle, Arc::new(TracingNavigator))?;
    let session = SessionStore::new(api.clone());

    // Restore a persisted session before running the command
    let state = session.init().await;
    tracing::debug!(authenticated = state.is_authenticated(), "Session restored");

    let app = App {
        config,
        storage,
        api,
        session,
    };
    cli::run(cli.command, &app).await
}
