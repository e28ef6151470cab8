// Main entry point for the signage player

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use player_core::domains::campaigns::{
    from_value, load_from_file, summary, AdminClient, Campaign, ConfigLoadError,
};
use player_core::domains::playback::Scheduler;
use player_core::kernel::{LogRenderer, Player, RenderFeed};
use player_core::server::{build_app, AppState};
use player_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::load();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.mode.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// 2 for an unreadable config source, 1 for a config that is wrong or any
/// other failure.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ConfigLoadError>()
        .map(ConfigLoadError::exit_code)
        .unwrap_or(1)
}

async fn run(config: Config) -> Result<()> {
    tracing::info!(mode = config.mode.as_str(), "Starting IDS player");

    let campaigns = load_campaigns(&config).await?;
    print!("{}", summary(&campaigns, config.mode.as_str()));

    if !config.serve {
        return Ok(());
    }

    serve(&config, campaigns).await
}

async fn load_campaigns(config: &Config) -> Result<Vec<Arc<Campaign>>> {
    if let Some(admin_url) = &config.admin_url {
        let client = AdminClient::new(admin_url).map_err(ConfigLoadError::from)?;
        let fetched = client
            .fetch_config(config.config_id.as_deref())
            .await
            .map_err(ConfigLoadError::from)?;
        tracing::info!(source = %fetched.source_label, "Config fetched from Admin");

        return from_value(fetched.config, &fetched.source_label)
            .context("Failed to load campaigns from Admin");
    }

    let path = config
        .config
        .as_deref()
        .context("No config source given (use --config or --admin-url)")?;
    let campaigns = load_from_file(path)
        .with_context(|| format!("Failed to load campaigns from {}", path.display()))?;
    tracing::info!(path = %path.display(), count = campaigns.len(), "Config loaded");

    Ok(campaigns)
}

async fn serve(config: &Config, campaigns: Vec<Arc<Campaign>>) -> Result<()> {
    let feed = RenderFeed::new();
    let (scheduler, timer_rx) = Scheduler::builder(campaigns, LogRenderer)
        .with_observer(feed.clone())
        .with_inactivity(config.inactivity())
        .build();
    let (player, player_task) = Player::spawn(scheduler, timer_rx);

    let app = build_app(AppState { player, feed });

    let addr = config.bind_addr();
    tracing::info!("Event ingress listening on http://{}", addr);
    tracing::info!("POST http://{}/events", addr);
    tracing::info!("GET  http://{}/state", addr);
    tracing::info!("GET  http://{}/render-stream", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    player_task.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
