use anyhow::Context;
use clap::Parser;
use podcast_server::cli::Cli;
use podcast_server::{AppState, create_router};
use podcast_studio::{MiniMaxProvider, Settings, Studio};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    let mut settings = Settings::load_or_default(cli.config.as_deref())
        .await
        .context("failed to load configuration")?;
    cli.apply_overrides(&mut settings);
    settings.validate().context("invalid configuration")?;

    let provider = MiniMaxProvider::new(settings.provider.clone())
        .context("failed to build MiniMax client")?;
    let fallback_key = std::env::var("MINIMAX_API_KEY").ok();
    if fallback_key.is_none() {
        warn!("MINIMAX_API_KEY not set; clone-voice requests must carry an api_key");
    }

    let addr = settings.server.bind_addr()?;
    let studio = Studio::new(settings, provider, fallback_key)?;
    studio.storage().ensure_dirs().await?;
    let state = AppState::new(studio)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "podcast server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
