use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use solscan::api::create_router;
use solscan::logging::init_logging;
use solscan::{AppState, ServiceConfig};

#[derive(Parser)]
#[command(name = "solscan-server")]
#[command(about = "Smart contract static analysis service", long_about = None)]
#[command(version)]
struct Args {
    /// TOML configuration file (defaults to $SOLSCAN_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::load(args.config.as_deref())?;

    let _log_guards = init_logging(&config.logging)?;

    info!("🚀 Starting Solscan v{}", env!("CARGO_PKG_VERSION"));
    match &config.source {
        Some(path) => info!("📄 Loaded configuration from {}", path.display()),
        None => info!("📄 No configuration file given, using defaults"),
    }
    info!("📋 Server configuration:");
    info!("  Workspace root: {}", config.workspace.root.display());
    info!("  Engine: {:?} (timeout {}s)", config.engine.command, config.engine.timeout_secs);
    info!("  Toolchain isolation: {:?}", config.toolchain.isolation);
    info!("  Max concurrent analyses: {}", config.limits.max_concurrent_analyses);

    let state = AppState::new(config).context("Failed to build analysis pipeline")?;
    debug!("✓ Analysis pipeline initialized");

    let server = state.config.server.clone();

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = server
        .bind()
        .await
        .with_context(|| format!("Failed to bind {}:{}", server.host, server.port))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;
    info!("🎯 Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🏁 Solscan server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown requested");
}
