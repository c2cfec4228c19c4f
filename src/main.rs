//! Skin Analysis Service
//!
//! Forwards face photos to a hosted skin-analysis API and turns the
//! response into annotated images, metric listings and before/after
//! comparisons. Serves a REST API (Axum) or renders a one-off report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use skinlens::api::rest::{create_rest_router, AppState};
use skinlens::config::Config;
use skinlens::service::AnalysisService;
use skinlens::storage::FileStorage;
use skinlens::upstream::AilabClient;

#[derive(Parser)]
#[command(name = "skinlens", version, about = "Skin analysis visualization service")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Analyze one image and write the side-by-side report PNG
    Report {
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(Config::default_path());
    let config = Config::load(config_path).unwrap_or_else(|e| {
        info!("Using default config ({})", e);
        Config::default()
    });

    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        warn!(
            "{} not set; analyses will fail until it is configured",
            config.upstream.api_key_env
        );
    }
    let upstream = Arc::new(AilabClient::new(&config.upstream, api_key)?);
    let service = Arc::new(AnalysisService::new(upstream, &config));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, service).await,
        Command::Report { image, out } => report(&service, &image, &out).await,
    }
}

async fn serve(config: Config, service: Arc<AnalysisService<AilabClient>>) -> Result<()> {
    info!("Starting Skin Analysis Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded:");
    info!("  Port: {}", config.server.port);
    info!("  Upstream: {}", config.upstream.url);
    info!("  Uploads: {}", config.storage.uploads_dir.display());

    let storage = Arc::new(FileStorage::new(&config.storage.uploads_dir).await?);

    let app_state = Arc::new(AppState { service, storage });
    let router = create_rest_router(app_state, &config.server);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("REST API listening on http://{}", addr);
    info!("Health: http://localhost:{}/health", config.server.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received, cleaning up...");
        })
        .await?;

    info!("Goodbye!");
    Ok(())
}

async fn report(
    service: &AnalysisService<AilabClient>,
    image: &std::path::Path,
    out: &std::path::Path,
) -> Result<()> {
    let data = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    info!("Analyzing {} ({} bytes)", image.display(), data.len());

    let png = service.render_report(&data).await?;
    tokio::fs::write(out, &png)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;

    info!("Report saved to {}", out.display());
    Ok(())
}
