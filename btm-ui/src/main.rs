//! btm-ui - Brazil Tech Mapper web UI
//!
//! Maps a CNPJ company list into tech subsegments, flags CVM-listed
//! companies and serves a filterable table with CSV export.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btm_common::config::{load_toml_config, Overrides, RegistryLocation, Settings};
use btm_common::registry::{FileRegistrySource, HttpRegistrySource, RegistryCache, RegistrySource};
use btm_ui::api::BuildInfo;
use btm_ui::{bind_listener, build_router, AppState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "btm-ui")]
#[command(about = "Brazil Tech Mapper: classify and filter CNPJ company lists")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "BTM_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "BTM_BIND")]
    bind: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CVM registry URL
    #[arg(long, env = "BTM_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Local copy of the CVM registry CSV (used instead of the URL)
    #[arg(long, env = "BTM_REGISTRY_FILE")]
    registry_file: Option<PathBuf>,

    /// Registry download timeout in seconds
    #[arg(long, env = "BTM_REGISTRY_TIMEOUT_SECS")]
    registry_timeout_secs: Option<u64>,

    /// Registry cache window in seconds
    #[arg(long, env = "BTM_REGISTRY_TTL_SECS")]
    registry_ttl_secs: Option<u64>,

    /// Never look up listed companies
    #[arg(long, env = "BTM_NO_REGISTRY")]
    no_registry: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "BTM_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            bind: self.bind.clone(),
            registry_url: self.registry_url.clone(),
            registry_file: self.registry_file.clone(),
            registry_timeout_secs: self.registry_timeout_secs,
            registry_ttl_secs: self.registry_ttl_secs,
            no_registry: self.no_registry,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_toml_config(args.config.as_deref())?;
    let settings = Settings::resolve(&args.overrides(), &loaded.config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!("Starting Brazil Tech Mapper (btm-ui) {}", BuildInfo::CURRENT.summary());
    loaded.origin.log();

    let source: Arc<dyn RegistrySource> = match &settings.registry_location {
        RegistryLocation::Url(url) => Arc::new(
            HttpRegistrySource::new(url.clone(), settings.registry_timeout)
                .context("Failed to build registry HTTP client")?,
        ),
        RegistryLocation::File(path) => Arc::new(FileRegistrySource::new(path.clone())),
    };
    if settings.registry_enabled {
        info!(
            "Listed-company registry: {} (cache window {}s)",
            source.describe(),
            settings.registry_ttl.as_secs()
        );
    } else {
        info!("Listed-company registry disabled");
    }

    let registry = Arc::new(RegistryCache::new(source, settings.registry_ttl));
    let state = AppState::new(registry, settings.registry_enabled);
    let app = build_router(state);

    let addr = settings.listen_addr();
    let (listener, local) = bind_listener(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("btm-ui listening on http://{}", local);
    info!("Health check: http://{}/health", local);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
