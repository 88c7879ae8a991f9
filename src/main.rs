use aces::api::{create_router, ApiState};
use aces::cloud_storage::S3CloudStorage;
use aces::config::Config;
use aces::discogs::{DiscogsClient, RateGate};
use aces::image_proxy::{CoverImageProxy, ImageProxy};
use std::sync::Arc;
use tracing::{error, info, warn};

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn create_image_proxy(config: &Config) -> Option<Arc<dyn ImageProxy>> {
    let Some(s3_config) = config.storage.clone() else {
        warn!("Cover storage not configured, image proxy disabled");
        return None;
    };

    let storage = S3CloudStorage::new(s3_config).await.unwrap_or_else(|e| {
        error!("Failed to initialize cover storage: {e}");
        std::process::exit(1);
    });

    let proxy = CoverImageProxy::new(Arc::new(storage), config.discogs_timeout)
        .unwrap_or_else(|e| {
            error!("Failed to build image proxy: {e}");
            std::process::exit(1);
        });

    Some(Arc::new(proxy))
}

#[tokio::main]
async fn main() {
    configure_logging();

    info!("aces starting");

    let config = Config::load().unwrap_or_else(|e| {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    });

    // One gate for the whole process
    let rate_gate = Arc::new(RateGate::default());
    let client = DiscogsClient::new(
        config.discogs_token.as_deref(),
        rate_gate,
        config.discogs_timeout,
    )
    .unwrap_or_else(|e| {
        error!("{e}");
        std::process::exit(1);
    });

    if config.owner_token.is_none() {
        warn!("ACES_OWNER_TOKEN is not set, image proxy requests will be rejected");
    }

    let state = ApiState {
        catalog: Arc::new(client),
        image_proxy: create_image_proxy(&config).await,
        owner_token: config.owner_token.clone(),
    };
    let app = create_router(state);
    let addr = config.bind_addr;

    info!("Binding to {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {addr}: {e}");
            std::process::exit(1);
        });

    info!("aces listening on http://{addr}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
