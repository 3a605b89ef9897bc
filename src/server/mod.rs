use crate::config::Config;
use crate::storage::{ImageStorage, LocalImageStorage};
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_images;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub storage: Arc<dyn ImageStorage>,
}

impl AppContext {
    /// Build the context with local storage configured from `config`.
    pub fn from_config(config: Config) -> Self {
        let storage = LocalImageStorage::from_config(&config.storage, &config.compression);
        Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let mount = ctx.config.storage.url_layout().mount_path();
    let images = ctx.storage.serve();

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes_images::image_routes())
        .with_state(ctx);

    // Stored images are served under /<subdir>/<static_prefix>
    let app = if mount == "/" {
        app.fallback_service(images)
    } else {
        app.nest_service(&mount, images)
    };

    app.layer(cors).layer(TraceLayer::new_for_http())
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    tokio::fs::create_dir_all(&config.storage.root)
        .await
        .with_context(|| format!("Failed to create storage root: {:?}", config.storage.root))?;

    let ctx = AppContext::from_config(config);

    tracing::info!(
        root = %ctx.config.storage.root.display(),
        mount = %ctx.config.storage.url_layout().mount_path(),
        "Image storage ready"
    );

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
