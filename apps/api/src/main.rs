mod config;
mod db;
mod errors;
mod export;
mod layout;
mod models;
mod profile;
mod render;
mod resumes;
mod routes;
mod state;
mod viewport;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::export::capture::DisplayListRasterizer;
use crate::export::stabilize::BuiltinFonts;
use crate::export::storage::S3Archive;
use crate::export::ExportPipeline;
use crate::profile::PgProfileRepository;
use crate::resumes::PgResumeRepository;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartCV API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let settings = config.export_settings();
    info!(
        "Export settings: {:?} page, {}x oversampling, {} frame budget",
        settings.page_size, settings.scale, settings.frame_budget
    );
    let exports = Arc::new(ExportPipeline::new(
        Arc::new(DisplayListRasterizer),
        Arc::new(BuiltinFonts::default()),
        settings,
    ));

    // Build app state
    let state = AppState {
        resumes: Arc::new(PgResumeRepository::new(db.clone())),
        profiles: Arc::new(PgProfileRepository::new(db)),
        archive: Arc::new(S3Archive::new(s3, config.s3_bucket.clone())),
        exports,
        page_size: config.page_size,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "smartcv-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
