mod ats_client;
mod config;
mod dashboard;
mod db;
mod errors;
mod ingest;
mod middleware;
mod models;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::ats_client::{AtsClient, BulkAcceptor};
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::ingest::session::SessionStore;
use crate::middleware::{build_rate_limiter, rate_limit};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hirelane API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize Redis-backed upload sessions
    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let redis = redis::aio::ConnectionManager::new(redis_client).await?;
    let sessions = SessionStore::new(redis, config.session_ttl_secs);
    info!("Redis session store initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let store = ObjectStore::new(s3, config.s3_bucket.clone());
    info!("S3 client initialized");

    // Initialize the ATS submission client
    let acceptor: Arc<dyn BulkAcceptor> = Arc::new(AtsClient::new(
        config.ats_base_url.clone(),
        config.ats_api_key.clone(),
    ));
    info!("ATS client initialized (endpoint: {})", config.ats_base_url);

    // Per-IP rate limiting
    let limiter = build_rate_limiter(config.rate_limit_per_minute);

    // Build app state
    let state = AppState {
        db,
        sessions,
        store,
        acceptor,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hirelane-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
