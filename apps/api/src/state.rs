use std::sync::Arc;

use sqlx::PgPool;

use crate::ats_client::BulkAcceptor;
use crate::config::Config;
use crate::ingest::session::SessionStore;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Transient upload sessions (Redis, TTL-bound).
    pub sessions: SessionStore,
    /// Original upload bytes (S3-compatible object storage).
    pub store: ObjectStore,
    /// Pluggable batch acceptor. Production wires `AtsClient`; tests swap a stub.
    pub acceptor: Arc<dyn BulkAcceptor>,
    pub config: Config,
}
