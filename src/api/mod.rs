//! HTTP surface: JSON API, artifact download, static assets.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET  | `/api/health` | [`handlers::health`] |
//! | GET  | `/api/files` | [`handlers::list_files`] |
//! | GET  | `/api/download/{name}` | [`handlers::download`] |
//! | POST | `/api/upload` | [`handlers::upload`] |
//! | *    | anything else | [`static_files`] |
//!
//! The download route captures the rest of the path (`{*name}`), so a
//! multi-segment request such as `/api/download/../../etc/passwd` reaches the
//! handler and is rejected there instead of falling through to the landing
//! page.

pub mod handlers;
pub mod static_files;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::pipeline::invoke::ConverterInvoker;
use crate::pipeline::storage::StorageLayout;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Allowance on top of the file-size cap for multipart boundaries and part
/// headers, so the transport limit never fires before the per-file check.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared, read-only request state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub storage: StorageLayout,
    pub invoker: ConverterInvoker,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let storage = StorageLayout::from_config(&config);
        let invoker = ConverterInvoker::new(config.converter.clone(), config.convert_timeout);
        Self {
            config: Arc::new(config),
            storage,
            invoker,
        }
    }

    /// Build the state and create the storage directories.
    pub async fn initialize(config: ServiceConfig) -> Result<Self, ServiceError> {
        let state = Self::new(config);
        state.storage.ensure().await?;
        Ok(state)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let static_files = static_files::service(&state.config.static_dir());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/files", get(handlers::list_files))
        .route("/api/download/{*name}", get(handlers::download))
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .fallback_service(static_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
