//! Static assets and the landing-page fallback.
//!
//! Unmatched GET/HEAD requests are served from the static directory. When no
//! file matches, the landing page (`index.html`) is returned instead; when
//! that is missing too, or the method is not a read, the response is the
//! usual JSON 404.

use crate::error::ServiceError;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, MethodRouter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::debug;

/// Landing page served for unknown read routes.
pub const LANDING_PAGE: &str = "index.html";

/// `ServeDir` over `static_dir` with the landing-page fallback attached.
pub fn service(static_dir: &Path) -> ServeDir<MethodRouter> {
    let landing: MethodRouter = get(landing_page)
        .fallback(not_found)
        .with_state(Arc::new(static_dir.join(LANDING_PAGE)));

    ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(landing)
}

async fn landing_page(State(index): State<Arc<PathBuf>>) -> Result<Html<String>, ServiceError> {
    match tokio::fs::read_to_string(index.as_path()).await {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            debug!("No landing page at {}: {}", index.display(), e);
            Err(ServiceError::NotFound("Not found".into()))
        }
    }
}

async fn not_found() -> ServiceError {
    ServiceError::NotFound("Not found".into())
}
