//! Server start-up: storage directories, listener, graceful shutdown.

use crate::api::{router, AppState};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Run the service until Ctrl-C (or SIGTERM on Unix).
pub async fn serve(config: ServiceConfig) -> Result<(), ServiceError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServiceError::io(addr.as_str(), e))?;
    let state = AppState::initialize(config).await?;
    serve_on(listener, state, shutdown_signal()).await
}

/// Run the service on an already-bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener
        .local_addr()
        .map_err(|e| ServiceError::Unexpected(format!("listener has no local address: {e}")))?;

    info!(
        inputs = %state.storage.inputs_dir().display(),
        outputs = %state.storage.outputs_dir().display(),
        static_dir = %state.config.static_dir().display(),
        max_upload_bytes = state.config.max_upload_bytes,
        convert_timeout_ms = state.config.convert_timeout.as_millis() as u64,
        "jsf2pdf listening on http://{}",
        local
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServiceError::Unexpected(format!("server error: {e}")))?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn serves_health_over_tcp_and_shuts_down() {
        let root = TempDir::new().unwrap();
        let config = ServiceConfig::builder().root_dir(root.path()).build().unwrap();
        let state = AppState::initialize(config).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve_on(listener, state, async {
            let _ = stop_rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200"), "got: {raw}");
        assert!(raw.contains(r#"{"ok":true}"#), "got: {raw}");

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert!(root.path().join("inputs").is_dir());
        assert!(root.path().join("outputs").is_dir());
    }
}
