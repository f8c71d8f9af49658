use tracing::{info, warn};

/// Resolves on Ctrl+C so the server can drain in-flight requests.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}", e);
            // Without a signal handler the server runs until killed
            std::future::pending::<()>().await;
        }
    }
}
