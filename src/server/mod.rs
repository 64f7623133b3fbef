//! HTTP surface: index page, genre listing, and feed conversion.
//!
//! Handlers translate pipeline errors into responses and never fail the
//! server itself: feed errors become XML error envelopes, everything else
//! plain text.

mod genres;
mod index;
mod response;
mod router;

pub use genres::{genres_html, render_genres, validate_genres, Genre, GenresError, GENRES_PATH};
pub use response::{xml_error_body, FeedFailure, NOT_FOUND_TEXT};
pub use router::{feed_json_path, router, AppState};

use tokio::net::TcpListener;

/// Serves `state` on `listener` until SIGINT or SIGTERM.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "Listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down gracefully"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}
