use axum::extract::State;
use axum::http::{header, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use super::genres::genres_page;
use super::index::index;
use super::response::{not_found, FeedFailure};
use crate::feed::{ConvertConfig, Convertor};
use crate::transport::Transport;

/// Shared by every request; conversions themselves keep no state here.
#[derive(Clone)]
pub struct AppState {
    pub convertor: Arc<Convertor>,
}

impl AppState {
    pub fn new(config: ConvertConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            convertor: Arc::new(Convertor::new(config, transport)),
        }
    }
}

/// Routes:
///
/// - `GET /` - localized index page
/// - `GET /generi` - genre listing
/// - `GET /<path>.xml` - RSS conversion of the provider's `<path>.json`
/// - anything else - `404 Not found.`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generi", get(genres_page))
        .fallback(feed_or_not_found)
        .with_state(state)
}

async fn feed_or_not_found(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return not_found();
    }
    let Some(json_path) = feed_json_path(uri.path()) else {
        tracing::debug!(path = %uri.path(), "No route");
        return not_found();
    };

    tracing::debug!(path = %json_path, "Converting feed");
    match state.convertor.convert_path(&json_path).await {
        Ok(xml) => (
            [
                (header::CONTENT_TYPE, "application/rss+xml"),
                (header::CONTENT_LANGUAGE, "it"),
            ],
            xml,
        )
            .into_response(),
        Err(e) => FeedFailure(e).into_response(),
    }
}

/// Maps a request path like `/programmi/foo.xml` to the provider document
/// `programmi/foo.json`, relative to the provider base URL.
///
/// Stems that would parse as a scheme or authority are refused.
pub fn feed_json_path(path: &str) -> Option<String> {
    let stem = path.trim_start_matches('/').strip_suffix(".xml")?;
    if stem.is_empty() || stem.ends_with('/') || stem.contains([':', '\\']) {
        return None;
    }
    Some(format!("{stem}.json"))
}
