use serde_json::Value;
use std::sync::Arc;
use url::Url;

use super::error::FeedError;
use crate::transport::{Transport, TransportRequest};
use crate::util::resolve_against;

/// Retrieves provider JSON documents relative to the provider base URL.
///
/// A single attempt is made per call. Non-2xx answers are translated into
/// the feed error taxonomy: 404 becomes [`FeedError::NotFound`], anything
/// else [`FeedError::Upstream`].
#[derive(Clone)]
pub struct FeedFetcher {
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl FeedFetcher {
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches and parses the JSON document at `relative_path`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidReference`] - `relative_path` cannot be joined to the base URL
    /// - [`FeedError::OutsideBase`] - the joined URL leaves the base origin or path
    /// - [`FeedError::Transport`] - no HTTP response was obtained
    /// - [`FeedError::NotFound`] - the provider answered 404
    /// - [`FeedError::Upstream`] - the provider answered any other non-2xx status
    /// - [`FeedError::MalformedResponse`] - the body is not valid JSON
    pub async fn fetch(&self, relative_path: &str) -> Result<Value, FeedError> {
        let url = resolve_against(&self.base_url, relative_path).map_err(|source| {
            FeedError::InvalidReference {
                reference: relative_path.to_string(),
                source,
            }
        })?;

        // Absolute and scheme-relative references would otherwise pick the host
        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path())
        {
            tracing::warn!(reference = %relative_path, url = %url, "Refusing reference outside provider");
            return Err(FeedError::OutsideBase {
                reference: relative_path.to_string(),
                base: self.base_url.clone(),
            });
        }

        tracing::debug!(url = %url, "Fetching provider document");

        let response = self
            .transport
            .send(TransportRequest::get(url.clone()))
            .await
            .map_err(|source| FeedError::Transport {
                url: url.clone(),
                source,
            })?;

        if response.status == 404 {
            return Err(FeedError::NotFound { url });
        }
        if !response.is_success() {
            return Err(FeedError::Upstream {
                url,
                status: response.status,
                status_text: response.status_text,
            });
        }

        serde_json::from_slice(&response.body)
            .map_err(|source| FeedError::MalformedResponse { url, source })
    }
}
