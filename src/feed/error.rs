use thiserror::Error;
use url::Url;

use super::schema::SchemaError;
use crate::media::MediaError;
use crate::rss::RenderError;
use crate::transport::TransportError;

/// Everything that can go wrong turning a provider feed into RSS.
///
/// Callers distinguish "the feed does not exist" ([`FeedError::NotFound`])
/// from every other failure via [`FeedError::status_code`].
#[derive(Debug, Error)]
pub enum FeedError {
    /// The provider answered 404 for the feed document.
    #[error("Not found: {url}")]
    NotFound { url: Url },
    /// The provider answered with any other non-2xx status.
    #[error("Failed to fetch {url}: {status}{}", status_suffix(.status_text))]
    Upstream {
        url: Url,
        status: u16,
        status_text: String,
    },
    /// The request never produced an HTTP response.
    #[error("Failed to fetch {url}: {source}")]
    Transport {
        url: Url,
        #[source]
        source: TransportError,
    },
    #[error("Malformed response from {url}: {source}")]
    MalformedResponse {
        url: Url,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A path or image reference could not be resolved against the base URL.
    #[error("Invalid URL reference {reference}: {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },
    /// The reference resolved to a URL outside the provider base URL.
    #[error("Reference {reference} resolves outside {base}")]
    OutsideBase { reference: String, base: Url },
    /// A single card failed; the whole feed fails with it.
    #[error("Failed to convert card {title}: {source}")]
    Card {
        title: String,
        #[source]
        source: CardError,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl FeedError {
    /// HTTP status the request handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            FeedError::NotFound { .. } => 404,
            _ => 500,
        }
    }
}

fn status_suffix(status_text: &str) -> String {
    if status_text.is_empty() {
        String::new()
    } else {
        format!(" - {status_text}")
    }
}

/// Why a single card could not be converted.
#[derive(Debug, Error)]
pub enum CardError {
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("Invalid image URL {reference}: {source}")]
    InvalidImageUrl {
        reference: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid publish date: {0}")]
    InvalidPublishDate(String),
}
