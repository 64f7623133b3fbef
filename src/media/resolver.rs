use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use super::relinker::{RelinkerUrl, RelinkerUrlError};
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// The relinker answers differently (or not at all) without a browser agent.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

pub const EXPECTED_CONTENT_TYPE: &str = "audio/mpeg";

/// Errors that can occur while resolving an episode's media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The audio URL is not a relinker URL; no request was made.
    #[error("Invalid URL ({url}): {reason}")]
    InvalidMediaUrl {
        url: String,
        #[source]
        reason: RelinkerUrlError,
    },
    #[error("Invalid content type: {}, wanted audio/mpeg", .found.as_deref().unwrap_or("<missing>"))]
    InvalidContentType { found: Option<String> },
    #[error("Invalid content length: {}", .found.as_deref().unwrap_or("<missing>"))]
    InvalidContentLength { found: Option<String> },
    #[error("Missing location header")]
    MissingLocationHeader,
    #[error("Invalid location header {location}: {source}")]
    InvalidLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// How the final media location is obtained from the relinker.
///
/// The provider has been observed answering both ways; which one it uses
/// today must be confirmed against the live service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// Let the transport follow the redirect; the final response carries
    /// the media headers and its URL is the media URL.
    #[default]
    FollowRedirects,
    /// Probe without following redirects and read the `302` itself.
    ManualRedirect,
}

/// Resolved location and size of an episode's audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub url: Url,
    pub size: u64,
    pub content_type: String,
}

/// Probes relinker URLs to find the playable media behind them.
#[derive(Clone)]
pub struct MediaResolver {
    transport: Arc<dyn Transport>,
    strategy: ResolveStrategy,
}

impl MediaResolver {
    pub fn new(transport: Arc<dyn Transport>, strategy: ResolveStrategy) -> Self {
        Self {
            transport,
            strategy,
        }
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }

    /// Resolves `audio_url` with a single `HEAD` probe.
    ///
    /// # Errors
    ///
    /// - [`MediaError::InvalidMediaUrl`] if the URL is not a relinker URL
    ///   (checked before any network access)
    /// - [`MediaError::UnexpectedStatus`] if the probe's status does not fit
    ///   the configured [`ResolveStrategy`]
    /// - [`MediaError::InvalidContentType`] / [`MediaError::InvalidContentLength`]
    ///   for unusable media headers
    /// - [`MediaError::MissingLocationHeader`] / [`MediaError::InvalidLocation`]
    ///   in manual-redirect mode
    /// - [`MediaError::Transport`] if the request itself failed
    pub async fn resolve(&self, audio_url: &str) -> Result<MediaInfo, MediaError> {
        let relinker = RelinkerUrl::parse(audio_url).map_err(|reason| MediaError::InvalidMediaUrl {
            url: audio_url.to_string(),
            reason,
        })?;

        let mut request =
            TransportRequest::head(relinker.as_url().clone()).with_user_agent(CHROME_USER_AGENT);
        if self.strategy == ResolveStrategy::ManualRedirect {
            request = request.without_redirects();
        }

        tracing::debug!(url = %relinker, strategy = ?self.strategy, "Probing relinker");
        let response = self.transport.send(request).await?;

        let info = match self.strategy {
            ResolveStrategy::FollowRedirects => from_final_response(&response)?,
            ResolveStrategy::ManualRedirect => from_redirect_response(&response)?,
        };

        tracing::debug!(
            url = %relinker,
            media = %info.url,
            size = info.size,
            "Resolved relinker"
        );
        Ok(info)
    }
}

fn from_final_response(response: &TransportResponse) -> Result<MediaInfo, MediaError> {
    if !response.is_success() {
        return Err(MediaError::UnexpectedStatus(response.status));
    }

    let content_type = response.header("content-type");
    if content_type != Some(EXPECTED_CONTENT_TYPE) {
        return Err(MediaError::InvalidContentType {
            found: content_type.map(str::to_string),
        });
    }

    Ok(MediaInfo {
        url: response.url.clone(),
        size: content_length(response)?,
        content_type: EXPECTED_CONTENT_TYPE.to_string(),
    })
}

fn from_redirect_response(response: &TransportResponse) -> Result<MediaInfo, MediaError> {
    if response.status != 302 {
        return Err(MediaError::UnexpectedStatus(response.status));
    }

    let location = response
        .header("location")
        .ok_or(MediaError::MissingLocationHeader)?;
    let url = Url::parse(location).map_err(|source| MediaError::InvalidLocation {
        location: location.to_string(),
        source,
    })?;

    let content_type = response
        .header("content-type")
        .ok_or(MediaError::InvalidContentType { found: None })?;

    Ok(MediaInfo {
        url,
        size: content_length(response)?,
        content_type: content_type.to_string(),
    })
}

fn content_length(response: &TransportResponse) -> Result<u64, MediaError> {
    let raw = response.header("content-length");
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| MediaError::InvalidContentLength {
            found: raw.map(str::to_string),
        })
}
