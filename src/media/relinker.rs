//! Shape check for the provider's relinker (media indirection) URLs.
//!
//! Every episode's audio lives behind
//! `http(s)://<host>/relinker/relinkerServlet.htm?cont=<id>`. Anything else
//! means the provider changed its scheme, and we would rather fail loudly
//! than probe an arbitrary URL.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const RELINKER_PATH: &str = "/relinker/relinkerServlet.htm";
const CONTENT_PARAM: &str = "cont=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelinkerUrlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid protocol: {0}")]
    UnsupportedScheme(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid search: {0}")]
    InvalidQuery(String),
}

/// A URL known to point at the relinker endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelinkerUrl(Url);

impl RelinkerUrl {
    pub fn parse(input: &str) -> Result<Self, RelinkerUrlError> {
        let url = Url::parse(input)?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(RelinkerUrlError::UnsupportedScheme(scheme.to_owned())),
        }

        if url.path() != RELINKER_PATH {
            return Err(RelinkerUrlError::InvalidPath(url.path().to_owned()));
        }

        let query = url.query().unwrap_or_default();
        let valid_id = query
            .strip_prefix(CONTENT_PARAM)
            .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric()));
        if !valid_id {
            return Err(RelinkerUrlError::InvalidQuery(format!("?{query}")));
        }

        Ok(Self(url))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The `cont` identifier of the media item.
    pub fn content_id(&self) -> &str {
        self.0
            .query()
            .and_then(|q| q.strip_prefix(CONTENT_PARAM))
            .unwrap_or_default()
    }
}

impl FromStr for RelinkerUrl {
    type Err = RelinkerUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RelinkerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
