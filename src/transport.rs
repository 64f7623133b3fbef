//! HTTP transport capability shared by every outbound call.
//!
//! The conversion pipeline never talks to `reqwest` directly: it receives an
//! `Arc<dyn Transport>` so tests (and alternative runtimes) can swap the
//! network layer out. [`ReqwestTransport`] is the production implementation.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised below the HTTP status layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub user_agent: Option<String>,
    /// When false, 3xx responses are returned to the caller as-is.
    pub follow_redirects: bool,
}

impl TransportRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            user_agent: None,
            follow_redirects: true,
        }
    }

    pub fn head(url: Url) -> Self {
        Self {
            method: Method::Head,
            url,
            user_agent: None,
            follow_redirects: true,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// The parts of an HTTP response the pipeline inspects.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    /// Final URL, after any redirects the transport followed.
    pub url: Url,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Issues HTTP requests on behalf of the pipeline.
///
/// Implementations must be safe for concurrent use: the convertor calls
/// `send` from several in-flight card resolutions at once.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`.
///
/// Holds two clients because redirect policy is fixed per client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    following: reqwest::Client,
    manual: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let following = reqwest::Client::builder().build()?;
        let manual = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            following,
            manual,
            timeout,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = if request.follow_redirects {
            &self.following
        } else {
            &self.manual
        };

        let mut builder = match request.method {
            Method::Get => client.get(request.url.clone()),
            Method::Head => client.head(request.url.clone()),
        };
        if let Some(agent) = &request.user_agent {
            builder = builder.header(reqwest::header::USER_AGENT, agent);
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(TransportError::Network)?;

        let status = response.status();
        let url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        tracing::trace!(url = %url, status = status.as_u16(), "Transport response received");

        let body = match request.method {
            Method::Head => Vec::new(),
            Method::Get => read_limited_bytes(response, MAX_BODY_SIZE).await?,
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            url,
            headers,
            body,
        })
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, TransportError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(TransportError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(TransportError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(TransportError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(TransportError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_body_and_lowercased_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .insert_header("X-Custom", "yes"),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT).unwrap();
        let resp = transport
            .send(TransportRequest::get(url(&server, "/feed.json")))
            .await
            .unwrap();

        assert!(resp.is_success());
        assert_eq!(resp.body, b"{}");
        assert_eq!(resp.header("X-Custom"), Some("yes"));
        assert_eq!(resp.header("x-custom"), Some("yes"));
    }

    #[tokio::test]
    async fn test_head_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/probe"))
            .and(header("User-Agent", "probe-agent"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT).unwrap();
        let resp = transport
            .send(TransportRequest::head(url(&server, "/probe")).with_user_agent("probe-agent"))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.body.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_followed_reports_final_url() {
        let server = MockServer::start().await;
        let target = url(&server, "/final.mp3");
        Mock::given(path("/start"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", target.as_str()))
            .mount(&server)
            .await;
        Mock::given(path("/final.mp3"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT).unwrap();
        let resp = transport
            .send(TransportRequest::head(url(&server, "/start")))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.url, target);
    }

    #[tokio::test]
    async fn test_redirect_not_followed_when_disabled() {
        let server = MockServer::start().await;
        Mock::given(path("/start"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "https://media.example/a.mp3"),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT).unwrap();
        let resp = transport
            .send(TransportRequest::head(url(&server, "/start")).without_redirects())
            .await
            .unwrap();
        assert_eq!(resp.status, 302);
        assert_eq!(resp.header("location"), Some("https://media.example/a.mp3"));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'a'; MAX_BODY_SIZE + 1]))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT).unwrap();
        let result = transport
            .send(TransportRequest::get(url(&server, "/big")))
            .await;
        assert!(matches!(result, Err(TransportError::ResponseTooLarge)));
    }
}
