//! HTTP fetcher implementation
//!
//! This module handles all plain (non-rendered) HTTP requests, including:
//! - Building HTTP clients with browser-like headers and redirect budgets
//! - HEAD probes used by the origin resolver
//! - GET requests for search result pages, landing pages and fallback checks
//! - Status-only GET probes for the internal link audit
//! - Error classification (timeout vs. connection vs. protocol)

use crate::config::{Config, UserAgentConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of a single plain HTTP request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Classifies a reqwest error for the given URL
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }

    /// Returns true for failures where no HTTP response was received
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connect { .. })
    }

    /// The upstream status code, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A page fetched with a plain GET
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code (always below 500)
    pub status_code: u16,

    /// Response body
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent identity
/// * `timeout` - Default whole-request timeout
/// * `max_redirects` - Redirect hops followed before giving up
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
    max_redirects: usize,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// The HTTP clients used by one crawl, one per redirect budget
#[derive(Debug, Clone)]
pub struct HttpClients {
    /// Search surfaces, landing page and fallback verification
    pub general: Client,

    /// Origin resolver HEAD probes
    pub resolver: Client,

    /// Internal link probes
    pub audit: Client,
}

impl HttpClients {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            general: build_http_client(
                &config.user_agent,
                config.http.request_timeout(),
                config.http.max_redirects,
            )?,
            resolver: build_http_client(
                &config.user_agent,
                config.resolver.probe_timeout(),
                config.resolver.max_redirects,
            )?,
            audit: build_http_client(
                &config.user_agent,
                config.audit.probe_timeout(),
                config.audit.max_redirects,
            )?,
        })
    }
}

/// Fetches a page with a GET request
///
/// Responses below 500 are returned as pages so callers can decide what a
/// 4xx means for them. 5xx responses and transport failures are errors, which
/// makes them eligible for retry.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    timeout: Option<Duration>,
) -> Result<FetchedPage, FetchError> {
    let mut request = client.get(url);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if status.is_server_error() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        body,
    })
}

/// Sends a HEAD request and returns the final URL and status
///
/// Redirects are followed up to the client's budget, so the returned URL is
/// the redirect target when the server reported one.
pub async fn head_probe(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<(Url, u16), FetchError> {
    let response = client
        .head(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    Ok((response.url().clone(), response.status().as_u16()))
}

/// Sends a GET request and returns only the status code
pub async fn probe_status(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<u16, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    Ok(response.status().as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> Client {
        build_http_client(&UserAgentConfig::default(), Duration::from_secs(5), 3).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let config = Config::default();
        assert!(HttpClients::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_page_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("cache-control", "no-cache"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let page = fetch_page(&test_client(), &server.uri(), None).await.unwrap();
        assert_eq!(page.status_code, 200);
        assert_eq!(page.body, "<html>hi</html>");
    }

    #[tokio::test]
    async fn test_fetch_page_client_error_is_a_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let page = fetch_page(&test_client(), &server.uri(), None).await.unwrap();
        assert_eq!(page.status_code, 404);
    }

    #[tokio::test]
    async fn test_fetch_page_server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetch_page(&test_client(), &server.uri(), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_connection_level());
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_connection_level() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = fetch_page(&test_client(), &server.uri(), Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
        assert!(err.is_connection_level());
    }

    #[tokio::test]
    async fn test_head_probe_follows_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/home"),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/home"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (final_url, status) =
            head_probe(&test_client(), &server.uri(), Duration::from_secs(2))
                .await
                .unwrap();
        assert_eq!(status, 200);
        assert_eq!(final_url.path(), "/home");
    }

    #[tokio::test]
    async fn test_probe_status_reports_any_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let status = probe_status(&test_client(), &server.uri(), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(status, 500);
    }
}
