//! Rendering sessions for ownership verification
//!
//! A [`Renderer`] hands out isolated [`RenderSession`]s. Each verification
//! attempt opens exactly one session, navigates it at most twice and closes it
//! before deciding. [`BrowserlessRenderer`] drives a Browserless instance
//! through its `/content` endpoint.

use crate::config::VerifierConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Sub-resources the browser is told not to load
pub const BLOCKED_RESOURCE_TYPES: [&str; 4] = ["image", "stylesheet", "font", "media"];

/// Header Browserless uses to report the target page's status code
const RESPONSE_CODE_HEADER: &str = "x-response-code";

/// Extra time granted to the Browserless call beyond the navigation budget
const API_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation timed out for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Navigation failed for {url}: {message}")]
    NavigationFailed { url: String, message: String },

    #[error("Renderer API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The rendering service itself failed or could not be reached
    #[error("Rendering session failed: {0}")]
    Session(String),
}

impl RenderError {
    /// Returns true for failures that justify the plain-HTTP fallback
    ///
    /// Timeouts, DNS/connection errors and failed navigations qualify. API
    /// errors and session failures do not.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::NavigationFailed { .. }
        )
    }
}

/// Per-navigation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Budget for reaching DOM-ready
    pub timeout: Duration,

    /// Wait after DOM-ready so deferred scripts can inject the tag
    pub settle_delay: Duration,
}

impl NavigateOptions {
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self {
            timeout: config.render_timeout(),
            settle_delay: config.settle_delay(),
        }
    }
}

/// Markup and status of a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub status_code: u16,
    pub markup: String,
}

impl RenderedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Source of isolated rendering sessions
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a session owned by a single verification attempt
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// An isolated browsing session
#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to `url`, waits for DOM-ready plus the settle delay and
    /// returns the rendered markup
    async fn navigate(
        &mut self,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<RenderedPage, RenderError>;

    /// Releases the session
    async fn close(self: Box<Self>);
}

/// Renderer backed by a Browserless `/content` endpoint
#[derive(Debug, Clone)]
pub struct BrowserlessRenderer {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessRenderer {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    pub fn from_config(config: &VerifierConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.browserless_url, config.browserless_token.as_deref())
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl Renderer for BrowserlessRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        // Every /content call runs in a fresh browser context, so opening a
        // session needs no round trip.
        Ok(Box::new(BrowserlessSession {
            client: self.client.clone(),
            endpoint: self.endpoint(),
            navigations: 0,
        }))
    }
}

struct BrowserlessSession {
    client: Client,
    endpoint: String,
    navigations: usize,
}

#[async_trait]
impl RenderSession for BrowserlessSession {
    async fn navigate(
        &mut self,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<RenderedPage, RenderError> {
        self.navigations += 1;

        let body = json!({
            "url": url,
            "rejectResourceTypes": BLOCKED_RESOURCE_TYPES,
            "gotoOptions": {
                "waitUntil": "domcontentloaded",
                "timeout": options.timeout.as_millis() as u64,
            },
            "waitForTimeout": options.settle_delay.as_millis() as u64,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .timeout(options.timeout + options.settle_delay + API_TIMEOUT_MARGIN)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_api_error(url, status.as_u16(), message));
        }

        let status_code = response
            .headers()
            .get(RESPONSE_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(200);

        let markup = response
            .text()
            .await
            .map_err(|e| transport_error(&self.endpoint, e))?;

        Ok(RenderedPage {
            status_code,
            markup,
        })
    }

    async fn close(self: Box<Self>) {
        tracing::debug!("Closing render session after {} navigation(s)", self.navigations);
    }
}

/// Maps a failed call to the Browserless endpoint itself
///
/// The target site was never reached, so these are session failures and
/// never qualify for the plain-HTTP fallback.
fn transport_error(endpoint: &str, err: reqwest::Error) -> RenderError {
    let endpoint = endpoint.split('?').next().unwrap_or(endpoint);
    if err.is_timeout() {
        RenderError::Session(format!("renderer at {} did not answer in time", endpoint))
    } else {
        RenderError::Session(format!(
            "renderer at {} unreachable: {}",
            endpoint,
            err.without_url()
        ))
    }
}

/// Maps a Browserless error response onto the render error taxonomy
///
/// Browserless relays the browser's navigation error text, so Chromium
/// `net::` codes and timeout messages are recognized by content.
fn classify_api_error(url: &str, status: u16, message: String) -> RenderError {
    let lowered = message.to_lowercase();

    if status == 408 || lowered.contains("timeout") || lowered.contains("timed out") {
        RenderError::Timeout {
            url: url.to_string(),
        }
    } else if lowered.contains("net::err_") {
        RenderError::Connection {
            url: url.to_string(),
            message,
        }
    } else if lowered.contains("navigation failed") {
        RenderError::NavigationFailed {
            url: url.to_string(),
            message,
        }
    } else {
        RenderError::Api { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> NavigateOptions {
        NavigateOptions {
            timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_connection_level_classification() {
        let url = "https://example.com";
        assert!(classify_api_error(url, 500, "net::ERR_NAME_NOT_RESOLVED".into())
            .is_connection_level());
        assert!(classify_api_error(url, 500, "Navigation timeout of 45000 ms exceeded".into())
            .is_connection_level());
        assert!(classify_api_error(url, 400, "Navigation failed because browser has disconnected".into())
            .is_connection_level());
        assert!(!classify_api_error(url, 401, "Unauthorized".into()).is_connection_level());
        assert!(!RenderError::Session("no browser".into()).is_connection_level());
    }

    #[test]
    fn test_rendered_page_success_range() {
        let page = |status_code| RenderedPage {
            status_code,
            markup: String::new(),
        };
        assert!(page(200).is_success());
        assert!(page(204).is_success());
        assert!(!page(301).is_success());
        assert!(!page(404).is_success());
    }

    #[tokio::test]
    async fn test_browserless_navigate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .and(query_param("token", "secret"))
            .and(body_partial_json(serde_json::json!({
                "url": "https://example.com/?t=1",
                "rejectResourceTypes": ["image", "stylesheet", "font", "media"],
                "gotoOptions": { "waitUntil": "domcontentloaded" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-response-code", "200")
                    .set_body_string("<html><head></head></html>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let renderer = BrowserlessRenderer::new(&server.uri(), Some("secret")).unwrap();
        let mut session = renderer.open_session().await.unwrap();
        let page = session
            .navigate("https://example.com/?t=1", &options())
            .await
            .unwrap();
        session.close().await;

        assert!(page.is_success());
        assert_eq!(page.markup, "<html><head></head></html>");
    }

    #[tokio::test]
    async fn test_browserless_reports_target_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-response-code", "404")
                    .set_body_string("not found"),
            )
            .mount(&server)
            .await;

        let renderer = BrowserlessRenderer::new(&server.uri(), None).unwrap();
        let mut session = renderer.open_session().await.unwrap();
        let page = session.navigate("https://example.com", &options()).await.unwrap();
        session.close().await;

        assert_eq!(page.status_code, 404);
        assert!(!page.is_success());
    }

    #[tokio::test]
    async fn test_browserless_navigation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("net::ERR_CONNECTION_REFUSED at https://example.com"),
            )
            .mount(&server)
            .await;

        let renderer = BrowserlessRenderer::new(&server.uri(), None).unwrap();
        let mut session = renderer.open_session().await.unwrap();
        let err = session
            .navigate("https://example.com", &options())
            .await
            .unwrap_err();
        session.close().await;

        assert!(matches!(err, RenderError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_browserless_unreachable_is_session_error() {
        let renderer = BrowserlessRenderer::new("http://127.0.0.1:1", Some("secret")).unwrap();
        let mut session = renderer.open_session().await.unwrap();
        let err = session
            .navigate("https://example.com", &options())
            .await
            .unwrap_err();
        session.close().await;

        assert!(matches!(err, RenderError::Session(_)));
        assert!(!err.is_connection_level());
        assert!(!err.to_string().contains("secret"));
    }
}
