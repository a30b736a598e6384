//! Scripted renderer for tests
//!
//! Replays canned navigation results in order and records how sessions were
//! used, so callers can assert on fallback behavior and session teardown.

use crate::verify::renderer::{NavigateOptions, RenderError, RenderSession, RenderedPage, Renderer};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// One scripted response to a navigation
#[derive(Debug)]
pub enum ScriptedNavigation {
    /// Navigation succeeds with this status and markup
    Page { status_code: u16, markup: String },

    /// Navigation times out
    Timeout,

    /// Navigation fails to connect
    ConnectionRefused,

    /// The renderer answers with a non-connection API error
    ApiError(u16),

    /// The renderer is unreachable
    Unavailable,

    /// The session panics mid-navigation
    Panic,
}

impl ScriptedNavigation {
    /// A 200 page whose head carries the verification tag
    pub fn page_with_token(token: &str) -> Self {
        Self::Page {
            status_code: 200,
            markup: format!(
                r#"<html><head><meta name="backlink-sentinel-verify" content="{}"></head><body></body></html>"#,
                token
            ),
        }
    }

    /// A 200 page with no verification tag
    pub fn page_without_token() -> Self {
        Self::Page {
            status_code: 200,
            markup: "<html><head><title>Home</title></head><body></body></html>".to_string(),
        }
    }

    fn into_result(self, url: &str) -> Result<RenderedPage, RenderError> {
        match self {
            Self::Page {
                status_code,
                markup,
            } => Ok(RenderedPage {
                status_code,
                markup,
            }),
            Self::Timeout => Err(RenderError::Timeout {
                url: url.to_string(),
            }),
            Self::ConnectionRefused => Err(RenderError::Connection {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            }),
            Self::ApiError(status) => Err(RenderError::Api {
                status,
                message: "scripted API error".to_string(),
            }),
            Self::Unavailable => Err(RenderError::Session(
                "renderer at http://127.0.0.1:1/content unreachable".to_string(),
            )),
            Self::Panic => panic!("scripted navigation panic at {}", url),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<VecDeque<ScriptedNavigation>>,
    navigations: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Renderer that replays a script of navigation results
///
/// Navigations beyond the end of the script time out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRenderer {
    shared: Arc<Shared>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a navigation result (builder pattern)
    pub fn then(self, navigation: ScriptedNavigation) -> Self {
        lock(&self.shared.script).push_back(navigation);
        self
    }

    pub fn sessions_opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// URLs passed to `navigate`, in call order
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.shared.navigations).clone()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct ScriptedSession {
    shared: Arc<Shared>,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn navigate(
        &mut self,
        url: &str,
        _options: &NavigateOptions,
    ) -> Result<RenderedPage, RenderError> {
        lock(&self.shared.navigations).push(url.to_string());
        let next = lock(&self.shared.script).pop_front();

        next.unwrap_or(ScriptedNavigation::Timeout).into_result(url)
    }

    async fn close(self: Box<Self>) {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
    }
}
