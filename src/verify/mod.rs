//! Ownership verification
//!
//! Drives the verification state machine for one attempt:
//!
//! ```text
//! Start -> OriginResolved -> RenderAttempted -> RenderVerified -> Verified
//!                                            -> RenderFailed   -> NotVerified
//!                                                              -> FallbackAttempted -> FallbackVerified -> Verified
//!                                                                                   -> FallbackFailed   -> NotVerified
//! ```
//!
//! The fallback (a plain GET of the origin) only runs when rendering failed at
//! the connection level. A page that rendered cleanly but lacks the tag is a
//! final `NotVerified`.

pub mod mock;
pub mod renderer;

pub use renderer::{
    BrowserlessRenderer, NavigateOptions, RenderError, RenderSession, RenderedPage, Renderer,
};

use crate::config::VerifierConfig;
use crate::crawler::fetcher::fetch_page;
use crate::crawler::parser::token_matches;
use crate::crawler::{OriginResolver, ResolvedOrigin};
use crate::output::{ProgressEvent, ProgressSink, VerificationStep};
use crate::state::VerificationState;
use crate::url::NormalizedDomain;
use crate::{AuditError, InputError};
use futures::FutureExt;
use reqwest::Client;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Minimum length of a verification token, after trimming
pub const MIN_TOKEN_LEN: usize = 10;

/// Caller-supplied token expected in the verification meta tag
///
/// Only its length is validated; the content is never interpreted.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Validates and wraps a raw token
    ///
    /// ```
    /// use backlink_sentinel::VerificationToken;
    ///
    /// assert!(VerificationToken::parse("abcd1234567").is_ok());
    /// assert!(VerificationToken::parse("short").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();

        if len < MIN_TOKEN_LEN {
            return Err(InputError::TokenTooShort {
                len,
                min: MIN_TOKEN_LEN,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerificationToken({} chars)", self.0.chars().count())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    NotVerified,
}

/// Which check produced the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPath {
    Rendered,
    Fallback,
}

/// Terminal result of one verification attempt
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub verdict: Verdict,
    pub origin: ResolvedOrigin,
    pub path: VerificationPath,

    /// Every state visited, from `Start` to the terminal state
    pub trail: Vec<VerificationState>,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        self.verdict == Verdict::Verified
    }

    pub fn fallback_attempted(&self) -> bool {
        self.trail.contains(&VerificationState::FallbackAttempted)
    }
}

/// Enforces legal state transitions and records the trail
struct StateTracker {
    current: VerificationState,
    trail: Vec<VerificationState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            current: VerificationState::Start,
            trail: vec![VerificationState::Start],
        }
    }

    fn advance(&mut self, next: VerificationState) -> Result<(), AuditError> {
        if !self.current.can_transition_to(next) {
            return Err(AuditError::InvalidTransition {
                from: self.current,
                to: next,
            });
        }

        tracing::trace!("Verification {} -> {}", self.current, next);
        self.current = next;
        self.trail.push(next);
        Ok(())
    }

    fn finish(
        self,
        origin: ResolvedOrigin,
        path: VerificationPath,
    ) -> Result<VerificationOutcome, AuditError> {
        let verdict = match self.current {
            VerificationState::Verified => Verdict::Verified,
            VerificationState::NotVerified => Verdict::NotVerified,
            other => {
                return Err(AuditError::InvalidTransition {
                    from: other,
                    to: VerificationState::NotVerified,
                })
            }
        };

        Ok(VerificationOutcome {
            verdict,
            origin,
            path,
            trail: self.trail,
        })
    }
}

/// What the rendering step established
enum RenderAttempt {
    /// The rendered page carried the token
    Verified,

    /// The page was inspected and did not prove ownership
    Inspected(String),

    /// Rendering did not produce a page
    Failed(RenderError),
}

/// Runs resolve, render and fallback for one domain
pub struct Verifier {
    resolver: OriginResolver,
    renderer: Arc<dyn Renderer>,
    client: Client,
    options: NavigateOptions,
    fallback_timeout: Duration,
}

impl Verifier {
    pub fn new(
        resolver: OriginResolver,
        renderer: Arc<dyn Renderer>,
        client: Client,
        config: &VerifierConfig,
    ) -> Self {
        Self {
            resolver,
            renderer,
            client,
            options: NavigateOptions::from_config(config),
            fallback_timeout: config.fallback_timeout(),
        }
    }

    /// Verifies that `domain` serves `token` in its verification meta tag
    ///
    /// # Returns
    ///
    /// * `Ok(VerificationOutcome)` - A verdict, verified or not
    /// * `Err(AuditError)` - Resolution failed; no verdict was reached
    pub async fn verify(
        &self,
        domain: &NormalizedDomain,
        token: &VerificationToken,
        progress: &dyn ProgressSink,
    ) -> Result<VerificationOutcome, AuditError> {
        let mut tracker = StateTracker::new();

        let origin = self.resolver.resolve(domain).await?;
        tracker.advance(VerificationState::OriginResolved)?;
        progress.emit(ProgressEvent::Resolve {
            domain: domain.to_string(),
            origin: origin.to_string(),
            probed: origin.was_probed(),
        });

        let attempt = self.render(&origin, token, progress).await;
        tracker.advance(VerificationState::RenderAttempted)?;

        let failure = match attempt {
            RenderAttempt::Verified => {
                tracker.advance(VerificationState::RenderVerified)?;
                tracker.advance(VerificationState::Verified)?;
                tracing::info!("Verified {} via rendered page", origin);
                progress.emit(ProgressEvent::verification(
                    VerificationStep::Success,
                    "verification tag found",
                ));
                return tracker.finish(origin, VerificationPath::Rendered);
            }
            RenderAttempt::Inspected(reason) => {
                tracker.advance(VerificationState::RenderFailed)?;
                tracker.advance(VerificationState::NotVerified)?;
                tracing::info!("Not verified {}: {}", origin, reason);
                progress.emit(ProgressEvent::verification(VerificationStep::Failed, reason));
                return tracker.finish(origin, VerificationPath::Rendered);
            }
            RenderAttempt::Failed(err) => err,
        };

        tracker.advance(VerificationState::RenderFailed)?;

        if !failure.is_connection_level() {
            tracing::warn!("Rendering failed for {}: {}", origin, failure);
            tracker.advance(VerificationState::NotVerified)?;
            progress.emit(ProgressEvent::verification(
                VerificationStep::Error,
                failure.to_string(),
            ));
            return tracker.finish(origin, VerificationPath::Rendered);
        }

        tracing::warn!(
            "Rendering could not reach {} ({}), trying plain fetch",
            origin,
            failure
        );
        tracker.advance(VerificationState::FallbackAttempted)?;
        progress.emit(ProgressEvent::verification(
            VerificationStep::Fallback,
            failure.to_string(),
        ));

        match fetch_page(&self.client, origin.as_str(), Some(self.fallback_timeout)).await {
            Ok(page) if token_matches(&page.body, token.as_str()) => {
                tracker.advance(VerificationState::FallbackVerified)?;
                tracker.advance(VerificationState::Verified)?;
                tracing::info!("Verified {} via plain fetch", origin);
                progress.emit(ProgressEvent::verification(
                    VerificationStep::Success,
                    "verification tag found by plain fetch",
                ));
            }
            Ok(page) => {
                tracker.advance(VerificationState::FallbackFailed)?;
                tracker.advance(VerificationState::NotVerified)?;
                tracing::info!(
                    "Not verified {}: plain fetch (HTTP {}) lacks the tag",
                    origin,
                    page.status_code
                );
                progress.emit(ProgressEvent::verification(
                    VerificationStep::Failed,
                    "verification tag missing or mismatched",
                ));
            }
            Err(e) => {
                tracker.advance(VerificationState::FallbackFailed)?;
                tracker.advance(VerificationState::NotVerified)?;
                tracing::warn!("Plain fetch of {} failed: {}", origin, e);
                progress.emit(ProgressEvent::verification(
                    VerificationStep::Error,
                    e.to_string(),
                ));
            }
        }

        tracker.finish(origin, VerificationPath::Fallback)
    }

    /// Renders the origin in a fresh session and inspects the markup
    ///
    /// The session is closed before this returns, whatever happened. A panic
    /// during navigation is re-raised after teardown.
    async fn render(
        &self,
        origin: &ResolvedOrigin,
        token: &VerificationToken,
        progress: &dyn ProgressSink,
    ) -> RenderAttempt {
        progress.emit(ProgressEvent::verification(
            VerificationStep::Launching,
            "opening rendering session",
        ));

        let mut session = match self.renderer.open_session().await {
            Ok(session) => session,
            Err(e) => return RenderAttempt::Failed(e),
        };

        progress.emit(ProgressEvent::verification(
            VerificationStep::Fetching,
            origin.to_string(),
        ));
        let navigation = AssertUnwindSafe(self.navigate_with_retry(session.as_mut(), origin))
            .catch_unwind()
            .await;
        session.close().await;

        let result = match navigation {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        };

        match result {
            Ok(page) if !page.is_success() => {
                RenderAttempt::Inspected(format!("origin answered HTTP {}", page.status_code))
            }
            Ok(page) if token_matches(&page.markup, token.as_str()) => RenderAttempt::Verified,
            Ok(_) => RenderAttempt::Inspected("verification tag missing or mismatched".to_string()),
            Err(e) => RenderAttempt::Failed(e),
        }
    }

    /// Navigates with a cache-busting parameter, then once more without it
    async fn navigate_with_retry(
        &self,
        session: &mut dyn RenderSession,
        origin: &ResolvedOrigin,
    ) -> Result<RenderedPage, RenderError> {
        let mut busted = origin.url().clone();
        busted
            .query_pairs_mut()
            .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());

        match session.navigate(busted.as_str(), &self.options).await {
            Ok(page) => Ok(page),
            Err(e) => {
                tracing::debug!("First navigation to {} failed: {}", busted, e);
                session.navigate(origin.as_str(), &self.options).await
            }
        }
    }
}
