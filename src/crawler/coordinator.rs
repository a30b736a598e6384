//! Crawler coordinator - top-level crawl orchestration
//!
//! This module sequences one crawl request:
//! - Validating the site and token (no network on failure)
//! - Verifying ownership (resolve, render, fallback)
//! - Running backlink discovery and the internal audit side by side
//! - Assembling the report and emitting the terminal progress event
//!
//! `Coordinator::run` never fails: every error becomes a failed `CrawlResult`.

use crate::config::Config;
use crate::crawler::audit::InternalAuditor;
use crate::crawler::discovery::DiscoveryEngine;
use crate::crawler::executor::{Executor, RetryPolicy};
use crate::crawler::fetcher::HttpClients;
use crate::crawler::resolver::{candidate_variants, OriginResolver};
use crate::output::{
    BacklinkRecord, CrawlReport, CrawlResult, CrawlStep, ProgressEvent, ProgressSink,
};
use crate::url::{normalize_domain, NormalizedDomain};
use crate::verify::{BrowserlessRenderer, Renderer, VerificationToken, Verifier};
use crate::{AuditError, InputError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Caller input for one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Free-form site input, e.g. `https://www.Example.com/`
    pub site: String,

    /// Token expected in the verification meta tag
    pub token: String,
}

impl CrawlRequest {
    pub fn new(site: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            token: token.into(),
        }
    }

    /// Normalizes the site and validates the token
    pub fn validate(&self) -> Result<(NormalizedDomain, VerificationToken), InputError> {
        let domain = normalize_domain(&self.site)?;
        let token = VerificationToken::parse(&self.token)?;
        Ok((domain, token))
    }
}

/// What a crawl would do, computed without any network access
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub domain: NormalizedDomain,

    /// Origins the resolver would probe, in order
    pub variants: Vec<String>,

    /// `(surface name, result page URL)` pairs discovery would fetch
    pub searches: Vec<(String, String)>,
}

/// Main crawl coordinator
pub struct Coordinator {
    config: Arc<Config>,
    verifier: Verifier,
    discovery: DiscoveryEngine,
    auditor: InternalAuditor,
}

impl Coordinator {
    /// Creates a coordinator that renders through Browserless
    pub fn new(config: Config) -> Result<Self, AuditError> {
        let renderer = BrowserlessRenderer::from_config(&config.verifier)?;
        Self::with_renderer(config, Arc::new(renderer))
    }

    /// Creates a coordinator with a caller-supplied renderer
    pub fn with_renderer(config: Config, renderer: Arc<dyn Renderer>) -> Result<Self, AuditError> {
        let clients = HttpClients::from_config(&config)?;
        let executor = Executor::from_config(&config.executor);
        let retry = RetryPolicy::from_config(&config.executor);

        let resolver = OriginResolver::new(clients.resolver.clone(), &config.resolver);
        let verifier = Verifier::new(resolver, renderer, clients.general.clone(), &config.verifier);
        let discovery =
            DiscoveryEngine::new(clients.general.clone(), executor, retry, &config.discovery);
        let auditor =
            InternalAuditor::new(clients.general, clients.audit, executor, retry, &config.audit);

        Ok(Self {
            config: Arc::new(config),
            verifier,
            discovery,
            auditor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates a request and describes the crawl it would start
    pub fn plan(&self, request: &CrawlRequest) -> Result<CrawlPlan, InputError> {
        let (domain, _token) = request.validate()?;

        Ok(CrawlPlan {
            variants: candidate_variants(&domain),
            searches: self.discovery.planned_requests(&domain),
            domain,
        })
    }

    /// Runs one crawl to completion
    ///
    /// Failures, including panics inside the pipeline, are logged, reported
    /// as an `error` progress event and returned as a failed result.
    pub async fn run(&self, request: &CrawlRequest, progress: &dyn ProgressSink) -> CrawlResult {
        let outcome = AssertUnwindSafe(self.try_run(request, progress))
            .catch_unwind()
            .await;

        let message = match outcome {
            Ok(Ok(result)) => return result,
            Ok(Err(e)) => e.to_string(),
            Err(_) => "internal error: crawl aborted unexpectedly".to_string(),
        };

        tracing::error!("Crawl of {} failed: {}", request.site, message);
        progress.emit(ProgressEvent::Error {
            message: message.clone(),
        });
        CrawlResult::failed(message)
    }

    async fn try_run(
        &self,
        request: &CrawlRequest,
        progress: &dyn ProgressSink,
    ) -> Result<CrawlResult, AuditError> {
        let (domain, token) = request.validate()?;
        tracing::info!("Starting crawl for {}", domain);

        let verification = self.verifier.verify(&domain, &token, progress).await?;

        if !verification.is_verified() {
            tracing::info!("{} is not verified, skipping discovery", domain);
            let report = CrawlReport::unverified(verification.origin.to_string());
            progress.emit(ProgressEvent::Complete { verified: false });
            return Ok(CrawlResult::completed(verification, report));
        }

        let backlinks = async {
            progress.emit(ProgressEvent::Crawl {
                step: CrawlStep::Backlinks,
            });
            let urls = self.discovery.discover(&domain).await;

            progress.emit(ProgressEvent::Crawl {
                step: CrawlStep::Processing,
            });
            let records: Vec<BacklinkRecord> =
                urls.into_iter().map(BacklinkRecord::classify).collect();

            progress.emit(ProgressEvent::Backlinks {
                count: records.len(),
            });
            records
        };

        let internal_links = async {
            progress.emit(ProgressEvent::Crawl {
                step: CrawlStep::Internal,
            });
            let records = self.auditor.audit(&verification.origin).await;

            progress.emit(ProgressEvent::Internal {
                count: records.len(),
            });
            records
        };

        let (backlinks, internal_links) = tokio::join!(backlinks, internal_links);

        let report = CrawlReport::assemble(
            verification.origin.to_string(),
            backlinks,
            internal_links,
        );
        tracing::info!(
            "Crawl of {} complete: {} backlinks, {} internal links ({} broken)",
            domain,
            report.summary.external_links,
            report.summary.internal_links,
            report.summary.broken_links
        );

        progress.emit(ProgressEvent::Complete { verified: true });
        Ok(CrawlResult::completed(verification, report))
    }
}
