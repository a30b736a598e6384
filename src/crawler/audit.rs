//! Internal link health audit
//!
//! Fetches the verified origin's landing page, collects its same-host links
//! and probes each with a GET. 2xx and 3xx answers are reachable; anything
//! else, including no answer at all, is broken.

use crate::config::AuditConfig;
use crate::crawler::executor::{Executor, RetryPolicy};
use crate::crawler::fetcher::{fetch_page, probe_status};
use crate::crawler::parser::extract_internal_links;
use crate::crawler::ResolvedOrigin;
use crate::output::InternalLinkRecord;
use reqwest::Client;
use std::convert::Infallible;
use std::time::Duration;
use url::Url;

/// Probes one link and records the result
async fn probe_link(client: &Client, url: Url, timeout: Duration) -> InternalLinkRecord {
    let url = url.to_string();

    match probe_status(client, &url, timeout).await {
        Ok(code) => {
            tracing::trace!("{} -> HTTP {}", url, code);
            InternalLinkRecord::from_status(url, code)
        }
        Err(e) => {
            tracing::debug!("Probe of {} failed: {}", url, e);
            match e.status() {
                Some(code) => InternalLinkRecord::from_status(url, code),
                None => InternalLinkRecord::timed_out(url),
            }
        }
    }
}

/// Audits the same-host links of a landing page
#[derive(Debug, Clone)]
pub struct InternalAuditor {
    /// Client for the landing page
    page_client: Client,

    /// Client for probes, with the audit's redirect budget
    probe_client: Client,

    executor: Executor,
    retry: RetryPolicy,
    max_links: usize,
    probe_timeout: Duration,
}

impl InternalAuditor {
    /// # Arguments
    ///
    /// * `page_client` - Client used for the landing page
    /// * `probe_client` - Client used for link probes
    /// * `executor` - Executor whose batch pause is reused; its concurrency is
    ///   replaced by the audit's own limit
    /// * `retry` - Retry policy for the landing page fetch
    pub fn new(
        page_client: Client,
        probe_client: Client,
        executor: Executor,
        retry: RetryPolicy,
        config: &AuditConfig,
    ) -> Self {
        Self {
            page_client,
            probe_client,
            executor: executor.with_concurrency(config.concurrency),
            retry,
            max_links: config.max_internal_links,
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Returns one record per discovered link, in discovery order
    ///
    /// A landing page that cannot be fetched yields an empty audit.
    pub async fn audit(&self, origin: &ResolvedOrigin) -> Vec<InternalLinkRecord> {
        let landing = self
            .retry
            .run(|| fetch_page(&self.page_client, origin.as_str(), None))
            .await;

        let page = match landing {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Could not fetch landing page {}: {}", origin, e);
                return Vec::new();
            }
        };

        let links = extract_internal_links(&page.body, &page.final_url, self.max_links);
        tracing::info!("Auditing {} internal link(s) on {}", links.len(), page.final_url);

        let client = &self.probe_client;
        let timeout = self.probe_timeout;
        let tasks = links.into_iter().map(|url| {
            move || async move { Ok::<_, Infallible>(probe_link(client, url, timeout).await) }
        });

        let records: Vec<InternalLinkRecord> = self
            .executor
            .run_all(tasks)
            .await
            .into_iter()
            .filter_map(|outcome| outcome.fulfilled())
            .collect();

        let broken = records.iter().filter(|r| r.status.is_broken()).count();
        tracing::info!(
            "Internal audit of {}: {} checked, {} broken",
            origin,
            records.len(),
            broken
        );

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use crate::crawler::fetcher::build_http_client;
    use crate::output::ProbeCode;
    use crate::state::LinkStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auditor(max_links: usize) -> InternalAuditor {
        let user_agent = UserAgentConfig::default();
        let config = AuditConfig {
            max_internal_links: max_links,
            concurrency: 5,
            probe_timeout_secs: 1,
            max_redirects: 3,
        };
        InternalAuditor::new(
            build_http_client(&user_agent, Duration::from_secs(5), 5).unwrap(),
            build_http_client(&user_agent, config.probe_timeout(), config.max_redirects).unwrap(),
            Executor::new(3, Duration::from_millis(1)),
            RetryPolicy::new(2, Duration::from_millis(1)),
            &config,
        )
    }

    #[tokio::test]
    async fn test_audit_classifies_links_in_order() {
        let server = MockServer::start().await;
        let landing = format!(
            r##"<html><body>
                <a href="/ok">ok</a>
                <a href="#top">top</a>
                <a href="mailto:hi@acme.io">mail</a>
                <a href="/missing">missing</a>
                <a href="{}/error">error</a>
                <a href="/slow">slow</a>
                <a href="/ok#again">dup</a>
                <a href="https://elsewhere.org/">external</a>
            </body></html>"##,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(landing))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let origin = ResolvedOrigin::parse(&server.uri(), true).unwrap();
        let records = auditor(20).audit(&origin).await;

        let paths: Vec<String> = records
            .iter()
            .map(|r| Url::parse(&r.url).unwrap().path().to_string())
            .collect();
        assert_eq!(paths, vec!["/ok", "/missing", "/error", "/slow"]);

        assert_eq!(records[0].status, LinkStatus::Ok);
        assert_eq!(records[0].code, ProbeCode::Status(200));
        assert_eq!(records[1].status, LinkStatus::Broken);
        assert_eq!(records[1].code, ProbeCode::Status(404));
        assert_eq!(records[2].code, ProbeCode::Status(500));
        assert_eq!(records[3].status, LinkStatus::Broken);
        assert_eq!(records[3].code, ProbeCode::Timeout);
    }

    #[tokio::test]
    async fn test_audit_caps_links() {
        let server = MockServer::start().await;
        let landing: String = (0..30)
            .map(|i| format!(r#"<a href="/p{}">p</a>"#, i))
            .collect();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(landing))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let origin = ResolvedOrigin::parse(&server.uri(), true).unwrap();
        let records = auditor(20).audit(&origin).await;

        assert_eq!(records.len(), 20);
        assert!(records.iter().all(|r| r.status == LinkStatus::Ok));
    }

    #[tokio::test]
    async fn test_unreachable_landing_page_yields_empty_audit() {
        let origin = ResolvedOrigin::parse("http://127.0.0.1:1", false).unwrap();
        assert!(auditor(20).audit(&origin).await.is_empty());
    }
}
