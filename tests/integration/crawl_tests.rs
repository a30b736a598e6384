//! Integration tests for the crawl pipeline
//!
//! These tests use wiremock for the target site and the search surfaces, and
//! a scripted renderer in place of a real browser, to exercise the full
//! verify -> discover -> audit cycle end-to-end.

use backlink_sentinel::config::{Config, QueryKind, SearchSurface};
use backlink_sentinel::output::{
    CollectingProgress, JsonFileSink, NoopProgress, ProbeCode, ReportSink, VerificationStep,
};
use backlink_sentinel::verify::mock::{ScriptedNavigation, ScriptedRenderer};
use backlink_sentinel::verify::VerificationPath;
use backlink_sentinel::{Coordinator, CrawlRequest, LinkStatus, ProgressEvent};
use std::sync::Arc;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "abcd1234567";

fn meta_tag(token: &str) -> String {
    format!(r#"<meta name="backlink-sentinel-verify" content="{}">"#, token)
}

/// Creates a test configuration whose search surfaces all point at `search`
fn create_test_config(search: &MockServer) -> Config {
    let mut config = Config::default();

    config.executor.batch_pause_ms = 1;
    config.executor.retry_base_delay_ms = 1;
    config.executor.max_attempts = 2;
    config.resolver.probe_timeout_secs = 2;
    config.verifier.fallback_timeout_secs = 2;
    config.audit.probe_timeout_secs = 2;
    config.discovery.surfaces = vec![
        SearchSurface {
            name: "Web".to_string(),
            url: format!("{}/web?q={{query}}", search.uri()),
            query: QueryKind::Mention,
        },
        SearchSurface {
            name: "Apps".to_string(),
            url: format!("{}/apps?q={{query}}", search.uri()),
            query: QueryKind::AppStore,
        },
        SearchSurface {
            name: "Regional".to_string(),
            url: format!("{}/regional?q={{query}}", search.uri()),
            query: QueryKind::Domain,
        },
    ];

    config
}

/// Mounts a site whose landing page links to `/about` and `/missing`
async fn mount_site(server: &MockServer, head_extra: &str) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><head><title>Home</title>{}</head><body>
                    <a href="/about">About</a>
                    <a href="/missing">Missing</a>
                    <a href="mailto:team@example.com">Mail</a>
                    <a href="https://github.com/acme">Code</a>
                    </body></html>"#,
                    head_extra
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

/// Mounts search result pages, one of which is failing
async fn mount_search(server: &MockServer, site_uri: &str) {
    Mock::given(method("GET"))
        .and(path("/web"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<a href="https://github.com/acme/widget">repo</a>
               <a href="https://www.reddit.com/r/acme">thread</a>
               <a href="{}/self">self</a>
               <a href="/web?page=2">next</a>"#,
            site_uri
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="https://apps.apple.com/us/app/acme/id123">app</a>
               <a href="https://github.com/acme/widget">repo again</a>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/regional"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

#[test]
fn test_input_normalization() {
    let (domain, _) = CrawlRequest::new("https://www.Example.com/", TOKEN)
        .validate()
        .unwrap();
    assert_eq!(domain.as_str(), "example.com");
}

#[tokio::test]
async fn test_full_crawl_verified_site() {
    let site = MockServer::start().await;
    let search = MockServer::start().await;
    mount_site(&site, "").await;
    mount_search(&search, &site.uri()).await;

    let renderer = ScriptedRenderer::new().then(ScriptedNavigation::page_with_token(TOKEN));
    let coordinator =
        Coordinator::with_renderer(create_test_config(&search), Arc::new(renderer.clone()))
            .expect("Failed to create coordinator");
    let progress = CollectingProgress::new();

    let result = coordinator
        .run(&CrawlRequest::new(site.uri(), TOKEN), &progress)
        .await;

    assert!(result.success, "crawl failed: {:?}", result.error);
    assert!(result.is_verified);
    assert_eq!(
        result.verification.as_ref().map(|v| v.path),
        Some(VerificationPath::Rendered)
    );

    let report = result.report.expect("verified crawl has a report");
    assert_eq!(report.origin, site.uri());

    // Union of the two working surfaces, self-references and relative links dropped
    let sources: Vec<&str> = report
        .backlinks
        .iter()
        .map(|b| b.source_url.as_str())
        .collect();
    assert_eq!(
        sources,
        vec![
            "https://github.com/acme/widget",
            "https://www.reddit.com/r/acme",
            "https://apps.apple.com/us/app/acme/id123",
        ]
    );
    assert!(report.backlinks.iter().all(|b| b.status == LinkStatus::Live));
    assert_eq!(report.backlinks[2].category, "Apple Store");

    assert_eq!(report.internal_links.len(), 2);
    assert_eq!(report.internal_links[0].status, LinkStatus::Ok);
    assert_eq!(report.internal_links[1].code, ProbeCode::Status(404));

    let stats = result.stats.expect("verified crawl has stats");
    assert_eq!(stats.external_links, 3);
    assert_eq!(stats.internal_links, 2);
    assert_eq!(stats.broken_links, 1);
    assert_eq!(stats.total_estimated_value, 500 + 300 + 2500);

    let stages = progress.stages();
    assert_eq!(stages.first(), Some(&"resolve"));
    assert_eq!(stages.last(), Some(&"complete"));
    assert!(stages.contains(&"backlinks"));
    assert!(stages.contains(&"internal"));

    assert_eq!(renderer.sessions_opened(), 1);
    assert_eq!(renderer.sessions_closed(), 1);
}

#[tokio::test]
async fn test_short_token_makes_no_network_calls() {
    let site = MockServer::start().await;
    let search = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&site)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&search)
        .await;

    let renderer = ScriptedRenderer::new().then(ScriptedNavigation::page_with_token("short"));
    let coordinator =
        Coordinator::with_renderer(create_test_config(&search), Arc::new(renderer.clone()))
            .expect("Failed to create coordinator");
    let progress = CollectingProgress::new();

    let result = coordinator
        .run(&CrawlRequest::new(site.uri(), "short"), &progress)
        .await;

    assert!(!result.success);
    assert!(!result.is_verified);
    assert!(result.report.is_none());
    assert!(result
        .error
        .as_deref()
        .unwrap_or_default()
        .starts_with("Invalid input"));
    assert_eq!(renderer.sessions_opened(), 0);
    assert_eq!(progress.stages(), vec!["error"]);
}

#[tokio::test]
async fn test_connection_failure_uses_fallback() {
    let site = MockServer::start().await;
    let search = MockServer::start().await;
    mount_site(&site, &meta_tag(TOKEN)).await;
    mount_search(&search, &site.uri()).await;

    let renderer = ScriptedRenderer::new()
        .then(ScriptedNavigation::ConnectionRefused)
        .then(ScriptedNavigation::Timeout);
    let coordinator =
        Coordinator::with_renderer(create_test_config(&search), Arc::new(renderer.clone()))
            .expect("Failed to create coordinator");
    let progress = CollectingProgress::new();

    let result = coordinator
        .run(&CrawlRequest::new(site.uri(), TOKEN), &progress)
        .await;

    assert!(result.success);
    assert!(result.is_verified);

    let verification = result.verification.expect("verdict reached");
    assert_eq!(verification.path, VerificationPath::Fallback);
    assert!(verification.fallback_attempted());

    assert_eq!(renderer.navigations().len(), 2);
    assert_eq!(renderer.sessions_closed(), 1);
    assert!(progress.events().iter().any(|e| matches!(
        e,
        ProgressEvent::Verification { step, .. }
            if *step == VerificationStep::Fallback
    )));
}

#[tokio::test]
async fn test_clean_render_without_tag_is_not_verified() {
    let site = MockServer::start().await;
    let search = MockServer::start().await;
    // The raw page carries the tag; only a fallback would find it
    mount_site(&site, &meta_tag(TOKEN)).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&search)
        .await;

    let renderer = ScriptedRenderer::new().then(ScriptedNavigation::page_without_token());
    let coordinator =
        Coordinator::with_renderer(create_test_config(&search), Arc::new(renderer.clone()))
            .expect("Failed to create coordinator");
    let progress = CollectingProgress::new();

    let result = coordinator
        .run(&CrawlRequest::new(site.uri(), TOKEN), &progress)
        .await;

    assert!(result.success);
    assert!(!result.is_verified);

    let verification = result.verification.expect("verdict reached");
    assert!(!verification.fallback_attempted());

    let report = result.report.expect("unverified crawl still has a report");
    assert!(report.backlinks.is_empty());
    assert!(report.internal_links.is_empty());

    assert_eq!(progress.stages().last(), Some(&"complete"));
    assert_eq!(renderer.sessions_closed(), 1);
}

#[tokio::test]
async fn test_result_written_as_json() {
    let site = MockServer::start().await;
    let search = MockServer::start().await;
    mount_site(&site, "").await;
    mount_search(&search, &site.uri()).await;

    let renderer = ScriptedRenderer::new().then(ScriptedNavigation::page_with_token(TOKEN));
    let coordinator =
        Coordinator::with_renderer(create_test_config(&search), Arc::new(renderer))
            .expect("Failed to create coordinator");

    let result = coordinator
        .run(
            &CrawlRequest::new(site.uri(), TOKEN),
            &NoopProgress,
        )
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("result.json");
    JsonFileSink::new(&path).deliver(&result).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["isVerified"], true);
    assert_eq!(json["stats"]["externalLinks"], 3);
    assert_eq!(json["stats"]["brokenLinks"], 1);
    assert_eq!(json["report"]["internalLinks"][1]["code"], 404);
    assert_eq!(json["report"]["backlinks"][0]["status"], "LIVE");
}
