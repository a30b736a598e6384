//! Backlink discovery across public search surfaces
//!
//! Each configured surface is one executor task: fetch its result page for
//! the surface's query, extract external links, and return them. A surface
//! that keeps failing contributes nothing. The union of all lists is
//! deduplicated by exact URL and truncated, first-N in submission order.

use crate::config::{DiscoveryConfig, QueryKind, SearchSurface};
use crate::crawler::executor::{Executor, RetryPolicy, TaskOutcome};
use crate::crawler::fetcher::{fetch_page, FetchError};
use crate::crawler::parser::extract_external_links;
use crate::url::{brand_name, NormalizedDomain};
use reqwest::Client;
use std::collections::HashSet;
use url::form_urlencoded;

/// Hosts targeted by the app-store query
pub const APP_STORE_HOSTS: [&str; 2] = ["play.google.com", "apps.apple.com"];

/// `"<domain>" -site:<domain>`
pub fn mention_query(domain: &str) -> String {
    format!("\"{}\" -site:{}", domain, domain)
}

/// `site:play.google.com OR site:apps.apple.com "<brand>"`
pub fn app_store_query(domain: &str) -> String {
    let sites: Vec<String> = APP_STORE_HOSTS
        .iter()
        .map(|host| format!("site:{}", host))
        .collect();
    format!("{} \"{}\"", sites.join(" OR "), brand_name(domain))
}

/// Builds the query a surface is sent for a domain
pub fn build_query(kind: QueryKind, domain: &str) -> String {
    match kind {
        QueryKind::Mention => mention_query(domain),
        QueryKind::AppStore => app_store_query(domain),
        QueryKind::Domain => domain.to_string(),
    }
}

/// Substitutes the form-encoded query into a surface's URL template
pub fn surface_url(surface: &SearchSurface, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    surface.url.replace("{query}", &encoded)
}

/// Fetches one result page and extracts its external links
///
/// 5xx and transport failures are errors so the retry policy can act on them.
/// Any other non-200 answer means the surface refused us; it yields an empty
/// list without retrying.
async fn scrape_surface(
    client: &Client,
    url: &str,
    own_host: &str,
) -> Result<Vec<String>, FetchError> {
    let page = fetch_page(client, url, None).await?;

    if page.status_code != 200 {
        tracing::debug!("{} answered HTTP {}, skipping", url, page.status_code);
        return Ok(Vec::new());
    }

    Ok(extract_external_links(&page.body, own_host))
}

/// Queries every surface for a domain and collects backlink candidates
#[derive(Debug, Clone)]
pub struct DiscoveryEngine {
    client: Client,
    executor: Executor,
    retry: RetryPolicy,
    surfaces: Vec<SearchSurface>,
    max_backlinks: usize,
}

impl DiscoveryEngine {
    pub fn new(
        client: Client,
        executor: Executor,
        retry: RetryPolicy,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            client,
            executor,
            retry,
            surfaces: config.surfaces.clone(),
            max_backlinks: config.max_backlinks,
        }
    }

    /// The URLs that would be fetched for a domain, one per surface
    pub fn planned_requests(&self, domain: &NormalizedDomain) -> Vec<(String, String)> {
        self.surfaces
            .iter()
            .map(|surface| {
                let query = build_query(surface.query, domain.host());
                (surface.name.clone(), surface_url(surface, &query))
            })
            .collect()
    }

    /// Returns distinct backlink candidate URLs, at most `max_backlinks`
    pub async fn discover(&self, domain: &NormalizedDomain) -> Vec<String> {
        let own_host = domain.host();
        let client = &self.client;
        let retry = self.retry;
        let requests = self.planned_requests(domain);

        tracing::info!(
            "Querying {} search surfaces for {}",
            requests.len(),
            domain
        );

        let tasks = requests.iter().map(|(_, url)| {
            let url = url.as_str();
            move || async move {
                retry
                    .run(move || scrape_surface(client, url, own_host))
                    .await
            }
        });

        let outcomes = self.executor.run_all(tasks).await;

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for ((name, _), outcome) in requests.iter().zip(outcomes) {
            match outcome {
                TaskOutcome::Fulfilled(found) => {
                    tracing::debug!("{} returned {} candidate(s)", name, found.len());
                    for link in found {
                        if seen.insert(link.clone()) {
                            links.push(link);
                        }
                    }
                }
                TaskOutcome::Rejected(e) => {
                    tracing::warn!("Search surface {} failed: {}", name, e);
                }
            }
        }

        links.truncate(self.max_backlinks);
        tracing::info!("Discovered {} unique backlink(s) for {}", links.len(), domain);
        links
    }
}
