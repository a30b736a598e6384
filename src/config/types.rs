use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Backlink Sentinel
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub executor: ExecutorConfig,
    pub resolver: ResolverConfig,
    pub verifier: VerifierConfig,
    pub discovery: DiscoveryConfig,
    pub audit: AuditConfig,
}

/// Shared HTTP client settings for plain (non-rendered) requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Default per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Redirect hops followed by the shared client
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            max_redirects: 5,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "BacklinkSentinel".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `Mozilla/5.0 (compatible; Name/Version; +ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Retry/throttle executor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum tasks in flight per batch
    pub concurrency: usize,

    /// Pause after each completed batch (milliseconds)
    #[serde(rename = "batch-pause-ms")]
    pub batch_pause_ms: u64,

    /// Attempts per retried task, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry; doubles on each further attempt (milliseconds)
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            batch_pause_ms: 1000,
            max_attempts: 3,
            retry_base_delay_ms: 2000,
        }
    }
}

impl ExecutorConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

/// Origin resolver settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Timeout for each HEAD probe (seconds)
    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,

    /// Redirect hops followed while probing
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 8,
            max_redirects: 5,
        }
    }
}

impl ResolverConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Ownership verifier settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Base URL of the Browserless rendering service
    #[serde(rename = "browserless-url")]
    pub browserless_url: String,

    /// Optional Browserless API token
    #[serde(rename = "browserless-token")]
    pub browserless_token: Option<String>,

    /// Navigation timeout for the rendering session (seconds)
    #[serde(rename = "render-timeout-secs")]
    pub render_timeout_secs: u64,

    /// Wait after DOM-ready so deferred scripts can inject the tag (milliseconds)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Timeout for the non-rendered fallback fetch (seconds)
    #[serde(rename = "fallback-timeout-secs")]
    pub fallback_timeout_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            browserless_url: "http://localhost:3000".to_string(),
            browserless_token: None,
            render_timeout_secs: 45,
            settle_delay_ms: 2000,
            fallback_timeout_secs: 20,
        }
    }
}

impl VerifierConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs)
    }
}

/// Which query a search surface is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    /// `"<domain>" -site:<domain>`
    Mention,
    /// `site:play.google.com OR site:apps.apple.com "<brand>"`
    AppStore,
    /// The bare domain
    Domain,
}

/// A public search surface queried for backlinks
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSurface {
    /// Display name used in logs
    pub name: String,

    /// Result page URL template; `{query}` is replaced with the encoded query
    pub url: String,

    /// Query sent to this surface
    pub query: QueryKind,
}

impl SearchSurface {
    fn new(name: &str, url: &str, query: QueryKind) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            query,
        }
    }
}

/// Returns the built-in search surfaces
pub fn default_surfaces() -> Vec<SearchSurface> {
    vec![
        SearchSurface::new(
            "DuckDuckGo",
            "https://html.duckduckgo.com/html/?q={query}",
            QueryKind::Mention,
        ),
        SearchSurface::new(
            "Bing",
            "https://www.bing.com/search?q={query}",
            QueryKind::Mention,
        ),
        SearchSurface::new(
            "Bing Apps",
            "https://www.bing.com/search?q={query}",
            QueryKind::AppStore,
        ),
        SearchSurface::new(
            "Yahoo",
            "https://search.yahoo.com/search?p={query}",
            QueryKind::Mention,
        ),
        SearchSurface::new("Baidu", "https://www.baidu.com/s?wd={query}", QueryKind::Domain),
        SearchSurface::new(
            "Yandex",
            "https://yandex.com/search/?text={query}",
            QueryKind::Domain,
        ),
    ]
}

/// Backlink discovery settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Cap on unique backlinks kept after deduplication
    #[serde(rename = "max-backlinks")]
    pub max_backlinks: usize,

    /// Search surfaces to query
    pub surfaces: Vec<SearchSurface>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_backlinks: 50,
            surfaces: default_surfaces(),
        }
    }
}

/// Internal health audit settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Cap on same-host links probed
    #[serde(rename = "max-internal-links")]
    pub max_internal_links: usize,

    /// Probes in flight per batch
    pub concurrency: usize,

    /// Timeout for each probe (seconds)
    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,

    /// Redirect hops followed per probe
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_internal_links: 20,
            concurrency: 5,
            probe_timeout_secs: 10,
            max_redirects: 3,
        }
    }
}

impl AuditConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
