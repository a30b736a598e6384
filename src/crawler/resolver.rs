//! Origin resolver
//!
//! Probes protocol and `www` variants of a normalized domain, in order and one
//! at a time, to find an origin that answers. When nothing answers the
//! resolver still produces `https://<domain>` so verification can report the
//! failure.

use crate::config::ResolverConfig;
use crate::crawler::fetcher::head_probe;
use crate::url::{is_ip_literal, is_subdomain, NormalizedDomain};
use crate::AuditError;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use url::Url;

/// A scheme + host (+ port) origin chosen for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrigin {
    url: Url,
    value: String,
    probed: bool,
}

impl ResolvedOrigin {
    /// Builds an origin from any URL, keeping only scheme, host and port
    pub fn from_url(url: &Url, probed: bool) -> Result<Self, AuditError> {
        let value = url.origin().ascii_serialization();
        let url = Url::parse(&value)?;
        Ok(Self { url, value, probed })
    }

    pub fn parse(input: &str, probed: bool) -> Result<Self, AuditError> {
        Self::from_url(&Url::parse(input)?, probed)
    }

    /// The origin without a trailing slash, e.g. `https://example.com`
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// False when no variant answered and this is the last-resort origin
    pub fn was_probed(&self) -> bool {
        self.probed
    }
}

impl fmt::Display for ResolvedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl serde::Serialize for ResolvedOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

/// Returns the URLs the resolver would probe, in probe order
///
/// Root domains get four variants (`https`, `https://www.`, `http`,
/// `http://www.`). Subdomains, loopback hosts and IP literals only get the two
/// scheme variants, since adding `www.` would change the host.
///
/// ```
/// use backlink_sentinel::crawler::candidate_variants;
/// use backlink_sentinel::normalize_domain;
///
/// let domain = normalize_domain("blog.example.com").unwrap();
/// assert_eq!(
///     candidate_variants(&domain),
///     vec!["https://blog.example.com", "http://blog.example.com"]
/// );
/// ```
pub fn candidate_variants(domain: &NormalizedDomain) -> Vec<String> {
    let authority = domain.as_str();
    let host = domain.host();

    if domain.is_loopback() || is_ip_literal(host) || is_subdomain(host) {
        vec![format!("https://{}", authority), format!("http://{}", authority)]
    } else {
        vec![
            format!("https://{}", authority),
            format!("https://www.{}", authority),
            format!("http://{}", authority),
            format!("http://www.{}", authority),
        ]
    }
}

/// Sequential HEAD-probing resolver
#[derive(Debug, Clone)]
pub struct OriginResolver {
    client: Client,
    probe_timeout: Duration,
}

impl OriginResolver {
    pub fn new(client: Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Resolves a domain to the first variant answering with 2xx or 3xx
    ///
    /// The redirect target of a successful probe wins over the probed URL.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Resolution` only if even the last-resort origin
    /// cannot be built.
    pub async fn resolve(&self, domain: &NormalizedDomain) -> Result<ResolvedOrigin, AuditError> {
        for variant in candidate_variants(domain) {
            tracing::debug!("Probing {}", variant);

            match head_probe(&self.client, &variant, self.probe_timeout).await {
                Ok((final_url, status)) if (200..400).contains(&status) => {
                    let origin = ResolvedOrigin::from_url(&final_url, true)?;
                    tracing::info!("Resolved {} to {} (HTTP {})", domain, origin, status);
                    return Ok(origin);
                }
                Ok((_, status)) => {
                    tracing::debug!("Variant {} answered HTTP {}", variant, status);
                }
                Err(e) => {
                    tracing::debug!("Variant {} failed: {}", variant, e);
                }
            }
        }

        let fallback = format!("https://{}", domain.as_str());
        tracing::warn!(
            "No variant of {} answered, falling back to {}",
            domain,
            fallback
        );

        ResolvedOrigin::parse(&fallback, false).map_err(|e| AuditError::Resolution {
            domain: domain.to_string(),
            message: e.to_string(),
        })
    }
}
