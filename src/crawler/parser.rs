//! HTML parser for link extraction and verification tag matching
//!
//! This module handles:
//! - External link extraction for backlink discovery (absolute `http(s)` and
//!   protocol-relative hrefs, minus self-references and search engines)
//! - Same-host link extraction for the internal link audit
//! - Locating the verification meta tag in raw or rendered markup

use crate::url::is_excluded_host;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Name of the meta tag that carries the verification token
pub const VERIFICATION_META_NAME: &str = "backlink-sentinel-verify";

/// Tag patterns tried in order; the first one that matches supplies the token
static TOKEN_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // name before content
        Regex::new(
            r#"(?i)<meta[^>]*name=['"]backlink-sentinel-verify['"][^>]*content=['"]([^'"]+)['"]"#,
        )
        .expect("valid regex"),
        // content before name
        Regex::new(
            r#"(?i)<meta[^>]*content=['"]([^'"]+)['"][^>]*name=['"]backlink-sentinel-verify['"]"#,
        )
        .expect("valid regex"),
        // name mentioned anywhere in the tag
        Regex::new(r#"(?i)<meta[^>]+backlink-sentinel-verify[^>]+content=['"]([^'"]+)['"]"#)
            .expect("valid regex"),
    ]
});

fn anchor_selector() -> Option<Selector> {
    Selector::parse("a[href]").ok()
}

/// Extracts distinct external URLs from a search result page
///
/// # Rules
///
/// - `http://` and `https://` hrefs are kept as-is
/// - `//host/path` becomes `https://host/path`
/// - Relative hrefs are skipped
/// - Malformed hrefs are skipped
/// - Hosts containing `own_host`, or a search engine name, are skipped
///
/// Duplicates are removed; the first occurrence keeps its document position.
pub fn extract_external_links(html: &str, own_host: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Some(selector) = anchor_selector() else {
        return Vec::new();
    };

    let own_host = own_host.to_lowercase();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(url) = absolute_external_url(href) else {
            continue;
        };

        let Some(host) = url.host_str() else {
            continue;
        };

        if is_excluded_host(&host.to_lowercase(), &own_host) {
            continue;
        }

        let link = url.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

/// Parses an href that is already absolute, or protocol-relative
fn absolute_external_url(href: &str) -> Option<Url> {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();

    let candidate = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        return None;
    };

    Url::parse(&candidate).ok()
}

/// Extracts same-host links from a landing page
///
/// Fragment-only, `mailto:` and `tel:` hrefs are skipped. Every other href is
/// resolved against `base_url`, stripped of its fragment and kept only when
/// its host equals the base host. Results keep document order, are
/// deduplicated, and are capped at `limit`.
pub fn extract_internal_links(html: &str, base_url: &Url, limit: usize) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Some(selector) = anchor_selector() else {
        return Vec::new();
    };

    let Some(base_host) = base_url.host_str() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if links.len() >= limit {
            break;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(url) = resolve_internal(href, base_url) else {
            continue;
        };

        if url.host_str() != Some(base_host) {
            continue;
        }

        if seen.insert(url.to_string()) {
            links.push(url);
        }
    }

    links
}

fn resolve_internal(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();

    if href.is_empty()
        || href.starts_with('#')
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

/// Returns the token carried by the verification meta tag, if any
///
/// The first pattern that matches decides; its captured value is returned
/// untrimmed.
pub fn find_verification_token(markup: &str) -> Option<&str> {
    TOKEN_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(markup))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Returns true if the markup carries `expected`, compared after trimming
///
/// Comparison is case-sensitive; only the tag itself is matched loosely.
pub fn token_matches(markup: &str, expected: &str) -> bool {
    find_verification_token(markup)
        .map(|found| found.trim() == expected.trim())
        .unwrap_or(false)
}
