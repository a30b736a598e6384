/// Host fragments of general search engines whose links are never backlinks
pub const EXCLUDED_SEARCH_HOSTS: &[&str] =
    &["google", "bing", "yahoo", "duckduckgo", "baidu", "yandex"];

/// Checks whether a candidate host refers back to the crawled site
///
/// Matching is by substring, so `www.example.com`, `blog.example.com` and
/// `example.com.evil.net` all count as self-references for `example.com`.
///
/// # Examples
///
/// ```
/// use backlink_sentinel::url::is_self_reference;
///
/// assert!(is_self_reference("blog.example.com", "example.com"));
/// assert!(!is_self_reference("github.com", "example.com"));
/// ```
pub fn is_self_reference(candidate_host: &str, own_host: &str) -> bool {
    !own_host.is_empty() && candidate_host.contains(own_host)
}

/// Checks whether a host belongs to one of the excluded search engines
pub fn is_search_engine_host(host: &str) -> bool {
    EXCLUDED_SEARCH_HOSTS
        .iter()
        .any(|engine| host.contains(engine))
}

/// Returns true if a host should be dropped from backlink candidates
pub fn is_excluded_host(candidate_host: &str, own_host: &str) -> bool {
    is_self_reference(candidate_host, own_host) || is_search_engine_host(candidate_host)
}
