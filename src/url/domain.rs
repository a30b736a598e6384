use std::net::IpAddr;
use url::Url;

/// Hosts treated as loopback: `www` stripping is skipped and the port is kept
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]", "::1"];

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use backlink_sentinel::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true for `localhost` and loopback IP literals
pub fn is_loopback(host: &str) -> bool {
    LOOPBACK_HOSTS.contains(&host)
}

/// Returns true if the host is an IPv4 or IPv6 literal
pub fn is_ip_literal(host: &str) -> bool {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>().is_ok()
}

/// Returns true if the host has at least three dot-separated labels
///
/// `blog.example.com` is a subdomain, `example.com` is a root domain. IP
/// literals are never subdomains.
pub fn is_subdomain(host: &str) -> bool {
    !is_ip_literal(host) && host.split('.').count() > 2
}

/// Returns the first label of the host, used as the brand name in queries
///
/// ```
/// use backlink_sentinel::url::brand_name;
///
/// assert_eq!(brand_name("acme.io"), "acme");
/// assert_eq!(brand_name("shop.acme.io"), "shop");
/// ```
pub fn brand_name(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_is_subdomain() {
        assert!(!is_subdomain("example.com"));
        assert!(is_subdomain("blog.example.com"));
        assert!(is_subdomain("api.v2.example.com"));
        assert!(!is_subdomain("localhost"));
        assert!(!is_subdomain("127.0.0.1"));
    }

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback("localhost"));
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("[::1]"));
        assert!(!is_loopback("example.com"));
    }

    #[test]
    fn test_ip_literal() {
        assert!(is_ip_literal("10.0.0.1"));
        assert!(is_ip_literal("[::1]"));
        assert!(!is_ip_literal("example.com"));
    }

    #[test]
    fn test_brand_name() {
        assert_eq!(brand_name("example.com"), "example");
        assert_eq!(brand_name("localhost"), "localhost");
    }
}
