use crate::url::domain::{is_ip_literal, is_loopback};
use crate::InputError;
use std::fmt;
use url::Url;

/// A canonical hostname derived from free-form user input
///
/// Lowercase, no scheme, no path, no leading `www.`. Loopback hosts keep
/// their port (`localhost:8080`); all other hosts drop it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedDomain {
    host: String,
    port: Option<u16>,
    value: String,
}

impl NormalizedDomain {
    /// The canonical form, `host` or `host:port` for loopback hosts
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The hostname without any port
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The preserved port, only ever set for loopback hosts
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn is_loopback(&self) -> bool {
        is_loopback(&self.host)
    }
}

impl fmt::Display for NormalizedDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Normalizes user input into a [`NormalizedDomain`]
///
/// # Normalization Steps
///
/// 1. Trim whitespace; reject empty input
/// 2. Accept an `http`/`https` scheme, reject any other, assume `https` if absent
/// 3. Parse and take the lowercase host, discarding path, query and fragment
/// 4. Validate the host as a hostname or IP literal
/// 5. Strip a leading `www.` unless the host is loopback
/// 6. Keep the port only for loopback hosts, including an explicit default port
///
/// # Examples
///
/// ```
/// use backlink_sentinel::url::normalize_domain;
///
/// let domain = normalize_domain("HTTPS://WWW.Example.com/").unwrap();
/// assert_eq!(domain.as_str(), "example.com");
///
/// let local = normalize_domain("http://localhost:5173/app").unwrap();
/// assert_eq!(local.as_str(), "localhost:5173");
/// ```
pub fn normalize_domain(input: &str) -> Result<NormalizedDomain, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let with_scheme = match explicit_scheme(trimmed) {
        Some(scheme) => {
            let scheme = scheme.to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return Err(InputError::InvalidScheme(scheme));
            }
            trimmed.to_string()
        }
        None => format!("https://{}", trimmed),
    };

    let url = Url::parse(&with_scheme).map_err(|e| InputError::Parse(e.to_string()))?;
    let host = url
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or_else(|| InputError::InvalidHost(trimmed.to_string()))?;

    validate_host(&host)?;

    if is_loopback(&host) {
        let port = url.port().or_else(|| {
            has_explicit_port(&with_scheme)
                .then(|| url.port_or_known_default())
                .flatten()
        });
        let value = match port {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        };
        return Ok(NormalizedDomain { host, port, value });
    }

    let host = match host.strip_prefix("www.") {
        Some(rest) if rest.contains('.') => rest.to_string(),
        _ => host,
    };

    Ok(NormalizedDomain {
        value: host.clone(),
        host,
        port: None,
    })
}

/// Returns true if the authority of `input` names a port, even the scheme's default
///
/// `Url::port` hides default ports, so `https://localhost:443` has to be
/// recognized from the text.
fn has_explicit_port(input: &str) -> bool {
    let rest = input.split_once("://").map_or(input, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    match host_port.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && (!host.contains(':') || host.ends_with(']'))
                && !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Returns the scheme if the input starts with `<scheme>://`
fn explicit_scheme(input: &str) -> Option<&str> {
    let idx = input.find("://")?;
    let candidate = &input[..idx];
    let is_scheme = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.');
    is_scheme.then_some(candidate)
}

/// Validates a lowercase host string
fn validate_host(host: &str) -> Result<(), InputError> {
    if is_loopback(host) || is_ip_literal(host) {
        return Ok(());
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(InputError::InvalidHost(format!(
            "'{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(InputError::InvalidHost(format!(
            "'{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(InputError::InvalidHost(format!(
            "'{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') {
        return Err(InputError::InvalidHost(format!(
            "'{}' must contain at least one dot (e.g., 'example.com')",
            host
        )));
    }

    Ok(())
}
