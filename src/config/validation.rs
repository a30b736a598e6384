use crate::config::types::{
    AuditConfig, Config, DiscoveryConfig, ExecutorConfig, HttpConfig, ResolverConfig,
    UserAgentConfig, VerifierConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_executor_config(&config.executor)?;
    validate_resolver_config(&config.resolver)?;
    validate_verifier_config(&config.verifier)?;
    validate_discovery_config(&config.discovery)?;
    validate_audit_config(&config.audit)?;
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    require_positive("http.request_timeout_secs", config.request_timeout_secs)
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_executor_config(config: &ExecutorConfig) -> Result<(), ConfigError> {
    validate_concurrency("executor.concurrency", config.concurrency)?;

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "executor.max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

fn validate_resolver_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    require_positive("resolver.probe_timeout_secs", config.probe_timeout_secs)
}

fn validate_verifier_config(config: &VerifierConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.browserless_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid browserless_url: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "browserless_url must use http or https, got '{}'",
            config.browserless_url
        )));
    }

    require_positive("verifier.render_timeout_secs", config.render_timeout_secs)?;
    require_positive(
        "verifier.fallback_timeout_secs",
        config.fallback_timeout_secs,
    )?;

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_backlinks < 1 {
        return Err(ConfigError::Validation(
            "discovery.max_backlinks must be >= 1".to_string(),
        ));
    }

    for surface in &config.surfaces {
        if surface.name.is_empty() {
            return Err(ConfigError::Validation(
                "search surface name cannot be empty".to_string(),
            ));
        }

        if !surface.url.contains("{query}") {
            return Err(ConfigError::Validation(format!(
                "search surface '{}' url must contain a {{query}} placeholder",
                surface.name
            )));
        }

        Url::parse(&surface.url.replace("{query}", "probe")).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid url for search surface '{}': {}",
                surface.name, e
            ))
        })?;
    }

    Ok(())
}

fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    validate_concurrency("audit.concurrency", config.concurrency)?;
    require_positive("audit.probe_timeout_secs", config.probe_timeout_secs)?;

    if config.max_internal_links < 1 {
        return Err(ConfigError::Validation(
            "audit.max_internal_links must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_concurrency(field: &str, value: usize) -> Result<(), ConfigError> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and 100, got {}",
            field, value
        )));
    }
    Ok(())
}

fn require_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!("{} must be > 0", field)));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
