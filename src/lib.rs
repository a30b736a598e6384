//! Backlink Sentinel: ownership-verified backlink discovery and link auditing
//!
//! This crate resolves a user-supplied domain to a live origin, proves the
//! requester controls it through a verification meta tag, then discovers
//! inbound links from public search surfaces and audits the site's own
//! internal links.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;
pub mod verify;

use thiserror::Error;

/// Main error type for Backlink Sentinel operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Origin resolution failed for {domain}: {message}")]
    Resolution { domain: String, message: String },

    #[error("Invalid verification transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::VerificationState,
        to: state::VerificationState,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors for malformed caller input (domain or verification token)
///
/// These are fatal: the crawl is rejected before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Domain input is empty")]
    Empty,

    #[error("Failed to parse domain: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Invalid hostname: {0}")]
    InvalidHost(String),

    #[error("Verification token must be at least {min} characters, got {len}")]
    TokenTooShort { len: usize, min: usize },
}

/// Result type alias for Backlink Sentinel operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for input validation
pub type InputResult<T> = std::result::Result<T, InputError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlRequest};
pub use output::{CrawlReport, CrawlResult, ProgressEvent, ProgressSink};
pub use state::{LinkStatus, VerificationState};
pub use url::{classify_source, normalize_domain, NormalizedDomain, SourceClassification};
pub use verify::{VerificationOutcome, VerificationToken, Verdict};
