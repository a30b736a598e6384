//! Configuration module for Backlink Sentinel
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every field has a default, so a partial file only overrides what it names.
//!
//! # Example
//!
//! ```no_run
//! use backlink_sentinel::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sentinel.toml")).unwrap();
//! println!("Executor concurrency: {}", config.executor.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_surfaces, AuditConfig, Config, DiscoveryConfig, ExecutorConfig, HttpConfig,
    QueryKind, ResolverConfig, SearchSurface, UserAgentConfig, VerifierConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, content_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
