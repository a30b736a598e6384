//! URL handling module for Backlink Sentinel
//!
//! This module provides domain normalization, host helpers, host matching for
//! link extraction, and backlink source classification.

mod classify;
mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use classify::{classify_source, SourceClassification, GENERAL_WEB};
pub use domain::{brand_name, extract_domain, is_ip_literal, is_loopback, is_subdomain};
pub use matcher::{is_excluded_host, is_search_engine_host, is_self_reference, EXCLUDED_SEARCH_HOSTS};
pub use normalize::{normalize_domain, NormalizedDomain};
