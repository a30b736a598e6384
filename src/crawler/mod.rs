//! Crawler module for origin resolution, discovery and auditing
//!
//! This module contains the network-facing pipeline, including:
//! - The retry/throttle executor used for every fan-out
//! - HTTP fetching and error classification
//! - Origin resolution
//! - HTML link extraction and verification tag matching
//! - Backlink discovery and the internal link audit
//! - Overall crawl coordination

pub mod audit;
mod coordinator;
pub mod discovery;
pub mod executor;
pub mod fetcher;
pub mod parser;
pub mod resolver;

pub use audit::InternalAuditor;
pub use coordinator::{Coordinator, CrawlPlan, CrawlRequest};
pub use discovery::DiscoveryEngine;
pub use executor::{Executor, RetryPolicy, TaskOutcome};
pub use fetcher::{build_http_client, FetchError, HttpClients};
pub use parser::{extract_external_links, extract_internal_links, token_matches};
pub use resolver::{candidate_variants, OriginResolver, ResolvedOrigin};
