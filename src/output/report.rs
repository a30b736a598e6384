//! Crawl report types
//!
//! A [`CrawlReport`] is assembled once by the coordinator and never mutated
//! afterwards. [`CrawlResult`] wraps it for the caller, or carries the error
//! message of a failed crawl.

use crate::state::LinkStatus;
use crate::url::classify_source;
use crate::verify::VerificationOutcome;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Status code of an internal link probe, or a marker for no response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeCode {
    Status(u16),
    Timeout,
}

impl ProbeCode {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            Self::Timeout => None,
        }
    }
}

impl Serialize for ProbeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Status(code) => serializer.serialize_u16(*code),
            Self::Timeout => serializer.serialize_str("TIMEOUT"),
        }
    }
}

/// A classified backlink source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklinkRecord {
    pub source_url: String,
    pub category: String,
    pub authority: u8,
    pub estimated_value: u32,
    pub status: LinkStatus,
}

impl BacklinkRecord {
    /// Classifies a discovered source URL
    pub fn classify(source_url: String) -> Self {
        let classification = classify_source(&source_url);

        Self {
            source_url,
            category: classification.label.to_string(),
            authority: classification.authority,
            estimated_value: classification.value,
            status: LinkStatus::Live,
        }
    }
}

/// Result of probing one same-host link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InternalLinkRecord {
    pub url: String,
    pub status: LinkStatus,
    pub code: ProbeCode,
}

impl InternalLinkRecord {
    /// Records a probe answered with `code`; 2xx and 3xx are reachable
    pub fn from_status(url: String, code: u16) -> Self {
        let status = if (200..400).contains(&code) {
            LinkStatus::Ok
        } else {
            LinkStatus::Broken
        };

        Self {
            url,
            status,
            code: ProbeCode::Status(code),
        }
    }

    /// Records a probe that got no response
    pub fn timed_out(url: String) -> Self {
        Self {
            url,
            status: LinkStatus::Broken,
            code: ProbeCode::Timeout,
        }
    }
}

/// Summary counts of a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    pub external_links: usize,
    pub internal_links: usize,
    pub broken_links: usize,
    pub total_estimated_value: u64,

    /// Backlink count per category label
    pub by_category: BTreeMap<String, usize>,
}

impl CrawlStats {
    pub fn from_records(backlinks: &[BacklinkRecord], internal_links: &[InternalLinkRecord]) -> Self {
        let mut by_category = BTreeMap::new();
        for record in backlinks {
            *by_category.entry(record.category.clone()).or_insert(0) += 1;
        }

        Self {
            external_links: backlinks.len(),
            internal_links: internal_links.len(),
            broken_links: internal_links
                .iter()
                .filter(|r| r.status.is_broken())
                .count(),
            total_estimated_value: backlinks
                .iter()
                .map(|r| u64::from(r.estimated_value))
                .sum(),
            by_category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub origin: String,
    pub backlinks: Vec<BacklinkRecord>,
    pub internal_links: Vec<InternalLinkRecord>,
    pub summary: CrawlStats,
}

impl CrawlReport {
    pub fn assemble(
        origin: String,
        backlinks: Vec<BacklinkRecord>,
        internal_links: Vec<InternalLinkRecord>,
    ) -> Self {
        let summary = CrawlStats::from_records(&backlinks, &internal_links);

        Self {
            origin,
            backlinks,
            internal_links,
            summary,
        }
    }

    /// A report for an origin that failed verification
    pub fn unverified(origin: String) -> Self {
        Self::assemble(origin, Vec::new(), Vec::new())
    }
}

/// Final result handed back to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub success: bool,
    pub is_verified: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationOutcome>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CrawlReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CrawlStats>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl CrawlResult {
    /// A crawl that reached a verdict, verified or not
    pub fn completed(verification: VerificationOutcome, report: CrawlReport) -> Self {
        Self {
            success: true,
            is_verified: verification.is_verified(),
            stats: Some(report.summary.clone()),
            verification: Some(verification),
            report: Some(report),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            is_verified: false,
            verification: None,
            report: None,
            stats: None,
            error: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlink_classification() {
        let record = BacklinkRecord::classify("https://github.com/acme/widget".to_string());
        assert_eq!(record.category, "Code Repo");
        assert_eq!(record.authority, 95);
        assert_eq!(record.status, LinkStatus::Live);

        let fallback = BacklinkRecord::classify("https://someblog.net/post".to_string());
        assert_eq!(fallback.category, "General Web");
        assert_eq!(fallback.authority, 40);
        assert_eq!(fallback.estimated_value, 20);
    }

    #[test]
    fn test_internal_link_status() {
        let ok = InternalLinkRecord::from_status("https://example.com/a".into(), 200);
        let moved = InternalLinkRecord::from_status("https://example.com/b".into(), 301);
        let missing = InternalLinkRecord::from_status("https://example.com/c".into(), 404);
        let slow = InternalLinkRecord::timed_out("https://example.com/d".into());

        assert_eq!(ok.status, LinkStatus::Ok);
        assert_eq!(moved.status, LinkStatus::Ok);
        assert_eq!(missing.status, LinkStatus::Broken);
        assert_eq!(slow.status, LinkStatus::Broken);
        assert_eq!(slow.code.status(), None);
    }

    #[test]
    fn test_probe_code_serialization() {
        assert_eq!(serde_json::to_string(&ProbeCode::Status(404)).unwrap(), "404");
        assert_eq!(serde_json::to_string(&ProbeCode::Timeout).unwrap(), "\"TIMEOUT\"");
    }

    #[test]
    fn test_summary_counts() {
        let backlinks = vec![
            BacklinkRecord::classify("https://github.com/acme".into()),
            BacklinkRecord::classify("https://gitlab.com/acme".into()),
            BacklinkRecord::classify("https://someblog.net/post".into()),
        ];
        let internal = vec![
            InternalLinkRecord::from_status("https://example.com/a".into(), 200),
            InternalLinkRecord::from_status("https://example.com/b".into(), 500),
            InternalLinkRecord::timed_out("https://example.com/c".into()),
        ];

        let report = CrawlReport::assemble("https://example.com".into(), backlinks, internal);

        assert_eq!(report.summary.external_links, 3);
        assert_eq!(report.summary.internal_links, 3);
        assert_eq!(report.summary.broken_links, 2);
        assert_eq!(report.summary.total_estimated_value, 500 + 500 + 20);
        assert_eq!(report.summary.by_category.get("Code Repo"), Some(&2));
    }

    #[test]
    fn test_unverified_report_is_empty() {
        let report = CrawlReport::unverified("https://example.com".into());
        assert!(report.backlinks.is_empty());
        assert!(report.internal_links.is_empty());
        assert_eq!(report.summary, CrawlStats::default());
    }

    #[test]
    fn test_failed_result_shape() {
        let result = CrawlResult::failed("boom");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("report").is_none());
        assert!(json.get("timestamp").is_some());
    }
}
