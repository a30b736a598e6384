//! Source classification for discovered backlinks
//!
//! A static, ordered decision table maps a URL to a category label, an
//! authority score and a flat estimated value. Rules are evaluated top to
//! bottom against the lowercased URL and the first rule with any matching
//! fragment wins. Scores are part of the report contract, so editing the
//! table changes report totals.

use serde::Serialize;

/// Classification assigned to a backlink source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceClassification {
    /// Human-readable category
    pub label: &'static str,

    /// Heuristic authority score, 0-100
    pub authority: u8,

    /// Flat estimated value in US dollars
    pub value: u32,
}

impl SourceClassification {
    const fn new(label: &'static str, authority: u8, value: u32) -> Self {
        Self {
            label,
            authority,
            value,
        }
    }
}

/// Classification for URLs no rule matches
pub const GENERAL_WEB: SourceClassification = SourceClassification::new("General Web", 40, 20);

/// A single row of the decision table
struct Rule {
    /// Substrings matched against the lowercased URL; any one matches
    fragments: &'static [&'static str],
    classification: SourceClassification,
}

const RULES: &[Rule] = &[
    // App stores
    Rule {
        fragments: &["play.google.com"],
        classification: SourceClassification::new("Google Play", 99, 2500),
    },
    Rule {
        fragments: &["apps.apple.com"],
        classification: SourceClassification::new("Apple Store", 99, 2500),
    },
    Rule {
        fragments: &["microsoft.com/store"],
        classification: SourceClassification::new("Windows Store", 96, 1500),
    },
    Rule {
        fragments: &["amazon.com/appstore"],
        classification: SourceClassification::new("Amazon Appstore", 94, 1200),
    },
    // Code hosting and cloud
    Rule {
        fragments: &["github.com", "gitlab.com"],
        classification: SourceClassification::new("Code Repo", 95, 500),
    },
    Rule {
        fragments: &["stackoverflow.com"],
        classification: SourceClassification::new("Stack Overflow", 94, 600),
    },
    Rule {
        fragments: &["vercel.app", "netlify.app", "herokuapp.com"],
        classification: SourceClassification::new("Cloud App", 90, 400),
    },
    // Social and local
    Rule {
        fragments: &["facebook.com", "twitter.com", "linkedin.com"],
        classification: SourceClassification::new("Social Media", 90, 50),
    },
    Rule {
        fragments: &["instagram.com", "tiktok.com"],
        classification: SourceClassification::new("Social Media", 88, 40),
    },
    Rule {
        fragments: &["yelp.com", "tripadvisor.com"],
        classification: SourceClassification::new("Local Directory", 70, 300),
    },
    Rule {
        fragments: &["yellowpages.com"],
        classification: SourceClassification::new("Business Directory", 65, 250),
    },
    // News and publishing
    Rule {
        fragments: &["medium.com", "substack.com"],
        classification: SourceClassification::new("Publishing", 85, 400),
    },
    Rule {
        fragments: &["forbes.com", "techcrunch.com"],
        classification: SourceClassification::new("News Media", 92, 800),
    },
    // Regional
    Rule {
        fragments: &[".cn", "baidu.com"],
        classification: SourceClassification::new("China/Asia", 50, 80),
    },
    Rule {
        fragments: &[".ru", "yandex."],
        classification: SourceClassification::new("Russia/EU", 50, 80),
    },
    // Government and education
    Rule {
        fragments: &[".gov"],
        classification: SourceClassification::new("Government", 98, 1000),
    },
    Rule {
        fragments: &[".edu"],
        classification: SourceClassification::new("Education", 92, 800),
    },
    // Forums and communities
    Rule {
        fragments: &["reddit.com"],
        classification: SourceClassification::new("Reddit", 91, 300),
    },
    Rule {
        fragments: &["quora.com"],
        classification: SourceClassification::new("Quora", 85, 250),
    },
];

/// Classifies a backlink source URL
///
/// Total and deterministic: every input gets exactly one classification.
///
/// # Examples
///
/// ```
/// use backlink_sentinel::url::{classify_source, GENERAL_WEB};
///
/// assert_eq!(classify_source("https://github.com/acme/widget").label, "Code Repo");
/// assert_eq!(classify_source("https://someblog.net/post"), GENERAL_WEB);
/// ```
pub fn classify_source(url: &str) -> SourceClassification {
    let lowered = url.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.fragments.iter().any(|f| lowered.contains(f)))
        .map(|rule| rule.classification)
        .unwrap_or(GENERAL_WEB)
}
