//! Console statistics for a finished crawl

use crate::output::{CrawlResult, CrawlStats};
use crate::state::LinkStatus;

/// Percentage of internal links that are broken
pub fn broken_rate(stats: &CrawlStats) -> f64 {
    if stats.internal_links == 0 {
        return 0.0;
    }
    (stats.broken_links as f64 / stats.internal_links as f64) * 100.0
}

/// Prints a crawl result to stdout in a formatted manner
pub fn print_statistics(result: &CrawlResult) {
    println!("=== Backlink Sentinel Report ===\n");

    if !result.success {
        println!(
            "Crawl failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    if let Some(verification) = &result.verification {
        println!("Origin: {}", verification.origin);
        println!(
            "Ownership: {} (via {:?} check)",
            if verification.is_verified() {
                "verified"
            } else {
                "NOT verified"
            },
            verification.path
        );
        println!();
    }

    let Some(report) = &result.report else {
        return;
    };

    if !result.is_verified {
        println!("Add the verification meta tag to the landing page and retry.");
        return;
    }

    let stats = &report.summary;
    println!("Overview:");
    println!("  Backlinks found: {}", stats.external_links);
    println!("  Estimated value: ${}", stats.total_estimated_value);
    println!("  Internal links checked: {}", stats.internal_links);
    println!(
        "  Broken internal links: {} ({:.1}%)",
        stats.broken_links,
        broken_rate(stats)
    );
    println!();

    if !stats.by_category.is_empty() {
        println!("Backlinks by Category:");
        let mut categories: Vec<_> = stats.by_category.iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (category, count) in categories {
            println!("  {}: {}", category, count);
        }
        println!();
    }

    let broken: Vec<_> = report
        .internal_links
        .iter()
        .filter(|r| r.status == LinkStatus::Broken)
        .collect();

    if !broken.is_empty() {
        println!("Broken Links ({}):", broken.len());
        for record in broken {
            match record.code.status() {
                Some(code) => println!("  - {} (HTTP {})", record.url, code),
                None => println!("  - {} (timeout)", record.url),
            }
        }
        println!();
    }
}
