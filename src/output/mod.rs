//! Output module for crawl results and progress reporting
//!
//! This module handles:
//! - Report types (`CrawlReport`, records, `CrawlStats`, `CrawlResult`)
//! - Progress events and the sinks that receive them
//! - Handing finished results to a report sink
//! - Printing console statistics

mod progress;
mod report;
pub mod stats;
mod traits;

pub use progress::{
    CollectingProgress, CrawlStep, FnProgress, NoopProgress, ProgressEvent, ProgressSink,
    VerificationStep,
};
pub use report::{
    BacklinkRecord, CrawlReport, CrawlResult, CrawlStats, InternalLinkRecord, ProbeCode,
};
pub use stats::print_statistics;
pub use traits::{JsonFileSink, MemorySink, OutputError, OutputResult, ReportSink};
