//! Report sink trait and implementations
//!
//! A report sink is the boundary to whatever persists or delivers crawl
//! results. The crate itself ships a JSON file sink used by the CLI.

use crate::output::CrawlResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receiver of finished crawl results
///
/// Implementations must be thread-safe.
pub trait ReportSink: Send + Sync {
    /// Hands over one finished result
    fn deliver(&self, result: &CrawlResult) -> OutputResult<()>;
}

/// Writes each result as pretty-printed JSON to a file, replacing its contents
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonFileSink {
    fn deliver(&self, result: &CrawlResult) -> OutputResult<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, result)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::info!("Wrote report to {}", self.path.display());
        Ok(())
    }
}

/// Keeps delivered results in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<CrawlResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> OutputResult<Vec<CrawlResult>> {
        self.results
            .lock()
            .map(|results| results.clone())
            .map_err(|e| OutputError::Write(e.to_string()))
    }
}

impl ReportSink for MemorySink {
    fn deliver(&self, result: &CrawlResult) -> OutputResult<()> {
        self.results
            .lock()
            .map_err(|e| OutputError::Write(e.to_string()))?
            .push(result.clone());
        Ok(())
    }
}
