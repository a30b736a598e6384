//! Progress events and sinks
//!
//! The crawl emits `(stage, payload)` events as it goes. Delivery is
//! fire-and-forget: a sink must not block, and a dropped receiver is ignored.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Steps within the `verification` stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStep {
    Launching,
    Fetching,
    Fallback,
    Success,
    Failed,
    Error,
}

/// Steps within the `crawl` stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStep {
    Backlinks,
    Processing,
    Internal,
}

/// A single progress emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// An origin was chosen for the normalized domain
    Resolve { domain: String, origin: String, probed: bool },

    Verification { step: VerificationStep, message: String },

    Crawl { step: CrawlStep },

    /// Backlink discovery finished with this many records
    Backlinks { count: usize },

    /// Internal audit finished with this many records
    Internal { count: usize },

    Complete { verified: bool },

    Error { message: String },
}

impl ProgressEvent {
    pub fn verification(step: VerificationStep, message: impl Into<String>) -> Self {
        Self::Verification {
            step,
            message: message.into(),
        }
    }

    /// The stage name carried in the serialized payload
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolve",
            Self::Verification { .. } => "verification",
            Self::Crawl { .. } => "crawl",
            Self::Backlinks { .. } => "backlinks",
            Self::Internal { .. } => "internal",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve { domain, origin, probed } => {
                if *probed {
                    write!(f, "[resolve] {} -> {}", domain, origin)
                } else {
                    write!(f, "[resolve] {} -> {} (unprobed fallback)", domain, origin)
                }
            }
            Self::Verification { step, message } => {
                write!(f, "[verification:{:?}] {}", step, message)
            }
            Self::Crawl { step } => write!(f, "[crawl] {:?}", step),
            Self::Backlinks { count } => write!(f, "[backlinks] {} found", count),
            Self::Internal { count } => write!(f, "[internal] {} checked", count),
            Self::Complete { verified } => write!(f, "[complete] verified={}", verified),
            Self::Error { message } => write!(f, "[error] {}", message),
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        if self.send(event).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}

/// Adapts a callback into a sink
pub struct FnProgress<F>(pub F);

impl<F> ProgressSink for FnProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        (self.0)(event)
    }
}

/// Records every event in memory
#[derive(Debug, Default)]
pub struct CollectingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Stage names in emission order
    pub fn stages(&self) -> Vec<&'static str> {
        self.events().iter().map(ProgressEvent::stage).collect()
    }
}

impl ProgressSink for CollectingProgress {
    fn emit(&self, event: ProgressEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
