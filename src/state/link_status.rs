use serde::Serialize;
use std::fmt;

/// Health of a link recorded in a crawl report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    /// Backlink source currently returned by a search surface
    Live,

    /// Internal link answered with a 2xx or 3xx status
    Ok,

    /// Internal link failed, timed out, or answered 4xx/5xx
    Broken,
}

impl LinkStatus {
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Ok => "OK",
            Self::Broken => "BROKEN",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
