use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication time as delivered by the upstream source.
///
/// The RSS feed carries RFC-2822 strings while the search endpoint returns
/// epoch seconds, so both shapes are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishedAt {
    Epoch(i64),
    Text(String),
}

impl Default for PublishedAt {
    fn default() -> Self {
        PublishedAt::Text(String::new())
    }
}

impl fmt::Display for PublishedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishedAt::Epoch(secs) => write!(f, "{}", secs),
            PublishedAt::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub ticker: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub published_at: PublishedAt,
}

impl NewsItem {
    pub fn new(
        ticker: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published_at: PublishedAt,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            title: title.into(),
            url: url.into(),
            source: source.into(),
            published_at,
        }
    }
}

/// Limits applied when news is compacted for the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionBudget {
    pub max_items: usize,
    pub per_ticker: usize,
    /// Upper bound on the compact JSON serialization, in bytes.
    pub max_bytes: usize,
    /// Title length in characters, including the ellipsis.
    pub max_title_chars: usize,
    /// Rebuild the citation list from the items that survive the byte trim.
    pub citations_follow_trim: bool,
}

impl Default for CompactionBudget {
    fn default() -> Self {
        Self {
            max_items: 20,
            per_ticker: 4,
            max_bytes: 8000,
            max_title_chars: 180,
            citations_follow_trim: false,
        }
    }
}
