//! Pipeline configuration parsing from environment variables.
//!
//! Ticker selection, compaction budgets, upstream pacing and the data directory.

use super::{lookup_parse, lookup_string};
use crate::domain::news::CompactionBudget;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TICKERS: &str = "AAPL,MSFT,GOOGL,AMZN,TSLA,SPY";

/// Pipeline environment configuration
#[derive(Debug, Clone)]
pub struct PipelineEnvConfig {
    pub default_tickers: Vec<String>,
    pub trending_region: String,
    pub trending_limit: usize,
    pub data_dir: PathBuf,
    pub compaction: CompactionBudget,
    /// Items taken from each upstream news call.
    pub per_source_limit: usize,
    /// Pause after each per-ticker feed call.
    pub feed_pause: Duration,
    /// Pause after each per-ticker search call.
    pub search_pause: Duration,
    /// Pause after each per-ticker market data call.
    pub market_pause: Duration,
}

impl Default for PipelineEnvConfig {
    fn default() -> Self {
        Self {
            default_tickers: parse_tickers(DEFAULT_TICKERS),
            trending_region: "US".to_string(),
            trending_limit: 6,
            data_dir: PathBuf::from("data"),
            compaction: CompactionBudget::default(),
            per_source_limit: 5,
            feed_pause: Duration::from_millis(300),
            search_pause: Duration::from_millis(200),
            market_pause: Duration::from_millis(200),
        }
    }
}

impl PipelineEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let budget = defaults.compaction;

        // A single REQUEST_PAUSE_MS overrides every pause
        let (feed_pause, search_pause, market_pause) = match lookup("REQUEST_PAUSE_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            Some(ms) => {
                let pause = Duration::from_millis(ms);
                (pause, pause, pause)
            }
            None => (defaults.feed_pause, defaults.search_pause, defaults.market_pause),
        };

        Self {
            default_tickers: parse_tickers(&lookup_string(lookup, "DEFAULT_TICKERS", DEFAULT_TICKERS)),
            trending_region: lookup_string(lookup, "TRENDING_REGION", &defaults.trending_region),
            trending_limit: lookup_parse(lookup, "TRENDING_LIMIT", defaults.trending_limit),
            data_dir: lookup("DATA_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            compaction: CompactionBudget {
                max_items: lookup_parse(lookup, "NEWS_MAX_ITEMS", budget.max_items),
                per_ticker: lookup_parse(lookup, "NEWS_PER_TICKER", budget.per_ticker),
                max_bytes: lookup_parse(lookup, "NEWS_MAX_BYTES", budget.max_bytes),
                max_title_chars: budget.max_title_chars,
                citations_follow_trim: lookup_parse(
                    lookup,
                    "NEWS_CITATIONS_FOLLOW_TRIM",
                    budget.citations_follow_trim,
                ),
            },
            per_source_limit: lookup_parse(lookup, "NEWS_PER_SOURCE_LIMIT", defaults.per_source_limit),
            feed_pause,
            search_pause,
            market_pause,
        }
    }
}

/// Splits a comma-separated ticker list, upper-casing and dropping blanks and repeats.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let ticker = part.trim().to_uppercase();
        if !ticker.is_empty() && !out.contains(&ticker) {
            out.push(ticker);
        }
    }
    out
}
