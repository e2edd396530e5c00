//! News Aggregator
//!
//! Queries every registered [`NewsSource`] for each ticker, one call at a
//! time, and merges the results into a single URL-unique list. A failing
//! source only costs the items of that one call.

use crate::domain::news::NewsItem;
use crate::domain::ports::NewsSource;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

struct RegisteredSource {
    source: Arc<dyn NewsSource>,
    /// Pause after each call to this source.
    pause: Duration,
}

#[derive(Default)]
pub struct NewsAggregator {
    sources: Vec<RegisteredSource>,
}

impl NewsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source. Sources are queried in registration order.
    pub fn with_source(mut self, source: Arc<dyn NewsSource>, pause: Duration) -> Self {
        self.sources.push(RegisteredSource { source, pause });
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Ticker-major traversal: all sources for the first ticker, then the next.
    pub async fn aggregate(&self, tickers: &[String]) -> Vec<NewsItem> {
        let mut collected: Vec<NewsItem> = Vec::new();

        for raw in tickers {
            let ticker = raw.trim().to_uppercase();
            if ticker.is_empty() {
                continue;
            }

            for registered in &self.sources {
                match registered.source.fetch_news(&ticker).await {
                    Ok(items) => {
                        debug!(
                            "NewsAggregator: {} returned {} items for {}",
                            registered.source.name(),
                            items.len(),
                            ticker
                        );
                        collected.extend(items);
                    }
                    Err(e) => {
                        warn!(
                            "NewsAggregator: {} failed for {}: {:#}",
                            registered.source.name(),
                            ticker,
                            e
                        );
                    }
                }

                if !registered.pause.is_zero() {
                    tokio::time::sleep(registered.pause).await;
                }
            }
        }

        let news = dedup_by_url(collected);
        info!(
            "NewsAggregator: Collected {} unique items for {} tickers",
            news.len(),
            tickers.len()
        );
        news
    }
}

/// Drops items without a URL and keeps the first occurrence of each URL.
pub fn dedup_by_url(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter_map(|mut item| {
            let url = item.url.trim();
            if url.is_empty() || !seen.insert(url.to_string()) {
                return None;
            }
            if url.len() != item.url.len() {
                item.url = url.to_string();
            }
            Some(item)
        })
        .collect()
}
