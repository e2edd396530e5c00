//! News Compactor
//!
//! Bounds aggregated news to what fits in a prompt. Earlier items (in
//! aggregation order) always win; nothing here judges relevance.
//!
//! The citation list is built from every accepted item before the byte
//! trim runs, so a citation number can point at an item that was trimmed
//! away. [`CompactionBudget::citations_follow_trim`] rebuilds it from the
//! surviving items instead.

use crate::domain::news::{CompactionBudget, NewsItem, PublishedAt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const ELLIPSIS: &str = "...";

/// The five fields of a news item that reach the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactNewsItem {
    pub ticker: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: PublishedAt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactNews {
    pub items: Vec<CompactNewsItem>,
    /// Unique URLs; position + 1 is the citation number.
    pub citations: Vec<String>,
}

impl CompactNews {
    pub fn serialized_len(&self) -> usize {
        serialized_len(&self.items)
    }
}

pub struct NewsCompactor {
    budget: CompactionBudget,
}

impl NewsCompactor {
    pub fn new(budget: CompactionBudget) -> Self {
        Self { budget }
    }

    pub fn compact(&self, news: &[NewsItem]) -> CompactNews {
        if news.is_empty() || self.budget.max_items == 0 {
            return CompactNews::default();
        }

        let mut per_ticker: HashMap<String, usize> = HashMap::new();
        let mut items: Vec<CompactNewsItem> = Vec::new();
        let mut urls: Vec<String> = Vec::new();

        for item in news {
            let ticker = item.ticker.trim().to_uppercase();
            let count = per_ticker.entry(ticker.clone()).or_insert(0);
            if *count >= self.budget.per_ticker {
                continue;
            }

            let url = item.url.trim().to_string();
            if !url.is_empty() {
                urls.push(url.clone());
            }
            items.push(CompactNewsItem {
                ticker,
                title: truncate_title(item.title.trim(), self.budget.max_title_chars),
                url,
                source: item.source.clone(),
                published_at: item.published_at.clone(),
            });
            *count += 1;

            if items.len() >= self.budget.max_items {
                break;
            }
        }

        let accepted = items.len();
        while !items.is_empty() && serialized_len(&items) > self.budget.max_bytes {
            items.pop();
        }
        if items.len() < accepted {
            debug!(
                "NewsCompactor: Trimmed {} items to fit {} bytes",
                accepted - items.len(),
                self.budget.max_bytes
            );
        }

        if self.budget.citations_follow_trim {
            urls = items
                .iter()
                .filter(|i| !i.url.is_empty())
                .map(|i| i.url.clone())
                .collect();
        }

        CompactNews {
            items,
            citations: dedup_preserving_order(urls),
        }
    }
}

fn serialized_len(items: &[CompactNewsItem]) -> usize {
    serde_json::to_vec(items).map_or(0, |bytes| bytes.len())
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = title.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|u| seen.insert(u.clone()))
        .collect()
}
