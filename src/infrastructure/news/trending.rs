use crate::domain::ports::TrendingSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

pub struct YahooTrendingSource {
    client: Client,
    query_base_url: String,
}

impl YahooTrendingSource {
    pub fn new(client: Client, query_base_url: &str) -> Self {
        Self {
            client,
            query_base_url: query_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, region: &str) -> Result<String> {
        let url = format!("{}/v1/finance/trending/{}", self.query_base_url, region);
        self.client
            .get(&url)
            .send()
            .await
            .context("Trending request failed")?
            .error_for_status()
            .context("Trending returned an error status")?
            .text()
            .await
            .context("Failed to read trending body")
    }
}

#[async_trait]
impl TrendingSource for YahooTrendingSource {
    async fn trending_tickers(&self, region: &str, limit: usize) -> Vec<String> {
        match self.fetch(region).await {
            Ok(body) => {
                let symbols = parse_trending(&body, limit);
                if symbols.is_empty() {
                    warn!("YahooTrending: No trending tickers in response for {}", region);
                } else {
                    info!("YahooTrending: Trending tickers ({}): {}", region, symbols.join(", "));
                }
                symbols
            }
            Err(e) => {
                warn!("YahooTrending: Failed to fetch trending tickers: {:#}", e);
                Vec::new()
            }
        }
    }
}

/// Reads `finance.result[0].quotes[].symbol`. Any shape mismatch yields an empty list.
/// A zero limit keeps every symbol.
pub fn parse_trending(body: &str, limit: usize) -> Vec<String> {
    let Ok(data) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    let Some(quotes) = data
        .pointer("/finance/result/0/quotes")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut symbols: Vec<String> = Vec::new();
    for quote in quotes {
        let symbol = quote
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    if limit > 0 {
        symbols.truncate(limit);
    }
    symbols
}
