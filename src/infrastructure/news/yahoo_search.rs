use crate::domain::news::{NewsItem, PublishedAt};
use crate::domain::ports::NewsSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Option<Vec<SearchNews>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    title: Option<String>,
    link: Option<String>,
    publisher: Option<String>,
    provider_publish_time: Option<i64>,
}

/// Yahoo Finance search endpoint, used for broader per-ticker coverage.
pub struct YahooSearchNewsSource {
    client: Client,
    query_base_url: String,
    limit: usize,
}

impl YahooSearchNewsSource {
    pub fn new(client: Client, query_base_url: &str, limit: usize) -> Self {
        Self {
            client,
            query_base_url: query_base_url.trim_end_matches('/').to_string(),
            limit,
        }
    }
}

#[async_trait]
impl NewsSource for YahooSearchNewsSource {
    fn name(&self) -> &str {
        "YahooSearch"
    }

    async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        let url = format!("{}/v1/finance/search", self.query_base_url);
        let news_count = self.limit.to_string();
        let body = self
            .client
            .get(&url)
            .query(&[("q", ticker), ("newsCount", news_count.as_str())])
            .send()
            .await
            .context("Search request failed")?
            .error_for_status()
            .context("Search returned an error status")?
            .text()
            .await
            .context("Failed to read search body")?;

        let items = parse_search(ticker, &body, self.limit)?;
        debug!("YahooSearch: {} items for {}", items.len(), ticker);
        Ok(items)
    }
}

/// Maps at most `limit` entries of `news[]`. Missing fields become empty;
/// entries without a link are dropped later by URL de-duplication.
pub fn parse_search(ticker: &str, body: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let response: SearchResponse =
        serde_json::from_str(body).context("Failed to parse search JSON")?;

    Ok(response
        .news
        .unwrap_or_default()
        .into_iter()
        .take(limit)
        .map(|n| {
            NewsItem::new(
                ticker,
                n.title.unwrap_or_default().trim(),
                n.link.unwrap_or_default().trim(),
                n.publisher.unwrap_or_default(),
                n.provider_publish_time
                    .map(PublishedAt::Epoch)
                    .unwrap_or_default(),
            )
        })
        .collect())
}
