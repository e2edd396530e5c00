use crate::domain::news::{NewsItem, PublishedAt};
use crate::domain::ports::NewsSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rss::Channel;
use std::io::Cursor;
use tracing::debug;
use url::Url;

pub const RSS_SOURCE_LABEL: &str = "Yahoo Finance RSS";

/// Per-ticker headline feed.
pub struct YahooRssNewsSource {
    client: Client,
    base_url: String,
    limit: usize,
}

impl YahooRssNewsSource {
    pub fn new(client: Client, base_url: &str, limit: usize) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            limit,
        }
    }

    pub fn feed_url(&self, ticker: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.base_url,
            &[("s", ticker), ("region", "US"), ("lang", "en-US")],
        )
        .with_context(|| format!("Invalid RSS base URL: {}", self.base_url))
    }
}

#[async_trait]
impl NewsSource for YahooRssNewsSource {
    fn name(&self) -> &str {
        "YahooRss"
    }

    async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        let url = self.feed_url(ticker)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("RSS request failed")?
            .error_for_status()
            .context("RSS feed returned an error status")?;
        let bytes = response.bytes().await.context("Failed to read RSS body")?;

        let items = parse_feed(ticker, &bytes, self.limit)?;
        debug!("YahooRss: {} items for {}", items.len(), ticker);
        Ok(items)
    }
}

/// Takes the first `limit` entries of the feed and keeps those with both a
/// title and a link. A missing pubDate becomes an empty string.
pub fn parse_feed(ticker: &str, body: &[u8], limit: usize) -> Result<Vec<NewsItem>> {
    let channel = Channel::read_from(Cursor::new(body)).context("Malformed RSS feed")?;

    let items = channel
        .items()
        .iter()
        .take(limit)
        .filter_map(|entry| {
            let title = entry.title().map(str::trim).filter(|t| !t.is_empty())?;
            let link = entry.link().map(str::trim).filter(|l| !l.is_empty())?;
            Some(NewsItem::new(
                ticker,
                title,
                link,
                RSS_SOURCE_LABEL,
                PublishedAt::Text(entry.pub_date().unwrap_or_default().to_string()),
            ))
        })
        .collect();
    Ok(items)
}
