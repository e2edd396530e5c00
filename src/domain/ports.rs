use crate::domain::errors::{CredentialError, ModelCallError};
use crate::domain::news::NewsItem;
use anyhow::Result;
use async_trait::async_trait;

/// A single upstream news source queried per ticker.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsItem>>;
}

/// Discovery of currently trending symbols.
#[async_trait]
pub trait TrendingSource: Send + Sync {
    /// Upper-cased, de-duplicated symbols. Empty on any failure.
    async fn trending_tickers(&self, region: &str, limit: usize) -> Vec<String>;
}

/// Raw market data for one ticker, before indicators are derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    /// Daily closes, oldest first. May be empty.
    pub closes: Vec<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub sector: Option<String>,
    pub short_name: Option<String>,
}

#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot>;
}

/// System and user messages for one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPrompt {
    pub system: String,
    pub user: String,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Checked once before a run starts. Offline models are always ready.
    fn ensure_ready(&self) -> Result<(), CredentialError> {
        Ok(())
    }

    /// Returns the raw text content of the first choice.
    async fn complete(&self, prompt: &ModelPrompt) -> Result<String, ModelCallError>;
}
