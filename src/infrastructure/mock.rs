//! Offline adapters used by `MODE=mock` and by tests.
//!
//! Everything here is deterministic: the same ticker always yields the same
//! headlines, closes and model reply.

use crate::domain::errors::{CredentialError, ModelCallError};
use crate::domain::news::{NewsItem, PublishedAt};
use crate::domain::ports::{
    LanguageModel, MarketDataService, MarketSnapshot, ModelPrompt, NewsSource, TrendingSource,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

const MOCK_EPOCH: i64 = 1_700_000_000;

fn ticker_seed(ticker: &str) -> u64 {
    ticker.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

#[derive(Clone)]
pub struct MockNewsSource {
    name: String,
    per_ticker: usize,
    fail_for: HashSet<String>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockNewsSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            per_ticker: 2,
            fail_for: HashSet::new(),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_per_ticker(mut self, per_ticker: usize) -> Self {
        self.per_ticker = per_ticker;
        self
    }

    pub fn failing_for(mut self, ticker: &str) -> Self {
        self.fail_for.insert(ticker.to_uppercase());
        self
    }

    /// Tickers requested so far, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        self.calls.write().await.push(ticker.to_string());
        if self.fail_for.contains(ticker) {
            bail!("MockNewsSource {}: simulated outage for {}", self.name, ticker);
        }

        let slug = self.name.to_lowercase();
        Ok((0..self.per_ticker)
            .map(|n| {
                NewsItem::new(
                    ticker,
                    format!("{} headline {} via {}", ticker, n + 1, self.name),
                    format!(
                        "https://example.com/mock/{}/{}/{}",
                        slug,
                        ticker.to_lowercase(),
                        n + 1
                    ),
                    format!("Mock {}", self.name),
                    PublishedAt::Epoch(MOCK_EPOCH + n as i64),
                )
            })
            .collect())
    }
}

pub struct MockTrendingSource {
    symbols: Vec<String>,
}

impl MockTrendingSource {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }
}

#[async_trait]
impl TrendingSource for MockTrendingSource {
    async fn trending_tickers(&self, _region: &str, limit: usize) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for symbol in self.symbols.iter().map(|s| s.trim().to_uppercase()) {
            if !symbol.is_empty() && !out.contains(&symbol) {
                out.push(symbol);
            }
        }
        if limit > 0 {
            out.truncate(limit);
        }
        out
    }
}

#[derive(Clone, Default)]
pub struct MockMarketDataService {
    fail_for: HashSet<String>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, ticker: &str) -> Self {
        self.fail_for.insert(ticker.to_uppercase());
        self
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot> {
        if self.fail_for.contains(ticker) {
            bail!("MockMarketDataService: simulated failure for {}", ticker);
        }

        let seed = ticker_seed(ticker);
        let base = 50.0 + (seed % 400) as f64;
        let drift = ((seed % 7) as f64 - 3.0) / 100.0;
        let closes = (0..5)
            .map(|day| ((base * (1.0 + drift * day as f64)) * 100.0).round() / 100.0)
            .collect();

        Ok(MarketSnapshot {
            closes,
            market_cap: Some(base * 1.0e9),
            pe_ratio: Some(10.0 + (seed % 30) as f64),
            sector: Some("Technology".to_string()),
            short_name: Some(format!("{} Mock Corp", ticker)),
        })
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Demo,
    Fixed(String),
    Fails { status: u16, body: String },
}

/// Records every prompt it receives.
#[derive(Clone)]
pub struct MockLanguageModel {
    reply: MockReply,
    has_key: bool,
    prompts: Arc<RwLock<Vec<ModelPrompt>>>,
}

impl MockLanguageModel {
    /// Answers with a well-formed report and one signal per target ticker.
    pub fn demo() -> Self {
        Self::with(MockReply::Demo)
    }

    pub fn with_reply(text: impl Into<String>) -> Self {
        Self::with(MockReply::Fixed(text.into()))
    }

    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self::with(MockReply::Fails {
            status,
            body: body.into(),
        })
    }

    /// Refuses to start a run, as a live client without a key would.
    pub fn without_key(mut self) -> Self {
        self.has_key = false;
        self
    }

    pub async fn prompts(&self) -> Vec<ModelPrompt> {
        self.prompts.read().await.clone()
    }

    fn with(reply: MockReply) -> Self {
        Self {
            reply,
            has_key: true,
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn ensure_ready(&self) -> Result<(), CredentialError> {
        if self.has_key {
            Ok(())
        } else {
            Err(CredentialError::Missing)
        }
    }

    async fn complete(&self, prompt: &ModelPrompt) -> Result<String, ModelCallError> {
        self.prompts.write().await.push(prompt.clone());
        match &self.reply {
            MockReply::Demo => {
                let reply = demo_reply(prompt);
                info!("MockLanguageModel: Returning demo reply ({} chars)", reply.len());
                Ok(reply)
            }
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Fails { status, body } => Err(ModelCallError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// Reads the target ticker line back out of the prompt.
fn prompt_tickers(prompt: &ModelPrompt) -> Vec<String> {
    prompt
        .user
        .lines()
        .find_map(|line| line.trim().strip_prefix("- Target tickers:"))
        .map(|rest| {
            rest.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn demo_reply(prompt: &ModelPrompt) -> String {
    let tickers = prompt_tickers(prompt);

    let mut markdown = String::from(
        "## Daily Brief\nMock session: equities drifted while investors digested the latest company headlines [1].\n\n## Per-ticker Insights\n",
    );
    for ticker in &tickers {
        markdown.push_str(&format!("- **{}**: covered by mock headlines only [1].\n", ticker));
    }
    markdown.push_str("\n## Sources\n1. https://example.com/mock\n");

    let signals: Vec<_> = tickers
        .iter()
        .map(|ticker| {
            let action = if ticker_seed(ticker) % 2 == 0 { "Buy" } else { "Sell" };
            json!({
                "ticker": ticker,
                "name": format!("{} Mock Corp", ticker),
                "action": action,
                "reason": "Deterministic mock signal based on the supplied headlines [1]."
            })
        })
        .collect();

    format!(
        "{}\n-->Json:\n{}",
        markdown,
        json!({ "signals": signals })
    )
}
