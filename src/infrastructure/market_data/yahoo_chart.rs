use crate::domain::ports::{MarketDataService, MarketSnapshot};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Descriptive fields from the quote summary endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSummary {
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub sector: Option<String>,
    pub short_name: Option<String>,
}

/// Daily closes from the chart endpoint plus a best-effort quote summary.
pub struct YahooChartMarketDataService {
    client: Client,
    query_base_url: String,
}

impl YahooChartMarketDataService {
    pub fn new(client: Client, query_base_url: &str) -> Self {
        Self {
            client,
            query_base_url: query_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chart(&self, ticker: &str) -> Result<MarketSnapshot> {
        let url = format!("{}/v8/finance/chart/{}", self.query_base_url, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await
            .context("Failed to fetch chart from Yahoo")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "YahooChartMarketDataService: API error {} for {}: {}",
                status, ticker, error_text
            );
            bail!("Yahoo chart error ({})", status);
        }

        let body = response.text().await.context("Failed to read chart body")?;
        parse_chart(&body)
    }

    async fn fetch_summary(&self, ticker: &str) -> Result<QuoteSummary> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.query_base_url, ticker);
        let body = self
            .client
            .get(&url)
            .query(&[("modules", SUMMARY_MODULES)])
            .send()
            .await
            .context("Failed to fetch quote summary")?
            .error_for_status()
            .context("Quote summary returned an error status")?
            .text()
            .await
            .context("Failed to read quote summary body")?;
        parse_quote_summary(&body)
    }
}

#[async_trait]
impl MarketDataService for YahooChartMarketDataService {
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot> {
        let mut snapshot = self.fetch_chart(ticker).await?;

        match self.fetch_summary(ticker).await {
            Ok(summary) => {
                snapshot.market_cap = summary.market_cap;
                snapshot.pe_ratio = summary.pe_ratio;
                snapshot.sector = summary.sector;
                if summary.short_name.is_some() {
                    snapshot.short_name = summary.short_name;
                }
            }
            // Descriptive fields are optional
            Err(e) => debug!("YahooChartMarketDataService: No quote summary for {}: {:#}", ticker, e),
        }

        debug!(
            "YahooChartMarketDataService: {} closes for {}",
            snapshot.closes.len(),
            ticker
        );
        Ok(snapshot)
    }
}

/// Close series (nulls skipped) and display name. An empty series is not an error;
/// a missing result is.
pub fn parse_chart(body: &str) -> Result<MarketSnapshot> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("Failed to parse chart response")?;

    let Some(result) = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        match envelope.chart.error {
            Some(err) if !err.is_null() => bail!("Chart error: {}", err),
            _ => bail!("Chart response has no result"),
        }
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close.into_iter().flatten().collect())
        .unwrap_or_default();

    Ok(MarketSnapshot {
        closes,
        short_name: result.meta.short_name.or(result.meta.long_name),
        ..MarketSnapshot::default()
    })
}

/// Trailing P/E is preferred over forward P/E.
pub fn parse_quote_summary(body: &str) -> Result<QuoteSummary> {
    let data: Value = serde_json::from_str(body).context("Failed to parse quote summary")?;
    let result = data
        .pointer("/quoteSummary/result/0")
        .context("Quote summary has no result")?;

    let raw = |path: &str| result.pointer(path).and_then(Value::as_f64);
    let text = |path: &str| {
        result
            .pointer(path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(QuoteSummary {
        market_cap: raw("/price/marketCap/raw").or_else(|| raw("/summaryDetail/marketCap/raw")),
        pe_ratio: raw("/summaryDetail/trailingPE/raw").or_else(|| raw("/summaryDetail/forwardPE/raw")),
        sector: text("/assetProfile/sector"),
        short_name: text("/price/shortName"),
    })
}
