//! Indicator Fetcher
//!
//! Turns per-ticker market snapshots into [`IndicatorRecord`]s. Every
//! requested ticker gets exactly one entry; a failed fetch is recorded as
//! `fetch_failed` for that ticker alone.

use crate::domain::indicators::{IndicatorMap, IndicatorRecord, IndicatorValues, change_pct};
use crate::domain::ports::{MarketDataService, MarketSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct IndicatorFetcher {
    market: Arc<dyn MarketDataService>,
    pause: Duration,
}

impl IndicatorFetcher {
    pub fn new(market: Arc<dyn MarketDataService>, pause: Duration) -> Self {
        Self { market, pause }
    }

    pub async fn fetch(&self, tickers: &[String]) -> IndicatorMap {
        let mut indicators = IndicatorMap::new();

        for raw in tickers {
            let ticker = raw.trim().to_uppercase();
            if ticker.is_empty() || indicators.contains_key(&ticker) {
                continue;
            }

            let record = match self.market.snapshot(&ticker).await {
                Ok(snapshot) => indicators_from_snapshot(&ticker, &snapshot),
                Err(e) => {
                    warn!("IndicatorFetcher: Market data for {} failed: {:#}", ticker, e);
                    IndicatorRecord::failed()
                }
            };
            indicators.insert(ticker, record);

            if !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        let failed = indicators.values().filter(|r| r.is_failed()).count();
        info!(
            "IndicatorFetcher: Indicators ready for {} tickers ({} failed)",
            indicators.len(),
            failed
        );
        indicators
    }
}

/// Derives the daily record from a snapshot. An empty close series is not an error.
pub fn indicators_from_snapshot(ticker: &str, snapshot: &MarketSnapshot) -> IndicatorRecord {
    let closes = &snapshot.closes;
    let price = closes.last().copied();
    let prev_close = closes.len().checked_sub(2).map(|i| closes[i]);

    let short_name = snapshot
        .short_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ticker)
        .to_string();

    IndicatorRecord::Ok(IndicatorValues {
        price,
        prev_close,
        change_pct: change_pct(price, prev_close),
        market_cap: snapshot.market_cap,
        pe_ratio: snapshot.pe_ratio,
        sector: snapshot.sector.clone(),
        short_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use async_trait::async_trait;

    struct FixedMarket;

    #[async_trait]
    impl MarketDataService for FixedMarket {
        async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot> {
            match ticker {
                "AAPL" => Ok(MarketSnapshot {
                    closes: vec![95.0, 100.0, 110.0],
                    market_cap: Some(3.0e12),
                    pe_ratio: Some(31.5),
                    sector: Some("Technology".to_string()),
                    short_name: Some("Apple Inc.".to_string()),
                }),
                "EMPTY" => Ok(MarketSnapshot::default()),
                _ => bail!("HTTP 404 for {}", ticker),
            }
        }
    }

    fn values(record: &IndicatorRecord) -> &IndicatorValues {
        record.values().expect("record should carry values")
    }

    #[test]
    fn test_snapshot_with_two_closes() {
        let snapshot = MarketSnapshot {
            closes: vec![100.0, 110.0],
            ..MarketSnapshot::default()
        };
        let record = indicators_from_snapshot("MSFT", &snapshot);
        let v = values(&record);
        assert_eq!(v.price, Some(110.0));
        assert_eq!(v.prev_close, Some(100.0));
        assert_eq!(v.change_pct, Some(10.0));
        assert_eq!(v.short_name, "MSFT");
    }

    #[test]
    fn test_single_close_has_no_change() {
        let snapshot = MarketSnapshot {
            closes: vec![42.0],
            short_name: Some("  ".to_string()),
            ..MarketSnapshot::default()
        };
        let record = indicators_from_snapshot("TSLA", &snapshot);
        let v = values(&record);
        assert_eq!(v.price, Some(42.0));
        assert_eq!(v.prev_close, None);
        assert_eq!(v.change_pct, None);
        assert_eq!(v.short_name, "TSLA");
    }

    #[tokio::test]
    async fn test_fetch_records_every_ticker() {
        let fetcher = IndicatorFetcher::new(Arc::new(FixedMarket), Duration::ZERO);
        let tickers = vec![
            "aapl".to_string(),
            "EMPTY".to_string(),
            "NOPE".to_string(),
            "AAPL".to_string(),
        ];

        let indicators = fetcher.fetch(&tickers).await;

        assert_eq!(indicators.len(), 3);
        let aapl = values(&indicators["AAPL"]);
        assert_eq!(aapl.short_name, "Apple Inc.");
        assert_eq!(aapl.change_pct, Some(10.0));
        assert_eq!(aapl.sector.as_deref(), Some("Technology"));

        let empty = &indicators["EMPTY"];
        assert!(!empty.is_failed());
        assert!(!empty.has_values());

        assert_eq!(indicators["NOPE"], IndicatorRecord::failed());
    }
}
