//! Run Orchestrator
//!
//! Sequences one run: ticker selection, news, indicators, the model
//! summary and persistence. Progress is published through a
//! [`ProgressReporter`] and always ends with a `Done` or `Failed` event.
//!
//! # Ticker selection
//!
//! An explicit list on the [`RunRequest`] wins. Otherwise the tickers of the
//! previous report's signals are reused, then the configured defaults, and
//! trending discovery only when both are empty.

use crate::application::indicator_fetcher::IndicatorFetcher;
use crate::application::news_aggregator::NewsAggregator;
use crate::application::summarizer::Summarizer;
use crate::config::PipelineEnvConfig;
use crate::domain::errors::RunError;
use crate::domain::ports::TrendingSource;
use crate::domain::progress::{ProgressReporter, ProgressStage};
use crate::domain::report::RunReport;
use crate::domain::repositories::ReportRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Caller-supplied options for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub tickers: Option<Vec<String>>,
}

impl RunRequest {
    pub fn with_tickers(tickers: Vec<String>) -> Self {
        Self {
            tickers: Some(tickers),
        }
    }
}

/// Fallback chain inputs for ticker selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSelection {
    pub default_tickers: Vec<String>,
    pub trending_region: String,
    pub trending_limit: usize,
}

impl From<&PipelineEnvConfig> for TickerSelection {
    fn from(config: &PipelineEnvConfig) -> Self {
        Self {
            default_tickers: config.default_tickers.clone(),
            trending_region: config.trending_region.clone(),
            trending_limit: config.trending_limit,
        }
    }
}

pub struct RunOrchestrator {
    aggregator: NewsAggregator,
    indicators: IndicatorFetcher,
    summarizer: Summarizer,
    trending: Arc<dyn TrendingSource>,
    reports: Arc<dyn ReportRepository>,
    selection: TickerSelection,
}

impl RunOrchestrator {
    pub fn new(
        aggregator: NewsAggregator,
        indicators: IndicatorFetcher,
        summarizer: Summarizer,
        trending: Arc<dyn TrendingSource>,
        reports: Arc<dyn ReportRepository>,
        selection: TickerSelection,
    ) -> Self {
        Self {
            aggregator,
            indicators,
            summarizer,
            trending,
            reports,
            selection,
        }
    }

    pub async fn run(
        &self,
        request: RunRequest,
        progress: &ProgressReporter,
    ) -> Result<RunReport, RunError> {
        progress.emit(ProgressStage::Starting, "Starting run…", 1);

        if let Err(e) = self.summarizer.ensure_ready() {
            warn!("RunOrchestrator: Run refused: {}", e);
            progress.emit(ProgressStage::Failed, e.to_string(), 100);
            return Err(e.into());
        }

        progress.emit(ProgressStage::Tickers, "Selecting tickers…", 5);
        let tickers = self.select_tickers(&request).await;
        if tickers.is_empty() {
            warn!("RunOrchestrator: No tickers available, continuing with an empty set");
        }
        info!("RunOrchestrator: Running for tickers {:?}", tickers);

        progress.emit(
            ProgressStage::News,
            format!("Fetching news for {} tickers…", tickers.len()),
            10,
        );
        let news = self.aggregator.aggregate(&tickers).await;
        progress.emit(
            ProgressStage::News,
            format!("Collected {} news items", news.len()),
            40,
        );

        progress.emit(ProgressStage::Indicators, "Fetching market indicators…", 45);
        let indicators = self.indicators.fetch(&tickers).await;
        progress.emit(
            ProgressStage::Indicators,
            format!("Indicators ready for {} tickers", indicators.len()),
            60,
        );

        progress.emit(ProgressStage::Model, "Asking the model for a summary…", 65);
        let summary = self.summarizer.summarize(&news, &indicators).await;
        progress.emit(
            ProgressStage::Model,
            format!("Model returned {} signals", summary.signals.signals.len()),
            90,
        );

        let report = RunReport::new(
            Utc::now(),
            news,
            indicators,
            summary.markdown,
            summary.signals,
        );

        progress.emit(ProgressStage::Persist, "Saving report…", 98);
        if let Err(reason) = self.persist(&report).await {
            error!("RunOrchestrator: {}", reason);
            progress.emit(ProgressStage::Failed, format!("Failed to save report: {}", reason), 100);
            return Err(RunError::Persist { reason });
        }

        info!(
            "RunOrchestrator: Run complete at {} ({} news, {} signals)",
            report.timestamp,
            report.news.len(),
            report.signals.signals.len()
        );
        progress.emit(ProgressStage::Done, "Run completed", 100);
        Ok(report)
    }

    /// Resolves the ticker list for a run.
    pub async fn select_tickers(&self, request: &RunRequest) -> Vec<String> {
        if let Some(explicit) = &request.tickers {
            let tickers = normalize_tickers(explicit);
            if !tickers.is_empty() {
                info!("RunOrchestrator: Using {} requested tickers", tickers.len());
                return tickers;
            }
        }

        let previous = self.load_previous().await;
        if let Some(report) = previous {
            let tickers = report.signals.tickers();
            if !tickers.is_empty() {
                info!("RunOrchestrator: Reusing {} tickers from previous signals", tickers.len());
                return tickers;
            }
        }

        let defaults = normalize_tickers(&self.selection.default_tickers);
        if !defaults.is_empty() {
            return defaults;
        }

        info!(
            "RunOrchestrator: No previous or default tickers, asking trending ({})",
            self.selection.trending_region
        );
        self.trending
            .trending_tickers(&self.selection.trending_region, self.selection.trending_limit)
            .await
    }

    async fn load_previous(&self) -> Option<RunReport> {
        let reports = Arc::clone(&self.reports);
        match tokio::task::spawn_blocking(move || reports.load_latest()).await {
            Ok(report) => report,
            Err(e) => {
                warn!("RunOrchestrator: Loading previous report panicked: {}", e);
                None
            }
        }
    }

    // The blocking task runs to completion even if this future is dropped.
    async fn persist(&self, report: &RunReport) -> Result<(), String> {
        let reports = Arc::clone(&self.reports);
        let snapshot = report.clone();
        match tokio::task::spawn_blocking(move || reports.save(&snapshot)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{:#}", e)),
            Err(e) => Err(e.to_string()),
        }
    }
}

fn normalize_tickers(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ticker in raw.iter().map(|t| t.trim().to_uppercase()) {
        if !ticker.is_empty() && !out.contains(&ticker) {
            out.push(ticker);
        }
    }
    out
}
