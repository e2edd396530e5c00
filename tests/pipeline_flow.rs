use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};
use tradepulse::application::indicator_fetcher::IndicatorFetcher;
use tradepulse::application::news_aggregator::NewsAggregator;
use tradepulse::application::news_compactor::NewsCompactor;
use tradepulse::application::orchestrator::{RunOrchestrator, RunRequest, TickerSelection};
use tradepulse::application::summarizer::Summarizer;
use tradepulse::domain::errors::{CredentialError, RunError};
use tradepulse::domain::indicators::IndicatorRecord;
use tradepulse::domain::news::CompactionBudget;
use tradepulse::domain::progress::{ProgressEvent, ProgressReporter, ProgressStage};
use tradepulse::domain::repositories::ReportRepository;
use tradepulse::domain::signals::SignalAction;
use tradepulse::infrastructure::InMemoryReportRepository;
use tradepulse::infrastructure::mock::{
    MockLanguageModel, MockMarketDataService, MockNewsSource, MockTrendingSource,
};
use tradepulse::infrastructure::persistence::ReportStore;

struct Harness {
    feed: MockNewsSource,
    search: MockNewsSource,
    model: MockLanguageModel,
    market: MockMarketDataService,
}

impl Harness {
    fn new() -> Self {
        Self {
            feed: MockNewsSource::new("Feed"),
            search: MockNewsSource::new("Search"),
            model: MockLanguageModel::demo(),
            market: MockMarketDataService::new(),
        }
    }

    fn orchestrator(&self, reports: Arc<dyn ReportRepository>, defaults: &[&str]) -> RunOrchestrator {
        RunOrchestrator::new(
            NewsAggregator::new()
                .with_source(Arc::new(self.feed.clone()), Duration::ZERO)
                .with_source(Arc::new(self.search.clone()), Duration::ZERO),
            IndicatorFetcher::new(Arc::new(self.market.clone()), Duration::ZERO),
            Summarizer::new(
                Arc::new(self.model.clone()),
                NewsCompactor::new(CompactionBudget::default()),
            ),
            Arc::new(MockTrendingSource::new(vec!["GME".to_string()])),
            reports,
            TickerSelection {
                default_tickers: defaults.iter().map(|t| t.to_string()).collect(),
                trending_region: "US".to_string(),
                trending_limit: 6,
            },
        )
    }
}

async fn run_collecting(
    orchestrator: &RunOrchestrator,
    request: RunRequest,
) -> (Result<tradepulse::domain::report::RunReport, RunError>, Vec<ProgressEvent>) {
    let (reporter, mut rx) = ProgressReporter::channel();
    let outcome = orchestrator.run(request, &reporter).await;
    drop(reporter);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (outcome, events)
}

#[tokio::test]
async fn test_full_run_persists_report() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ReportStore::new(dir.path()));
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(store.clone(), &["AAPL", "MSFT"]);

    let (outcome, events) = run_collecting(&orchestrator, RunRequest::default()).await;
    let report = assert_ok!(outcome);

    // Two sources x two items x two tickers, all distinct URLs
    assert_eq!(report.news.len(), 8);
    assert_eq!(report.news[0].ticker, "AAPL");
    assert_eq!(report.news[0].source, "Mock Feed");
    assert_eq!(report.news[2].source, "Mock Search");
    assert_eq!(report.indicators.len(), 2);
    assert!(report.indicators["AAPL"].has_values());
    assert_eq!(report.signals.tickers(), vec!["AAPL", "MSFT"]);
    assert!(report.markdown.starts_with("## Daily Brief"));
    assert!(report.timestamp.ends_with('Z'));

    let persisted = store.load().unwrap().unwrap();
    assert_eq!(persisted, report);
    let mirror = store.load_ai_output().unwrap().unwrap();
    assert_eq!(mirror.signals, report.signals);

    let prompts = harness.model.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].user.contains("- Target tickers: AAPL, MSFT"));

    let last = events.last().unwrap();
    assert_eq!(last.stage, ProgressStage::Done);
    assert_eq!(last.pct, 100);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_single_terminal() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(Arc::new(InMemoryReportRepository::new()), &["TSLA"]);

    let (outcome, events) = run_collecting(&orchestrator, RunRequest::default()).await;
    assert_ok!(outcome);

    let pcts: Vec<u8> = events.iter().map(|e| e.pct).collect();
    assert!(pcts.windows(2).all(|w| w[0] <= w[1]), "pct went backwards: {:?}", pcts);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(events[0].stage, ProgressStage::Starting);
    assert!(events.last().unwrap().sse_frame().starts_with("event: done\n"));
}

#[tokio::test]
async fn test_next_run_reuses_previous_signal_tickers() {
    let harness = Harness::new();
    let reports = Arc::new(InMemoryReportRepository::new());
    let orchestrator = harness.orchestrator(reports.clone(), &["AAPL"]);

    assert_ok!(
        orchestrator
            .run(RunRequest::with_tickers(vec!["nvda".to_string(), "amd".to_string()]), &ProgressReporter::silent())
            .await
    );
    let second = assert_ok!(orchestrator.run(RunRequest::default(), &ProgressReporter::silent()).await);

    let tickers: Vec<&String> = second.indicators.keys().collect();
    assert_eq!(tickers, vec!["AMD", "NVDA"]);
    assert_eq!(harness.feed.calls().await, vec!["NVDA", "AMD", "AMD", "NVDA"]);
    assert_eq!(reports.save_count(), 2);
}

#[tokio::test]
async fn test_identical_inputs_give_identical_reports() {
    let harness = Harness::new();
    let reports = Arc::new(InMemoryReportRepository::new());
    let orchestrator = harness.orchestrator(reports, &["AAPL"]);
    let request = RunRequest::with_tickers(vec!["AAPL".to_string(), "TSLA".to_string()]);

    let first = assert_ok!(orchestrator.run(request.clone(), &ProgressReporter::silent()).await);
    let second = assert_ok!(orchestrator.run(request, &ProgressReporter::silent()).await);

    assert_eq!(first.news, second.news);
    assert_eq!(first.indicators, second.indicators);
    assert_eq!(first.markdown, second.markdown);
    assert_eq!(first.signals, second.signals);
}

#[tokio::test]
async fn test_upstream_failures_are_isolated() {
    let mut harness = Harness::new();
    harness.feed = MockNewsSource::new("Feed").failing_for("MSFT");
    harness.market = MockMarketDataService::new().failing_for("MSFT");
    let orchestrator = harness.orchestrator(Arc::new(InMemoryReportRepository::new()), &["AAPL", "MSFT"]);

    let report = assert_ok!(orchestrator.run(RunRequest::default(), &ProgressReporter::silent()).await);

    assert_eq!(report.indicators["MSFT"], IndicatorRecord::failed());
    assert!(!report.indicators["AAPL"].is_failed());
    assert!(report.news.iter().any(|n| n.ticker == "MSFT" && n.source == "Mock Search"));
    assert!(!report.news.iter().any(|n| n.ticker == "MSFT" && n.source == "Mock Feed"));
}

#[tokio::test]
async fn test_model_failure_still_persists_degraded_report() {
    let mut harness = Harness::new();
    harness.model = MockLanguageModel::failing(500, "upstream exploded");
    let reports = Arc::new(InMemoryReportRepository::new());
    let orchestrator = harness.orchestrator(reports.clone(), &["AAPL"]);

    let report = assert_ok!(orchestrator.run(RunRequest::default(), &ProgressReporter::silent()).await);

    assert!(report.markdown.starts_with("Error calling model: "));
    assert!(report.markdown.contains("upstream exploded"));
    assert!(report.signals.is_empty());
    assert_eq!(reports.latest(), Some(report));
}

#[tokio::test]
async fn test_unparseable_model_output_becomes_markdown() {
    let mut harness = Harness::new();
    harness.model = MockLanguageModel::with_reply("Markets were quiet.\n-->Json:\n{\"signals\": [oops]}");
    let orchestrator = harness.orchestrator(Arc::new(InMemoryReportRepository::new()), &["AAPL"]);

    let report = assert_ok!(orchestrator.run(RunRequest::default(), &ProgressReporter::silent()).await);

    assert_eq!(report.markdown, "Markets were quiet.\n-->Json:\n{\"signals\": [oops]}");
    assert!(report.signals.is_empty());
}

#[tokio::test]
async fn test_missing_credential_stops_before_any_work() {
    let mut harness = Harness::new();
    harness.model = MockLanguageModel::demo().without_key();
    let reports = Arc::new(InMemoryReportRepository::new());
    let orchestrator = harness.orchestrator(reports.clone(), &["AAPL"]);

    let (outcome, events) = run_collecting(&orchestrator, RunRequest::default()).await;

    let err = assert_err!(outcome);
    assert!(matches!(err, RunError::Credential(CredentialError::Missing)));
    assert!(harness.feed.calls().await.is_empty());
    assert!(harness.model.prompts().await.is_empty());
    assert_eq!(reports.save_count(), 0);
    assert_eq!(events.last().unwrap().stage, ProgressStage::Failed);
}

#[tokio::test]
async fn test_persist_failure_is_reported() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(Arc::new(InMemoryReportRepository::failing()), &["AAPL"]);

    let (outcome, events) = run_collecting(&orchestrator, RunRequest::default()).await;

    let err = assert_err!(outcome);
    assert!(matches!(err, RunError::Persist { .. }));
    let last = events.last().unwrap();
    assert_eq!(last.stage, ProgressStage::Failed);
    assert!(last.message.contains("simulated write failure"));
}

#[tokio::test]
async fn test_dropped_progress_receiver_does_not_stop_run() {
    let harness = Harness::new();
    let reports = Arc::new(InMemoryReportRepository::new());
    let orchestrator = harness.orchestrator(reports.clone(), &["AAPL"]);

    let (reporter, rx) = ProgressReporter::channel();
    drop(rx);
    let report = assert_ok!(orchestrator.run(RunRequest::default(), &reporter).await);

    assert!(reporter.is_detached());
    assert_eq!(reports.latest(), Some(report));
}

#[tokio::test]
async fn test_trending_used_when_nothing_else() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(Arc::new(InMemoryReportRepository::new()), &[]);

    let report = assert_ok!(orchestrator.run(RunRequest::default(), &ProgressReporter::silent()).await);

    assert_eq!(report.indicators.keys().collect::<Vec<_>>(), vec!["GME"]);
    let signal = &report.signals.signals[0];
    assert_eq!(signal.ticker, "GME");
    assert!(matches!(signal.action, SignalAction::Buy | SignalAction::Sell));
}
