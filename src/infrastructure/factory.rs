use crate::application::indicator_fetcher::IndicatorFetcher;
use crate::application::news_aggregator::NewsAggregator;
use crate::application::news_compactor::NewsCompactor;
use crate::application::orchestrator::{RunOrchestrator, TickerSelection};
use crate::application::summarizer::Summarizer;
use crate::config::{Config, Mode};
use crate::domain::ports::{LanguageModel, MarketDataService, TrendingSource};
use crate::domain::repositories::ReportRepository;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use crate::infrastructure::llm::OpenAiChatClient;
use crate::infrastructure::market_data::YahooChartMarketDataService;
use crate::infrastructure::mock::{
    MockLanguageModel, MockMarketDataService, MockNewsSource, MockTrendingSource,
};
use crate::infrastructure::news::{
    YahooRssNewsSource, YahooSearchNewsSource, YahooTrendingSource,
};
use crate::infrastructure::persistence::{CredentialStore, ReportStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const MOCK_TRENDING: [&str; 3] = ["NVDA", "AMD", "PLTR"];

struct Adapters {
    aggregator: NewsAggregator,
    market: Arc<dyn MarketDataService>,
    market_pause: Duration,
    trending: Arc<dyn TrendingSource>,
    model: Arc<dyn LanguageModel>,
}

pub struct ServiceFactory;

impl ServiceFactory {
    /// Key store rooted at the configured data directory. `explicit` takes
    /// precedence over the key file and the environment.
    pub fn credential_store(config: &Config, explicit: Option<String>) -> CredentialStore {
        CredentialStore::new(
            &config.pipeline.data_dir,
            explicit,
            config.providers.openai.api_key.clone(),
        )
    }

    pub fn report_store(config: &Config) -> ReportStore {
        ReportStore::new(&config.pipeline.data_dir)
    }

    pub fn create_chat_client(config: &Config, api_key: Option<String>) -> OpenAiChatClient {
        OpenAiChatClient::new(
            &config.providers.openai,
            api_key,
            &config.providers.yahoo.user_agent,
        )
    }

    /// Wires every pipeline component for the configured mode.
    pub fn create_orchestrator(config: &Config, api_key: Option<String>) -> RunOrchestrator {
        let pipeline = &config.pipeline;
        let reports: Arc<dyn ReportRepository> = Arc::new(Self::report_store(config));

        let adapters = match config.mode {
            Mode::Mock => {
                info!("ServiceFactory: Using offline mock adapters");
                Adapters {
                    aggregator: NewsAggregator::new()
                        .with_source(Arc::new(MockNewsSource::new("Feed")), Duration::ZERO)
                        .with_source(Arc::new(MockNewsSource::new("Search")), Duration::ZERO),
                    market: Arc::new(MockMarketDataService::new()),
                    market_pause: Duration::ZERO,
                    trending: Arc::new(MockTrendingSource::new(
                        MOCK_TRENDING.iter().map(|s| s.to_string()).collect(),
                    )),
                    model: Arc::new(MockLanguageModel::demo()),
                }
            }
            Mode::Live => {
                let yahoo = &config.providers.yahoo;
                let client = HttpClientFactory::create_client(
                    Duration::from_secs(yahoo.timeout_secs),
                    &yahoo.user_agent,
                );
                info!(
                    "ServiceFactory: Using Yahoo Finance at {} and model {}",
                    yahoo.query_base_url, config.providers.openai.model
                );
                Adapters {
                    aggregator: NewsAggregator::new()
                        .with_source(
                            Arc::new(YahooRssNewsSource::new(
                                client.clone(),
                                &yahoo.rss_base_url,
                                pipeline.per_source_limit,
                            )),
                            pipeline.feed_pause,
                        )
                        .with_source(
                            Arc::new(YahooSearchNewsSource::new(
                                client.clone(),
                                &yahoo.query_base_url,
                                pipeline.per_source_limit,
                            )),
                            pipeline.search_pause,
                        ),
                    market: Arc::new(YahooChartMarketDataService::new(
                        client.clone(),
                        &yahoo.query_base_url,
                    )),
                    market_pause: pipeline.market_pause,
                    trending: Arc::new(YahooTrendingSource::new(client, &yahoo.query_base_url)),
                    model: Arc::new(Self::create_chat_client(config, api_key)),
                }
            }
        };

        RunOrchestrator::new(
            adapters.aggregator,
            IndicatorFetcher::new(adapters.market, adapters.market_pause),
            Summarizer::new(adapters.model, NewsCompactor::new(pipeline.compaction)),
            adapters.trending,
            reports,
            TickerSelection::from(pipeline),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::orchestrator::RunRequest;
    use crate::domain::progress::ProgressReporter;
    use tempfile::TempDir;

    fn mock_config(data_dir: &std::path::Path) -> Config {
        let mut pipeline = crate::config::PipelineEnvConfig::default();
        pipeline.data_dir = data_dir.to_path_buf();
        Config {
            mode: Mode::Mock,
            pipeline,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_mock_mode_runs_offline() {
        let dir = TempDir::new().unwrap();
        let config = mock_config(dir.path());

        let orchestrator = ServiceFactory::create_orchestrator(&config, None);
        let report = orchestrator
            .run(RunRequest::default(), &ProgressReporter::silent())
            .await
            .unwrap();

        assert_eq!(report.indicators.len(), 6);
        assert_eq!(report.signals.signals.len(), 6);
        assert!(ServiceFactory::report_store(&config).report_path().exists());
    }

    #[test]
    fn test_live_mode_without_key_is_not_ready() {
        let config = Config::default();
        let client = ServiceFactory::create_chat_client(&config, None);
        assert!(client.ensure_ready().is_err());
    }
}
