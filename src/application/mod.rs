// Upstream collection
pub mod indicator_fetcher;
pub mod news_aggregator;

// Prompt preparation and model output handling
pub mod news_compactor;
pub mod prompt_builder;
pub mod response_parser;
pub mod summarizer;

// Run orchestrator
pub mod orchestrator;
