//! Summarizer
//!
//! Compacts news, renders the prompt, makes the single model call and parses
//! the reply. A failed call never fails the run: it degrades to an error
//! narrative with no signals.

use crate::application::news_compactor::NewsCompactor;
use crate::application::prompt_builder::{PromptBuilder, target_tickers};
use crate::application::response_parser::ResponseParser;
use crate::domain::errors::CredentialError;
use crate::domain::indicators::IndicatorMap;
use crate::domain::news::NewsItem;
use crate::domain::ports::LanguageModel;
use crate::domain::signals::SignalSet;
use std::sync::Arc;
use tracing::{debug, error, info};

const PREVIEW_CHARS: usize = 800;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub markdown: String,
    pub signals: SignalSet,
}

impl Summary {
    pub fn degraded(reason: impl std::fmt::Display) -> Self {
        Self {
            markdown: format!("Error calling model: {}", reason),
            signals: SignalSet::empty(),
        }
    }
}

pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    compactor: NewsCompactor,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, compactor: NewsCompactor) -> Self {
        Self { model, compactor }
    }

    pub fn ensure_ready(&self) -> Result<(), CredentialError> {
        self.model.ensure_ready()
    }

    pub async fn summarize(&self, news: &[NewsItem], indicators: &IndicatorMap) -> Summary {
        let compact = self.compactor.compact(news);
        let tickers = target_tickers(news, indicators);
        let prompt = PromptBuilder::model_prompt(&compact, indicators, &tickers);

        info!(
            "Summarizer: Prompting model with {} news items, {} citations, {} tickers",
            compact.items.len(),
            compact.citations.len(),
            tickers.len()
        );
        debug!("Summarizer: Prompt preview: {}", preview(&prompt.user));

        let raw = match self.model.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Summarizer: Model call failed: {}", e);
                return Summary::degraded(e);
            }
        };
        debug!("Summarizer: Raw model output: {}", preview(&raw));

        let parsed = ResponseParser::parse(&raw);
        info!(
            "Summarizer: Parsed {} signals, {} chars of markdown",
            parsed.signals.signals.len(),
            parsed.markdown.chars().count()
        );
        Summary {
            markdown: parsed.markdown,
            signals: parsed.signals,
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ModelCallError;
    use crate::domain::news::{CompactionBudget, PublishedAt};
    use crate::domain::ports::ModelPrompt;
    use crate::domain::signals::SignalAction;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Result<String, u16>,
        prompts: Mutex<Vec<ModelPrompt>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &ModelPrompt) -> Result<String, ModelCallError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(ModelCallError::Status {
                    status: *status,
                    body: "quota exceeded".to_string(),
                }),
            }
        }
    }

    fn summarizer(reply: Result<String, u16>) -> (Summarizer, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let summarizer = Summarizer::new(
            model.clone(),
            NewsCompactor::new(CompactionBudget::default()),
        );
        (summarizer, model)
    }

    fn news() -> Vec<NewsItem> {
        vec![NewsItem::new(
            "NVDA",
            "Nvidia guides higher",
            "https://news.test/nvda",
            "Reuters",
            PublishedAt::Epoch(1_700_000_000),
        )]
    }

    #[tokio::test]
    async fn test_summarize_parses_reply() {
        let reply = "## Daily Brief\nChips rallied [1].\n-->Json:\n{\"signals\":[{\"ticker\":\"NVDA\",\"name\":\"Nvidia\",\"action\":\"buy\",\"reason\":\"Guidance [1].\"}]}";
        let (summarizer, model) = summarizer(Ok(reply.to_string()));

        let summary = summarizer.summarize(&news(), &IndicatorMap::new()).await;

        assert_eq!(summary.markdown, "## Daily Brief\nChips rallied [1].");
        assert_eq!(summary.signals.signals.len(), 1);
        assert_eq!(summary.signals.signals[0].action, SignalAction::Buy);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("- Target tickers: NVDA"));
    }

    #[tokio::test]
    async fn test_model_failure_degrades() {
        let (summarizer, _) = summarizer(Err(429));

        let summary = summarizer.summarize(&news(), &IndicatorMap::new()).await;

        assert!(summary.markdown.starts_with("Error calling model: "));
        assert!(summary.markdown.contains("429"));
        assert!(summary.signals.is_empty());
    }

    #[test]
    fn test_default_model_is_ready() {
        let (summarizer, _) = summarizer(Ok(String::new()));
        assert_eq!(summarizer.ensure_ready(), Ok(()));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(900);
        let out = preview(&long);
        assert_eq!(out.chars().count(), PREVIEW_CHARS + 1);
        assert_eq!(preview("short"), "short");
    }
}
