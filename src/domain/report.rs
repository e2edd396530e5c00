use crate::domain::indicators::IndicatorMap;
use crate::domain::news::NewsItem;
use crate::domain::signals::SignalSet;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one pipeline run. Replaces the previously persisted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub news: Vec<NewsItem>,
    pub indicators: IndicatorMap,
    pub markdown: String,
    pub signals: SignalSet,
}

/// The model-derived subset of a report, mirrored for external reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiOutput {
    pub timestamp: String,
    pub markdown: String,
    pub signals: SignalSet,
}

impl RunReport {
    pub fn new(
        generated_at: DateTime<Utc>,
        news: Vec<NewsItem>,
        indicators: IndicatorMap,
        markdown: String,
        signals: SignalSet,
    ) -> Self {
        Self {
            timestamp: iso_timestamp(generated_at),
            news,
            indicators,
            markdown,
            signals,
        }
    }

    pub fn ai_output(&self) -> AiOutput {
        AiOutput {
            timestamp: self.timestamp.clone(),
            markdown: self.markdown.clone(),
            signals: self.signals.clone(),
        }
    }
}

/// ISO-8601 UTC with a trailing `Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
