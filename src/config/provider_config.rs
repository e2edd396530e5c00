//! Upstream provider configuration parsing from environment variables.
//!
//! This module handles loading endpoints and credentials for:
//! - The OpenAI-compatible chat completion API
//! - Yahoo Finance (news feed, search, trending, market data)

use super::{lookup_parse, lookup_string};

/// Chat completion API configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub timeout_secs: u64,
    pub validation_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.2,
            timeout_secs: 60,
            validation_timeout_secs: 15,
        }
    }
}

impl OpenAiConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_base: lookup_string(lookup, "OPENAI_API_BASE", &defaults.api_base)
                .trim_end_matches('/')
                .to_string(),
            model: lookup_string(lookup, "OPENAI_MODEL", &defaults.model),
            api_key: lookup("OPENAI_API_KEY")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            temperature: lookup_parse(lookup, "OPENAI_TEMPERATURE", defaults.temperature),
            timeout_secs: lookup_parse(lookup, "OPENAI_TIMEOUT_SECS", defaults.timeout_secs),
            validation_timeout_secs: defaults.validation_timeout_secs,
        }
    }
}

/// Yahoo Finance endpoints
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub query_base_url: String,
    pub rss_base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            query_base_url: "https://query1.finance.yahoo.com".to_string(),
            rss_base_url: "https://feeds.finance.yahoo.com/rss/2.0/headline".to_string(),
            user_agent: "TradePulse-AI/1.0".to_string(),
            timeout_secs: 10,
        }
    }
}

impl YahooConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            query_base_url: lookup_string(lookup, "YAHOO_QUERY_BASE_URL", &defaults.query_base_url)
                .trim_end_matches('/')
                .to_string(),
            rss_base_url: lookup_string(lookup, "YAHOO_RSS_BASE_URL", &defaults.rss_base_url),
            user_agent: lookup_string(lookup, "HTTP_USER_AGENT", &defaults.user_agent),
            timeout_secs: lookup_parse(lookup, "YAHOO_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }
}

/// Aggregated provider configuration
#[derive(Debug, Clone, Default)]
pub struct ProviderEnvConfig {
    pub openai: OpenAiConfig,
    pub yahoo: YahooConfig,
}

impl ProviderEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            openai: OpenAiConfig::from_lookup(lookup),
            yahoo: YahooConfig::from_lookup(lookup),
        }
    }
}
