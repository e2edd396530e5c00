//! Configuration module for TradePulse.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: upstream Providers and the run Pipeline.

mod pipeline_config;
mod provider_config;

pub use pipeline_config::{DEFAULT_TICKERS, PipelineEnvConfig, parse_tickers};
pub use provider_config::{OpenAiConfig, ProviderEnvConfig, YahooConfig};

use anyhow::Result;
use std::env;
use std::str::FromStr;

/// Where upstream data and model output come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    Mock,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "mock" => Ok(Mode::Mock),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'live' or 'mock'", s),
        }
    }
}

/// Main application configuration, passed explicitly into each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub providers: ProviderEnvConfig,
    pub pipeline: PipelineEnvConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Live,
            providers: ProviderEnvConfig::default(),
            pipeline: PipelineEnvConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let mode = Mode::from_str(&lookup_string(lookup, "MODE", "live"))?;

        Ok(Self {
            mode,
            providers: ProviderEnvConfig::from_lookup(lookup),
            pipeline: PipelineEnvConfig::from_lookup(lookup),
        })
    }
}

pub(crate) fn lookup_string(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn lookup_parse<T: FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
