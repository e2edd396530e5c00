use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalAction {
    Buy,
    Sell,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        })
    }
}

// Models drift between "Buy", "BUY" and "buy"; anything else is rejected.
impl<'de> Deserialize<'de> for SignalAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_lowercase().as_str() {
            "buy" => Ok(SignalAction::Buy),
            "sell" => Ok(SignalAction::Sell),
            other => Err(serde::de::Error::custom(format!(
                "invalid signal action '{}', expected Buy or Sell",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub name: String,
    pub action: SignalAction,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    #[serde(default)]
    pub signals: Vec<Signal>,
}

impl SignalSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Upper-cased tickers in signal order, first occurrence kept.
    pub fn tickers(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for signal in &self.signals {
            let ticker = signal.ticker.trim().to_uppercase();
            if !ticker.is_empty() && !out.contains(&ticker) {
                out.push(ticker);
            }
        }
        out
    }
}
