use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reason recorded for a ticker whose market data could not be fetched.
pub const FETCH_FAILED: &str = "fetch_failed";

/// Daily indicators for one ticker.
///
/// A failed fetch carries only the error tag so that downstream consumers
/// (the prompt and the persisted report) never see half-populated records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorRecord {
    Failed { error: String },
    Ok(IndicatorValues),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub price: Option<f64>,
    pub prev_close: Option<f64>,
    pub change_pct: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub sector: Option<String>,
    pub short_name: String,
}

/// Indicators keyed by ticker. Ordered so that serialized reports are stable.
pub type IndicatorMap = BTreeMap<String, IndicatorRecord>;

impl IndicatorRecord {
    pub fn failed() -> Self {
        IndicatorRecord::Failed {
            error: FETCH_FAILED.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, IndicatorRecord::Failed { .. })
    }

    pub fn values(&self) -> Option<&IndicatorValues> {
        match self {
            IndicatorRecord::Ok(values) => Some(values),
            IndicatorRecord::Failed { .. } => None,
        }
    }

    /// True when at least one numeric or descriptive indicator is present.
    pub fn has_values(&self) -> bool {
        self.values().is_some_and(|v| {
            v.price.is_some()
                || v.prev_close.is_some()
                || v.change_pct.is_some()
                || v.market_cap.is_some()
                || v.pe_ratio.is_some()
                || v.sector.is_some()
        })
    }
}

/// Percentage move from `prev` to `last`.
///
/// Absent unless both closes are known and the previous close is non-zero.
pub fn change_pct(last: Option<f64>, prev: Option<f64>) -> Option<f64> {
    match (last, prev) {
        (Some(last), Some(prev)) if prev != 0.0 => Some((last - prev) / prev * 100.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_pct() {
        assert_eq!(change_pct(Some(110.0), Some(100.0)), Some(10.0));
        assert_eq!(change_pct(Some(110.0), Some(0.0)), None);
        assert_eq!(change_pct(Some(110.0), None), None);
        assert_eq!(change_pct(None, Some(100.0)), None);
    }

    #[test]
    fn test_failed_record_serializes_error_only() {
        let json = serde_json::to_value(IndicatorRecord::failed()).unwrap();
        assert_eq!(json, serde_json::json!({"error": "fetch_failed"}));
    }

    #[test]
    fn test_records_deserialize_into_matching_variant() {
        let failed: IndicatorRecord = serde_json::from_str(r#"{"error":"fetch_failed"}"#).unwrap();
        assert!(failed.is_failed());

        let ok: IndicatorRecord = serde_json::from_str(
            r#"{"price":1.5,"prev_close":null,"change_pct":null,"market_cap":null,
                "pe_ratio":null,"sector":"Technology","short_name":"Apple Inc."}"#,
        )
        .unwrap();
        assert!(!ok.is_failed());
        assert!(ok.has_values());
        assert_eq!(ok.values().unwrap().short_name, "Apple Inc.");
    }

    #[test]
    fn test_name_only_record_has_no_values() {
        let record = IndicatorRecord::Ok(IndicatorValues {
            price: None,
            prev_close: None,
            change_pct: None,
            market_cap: None,
            pe_ratio: None,
            sector: None,
            short_name: "SPY".to_string(),
        });
        assert!(!record.has_values());
    }
}
