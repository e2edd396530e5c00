use crate::domain::report::{AiOutput, RunReport};
use crate::domain::repositories::ReportRepository;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const REPORT_FILE_NAME: &str = "last_run.json";
pub const AI_OUTPUT_FILE_NAME: &str = "openai_output.json";

/// File-backed report storage under the data directory.
pub struct ReportStore {
    data_dir: PathBuf,
}

impl ReportStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(REPORT_FILE_NAME)
    }

    pub fn ai_output_path(&self) -> PathBuf {
        self.data_dir.join(AI_OUTPUT_FILE_NAME)
    }

    /// Strict load: a missing file is `None`, a corrupt one is an error.
    pub fn load(&self) -> Result<Option<RunReport>> {
        let path = self.report_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).context("Failed to read report file")?;
        let report: RunReport =
            serde_json::from_str(&content).context("Failed to parse report JSON")?;

        info!("ReportStore: Loaded report from {:?}", path);
        Ok(Some(report))
    }

    /// Writes the report, then the model-output mirror. Only the report
    /// itself is required; a mirror failure is logged and ignored.
    pub fn save_report(&self, report: &RunReport) -> Result<()> {
        fs::create_dir_all(&self.data_dir).context("Failed to create data directory")?;
        write_json_atomic(&self.report_path(), report)?;
        info!("ReportStore: Saved report to {:?}", self.report_path());

        if let Err(e) = write_json_atomic(&self.ai_output_path(), &report.ai_output()) {
            warn!("ReportStore: Model output mirror not updated: {:#}", e);
        }
        Ok(())
    }

    pub fn load_ai_output(&self) -> Result<Option<AiOutput>> {
        let path = self.ai_output_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).context("Failed to read model output file")?;
        let output = serde_json::from_str(&content).context("Failed to parse model output JSON")?;
        Ok(Some(output))
    }
}

impl ReportRepository for ReportStore {
    fn load_latest(&self) -> Option<RunReport> {
        match self.load() {
            Ok(report) => report,
            Err(e) => {
                warn!("ReportStore: Ignoring unreadable previous report: {:#}", e);
                None
            }
        }
    }

    fn save(&self, report: &RunReport) -> Result<()> {
        self.save_report(report)
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;

    // Atomic write: write to temp file then rename
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file {:?}", temp_path))?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to rename into {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicators::{IndicatorMap, IndicatorRecord};
    use crate::domain::news::{NewsItem, PublishedAt};
    use crate::domain::signals::{Signal, SignalAction, SignalSet};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn report() -> RunReport {
        let mut indicators = IndicatorMap::new();
        indicators.insert("TSLA".to_string(), IndicatorRecord::failed());
        RunReport::new(
            Utc.with_ymd_and_hms(2025, 10, 6, 14, 30, 0).unwrap(),
            vec![NewsItem::new(
                "TSLA",
                "Tesla deliveries",
                "https://news.test/tsla",
                "Reuters",
                PublishedAt::Epoch(1_700_000_000),
            )],
            indicators,
            "## Daily Brief".to_string(),
            SignalSet {
                signals: vec![Signal {
                    ticker: "TSLA".to_string(),
                    name: "Tesla".to_string(),
                    action: SignalAction::Sell,
                    reason: "Deliveries missed [1].".to_string(),
                }],
            },
        )
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path().join("data"));

        assert_eq!(store.load().unwrap(), None);
        store.save_report(&report()).unwrap();

        assert_eq!(store.load().unwrap(), Some(report()));
        let mirror = store.load_ai_output().unwrap().unwrap();
        assert_eq!(mirror, report().ai_output());
        assert!(!store.report_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_mirror_failure_keeps_report_saved() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        // A directory in the mirror's place makes its rename fail
        fs::create_dir_all(store.ai_output_path().join("occupied")).unwrap();

        store.save_report(&report()).unwrap();

        assert_eq!(store.load().unwrap(), Some(report()));
        assert!(store.ai_output_path().is_dir());
        assert!(store.load_ai_output().is_err());
    }

    #[test]
    fn test_failed_indicator_written_as_error_only() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        store.save_report(&report()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.report_path()).unwrap()).unwrap();
        assert_eq!(
            raw["indicators"]["TSLA"],
            serde_json::json!({ "error": "fetch_failed" })
        );
        assert_eq!(raw["signals"]["signals"][0]["action"], "Sell");
        assert_eq!(raw["timestamp"], "2025-10-06T14:30:00.000000Z");
    }

    #[test]
    fn test_corrupt_report_is_ignored_by_repository() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        fs::write(store.report_path(), "{not json").unwrap();

        assert!(store.load().is_err());
        assert_eq!(store.load_latest(), None);
    }
}
