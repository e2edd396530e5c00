//! In-memory [`ReportRepository`] for tests and dry runs.
//!
//! Data is lost when the process exits.

use crate::domain::report::RunReport;
use crate::domain::repositories::ReportRepository;
use anyhow::{Result, bail};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::error;

pub struct InMemoryReportRepository {
    latest: RwLock<Option<RunReport>>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(None),
            saves: AtomicUsize::new(0),
            fail_saves: false,
        }
    }

    pub fn with_report(report: RunReport) -> Self {
        let repo = Self::new();
        repo.replace(Some(report));
        repo
    }

    /// Every save fails, as a read-only disk would.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::new()
        }
    }

    pub fn latest(&self) -> Option<RunReport> {
        match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn replace(&self, report: Option<RunReport>) {
        let mut guard = match self.latest.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("InMemoryReportRepository: lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };
        *guard = report;
    }
}

impl Default for InMemoryReportRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRepository for InMemoryReportRepository {
    fn load_latest(&self) -> Option<RunReport> {
        self.latest()
    }

    fn save(&self, report: &RunReport) -> Result<()> {
        if self.fail_saves {
            bail!("simulated write failure");
        }
        self.replace(Some(report.clone()));
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
