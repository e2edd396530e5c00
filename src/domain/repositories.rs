//! Repository abstractions for run output.
//!
//! The orchestrator only sees [`ReportRepository`]; the file-backed
//! implementation lives in `infrastructure::persistence`.
//!
//! Methods are blocking. Callers in async code run `save` on a blocking
//! task so that a cancelled caller cannot leave a half-written report.

use crate::domain::report::RunReport;
use anyhow::Result;

pub trait ReportRepository: Send + Sync {
    /// The previously persisted report, if one exists and can be read.
    fn load_latest(&self) -> Option<RunReport>;

    /// Replaces the persisted report.
    fn save(&self, report: &RunReport) -> Result<()>;
}
