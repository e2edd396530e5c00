//! Progress events emitted while a run executes.
//!
//! Events are produced by the orchestrator in pipeline order and delivered
//! through an unbounded channel. Delivery is fire-and-forget: once the
//! receiving side goes away the reporter goes quiet and the run carries on.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Starting,
    Tickers,
    News,
    Indicators,
    Model,
    Persist,
    Done,
    Failed,
}

impl ProgressStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStage::Done | ProgressStage::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    pub message: String,
    pub pct: u8,
}

impl ProgressEvent {
    pub fn new(stage: ProgressStage, message: impl Into<String>, pct: u8) -> Self {
        Self {
            stage,
            message: message.into(),
            pct: pct.min(100),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Server-sent-event frame: `done` for terminal events, `progress` otherwise.
    pub fn sse_frame(&self) -> String {
        let event = if self.is_terminal() { "done" } else { "progress" };
        let payload = serde_json::json!({ "message": self.message, "pct": self.pct });
        format!("event: {}\ndata: {}\n\n", event, payload)
    }
}

/// Single-writer handle used by the orchestrator to publish progress.
pub struct ProgressReporter {
    sender: Option<UnboundedSender<ProgressEvent>>,
    detached: AtomicBool,
}

impl ProgressReporter {
    /// Creates a reporter together with the receiving end for the caller.
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(tx),
                detached: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// A reporter nobody listens to.
    pub fn silent() -> Self {
        Self {
            sender: None,
            detached: AtomicBool::new(false),
        }
    }

    pub fn emit(&self, stage: ProgressStage, message: impl Into<String>, pct: u8) {
        let Some(sender) = &self.sender else {
            return;
        };
        if self.detached.load(Ordering::Relaxed) {
            return;
        }
        let event = ProgressEvent::new(stage, message, pct);
        if sender.send(event).is_err() {
            debug!("ProgressReporter: receiver dropped, no further events will be sent");
            self.detached.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Relaxed)
    }
}
