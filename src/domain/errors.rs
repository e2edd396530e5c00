use thiserror::Error;

/// Problems with the model API credential. These are user-actionable:
/// the caller is expected to ask for a new key before running again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("No model API key configured; provide one before running")]
    Missing,

    #[error("Key format looks invalid")]
    InvalidFormat,

    #[error("Key rejected by provider: {message}")]
    Rejected { message: String },

    #[error("Failed to store API key: {reason}")]
    Storage { reason: String },
}

/// Failure of a single model call. Never fatal to a run.
#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("no API key configured")]
    MissingKey,

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("transport error: {reason}")]
    Transport { reason: String },

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {reason}")]
    MalformedResponse { reason: String },
}

/// Conditions that stop a run from producing a persisted report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Failed to persist report: {reason}")]
    Persist { reason: String },
}
