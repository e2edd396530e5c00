pub mod credential_store;
pub mod report_store;

pub use credential_store::CredentialStore;
pub use report_store::ReportStore;
