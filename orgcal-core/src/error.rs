//! Error types for orgcal.

use thiserror::Error;

/// Errors that can occur outside the reconciliation core.
///
/// Reconciliation itself never fails; these cover configuration, reading the
/// outline, and talking to provider binaries.
#[derive(Error, Debug)]
pub enum OrgCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Couldn't find event parent node at '{0}'")]
    EventsPathNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for orgcal operations.
pub type OrgCalResult<T> = Result<T, OrgCalError>;
