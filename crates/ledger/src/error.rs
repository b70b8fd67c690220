//! Ledger errors

use tally_core::CoreError;
use thiserror::Error;

/// Errors that can occur while sealing or signing records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Invalid signing key: {reason}")]
    InvalidKey { reason: String },

    #[error("Signing key unavailable from {source_name}: {reason}")]
    KeyUnavailable { source_name: String, reason: String },
}

pub type LedgerResult<T> = Result<T, LedgerError>;
