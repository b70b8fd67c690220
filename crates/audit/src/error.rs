//! Audit errors
//!
//! The three caller-facing kinds are validation (caller bug), not found, and
//! infrastructure. None of them is retried here.

use tally_ledger::LedgerError;
use tally_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Infrastructure error: {0}")]
    Infrastructure(#[source] StoreError),

    /// Fatal setup problem: unusable key material, or a unit of work that
    /// cannot roll the audit entry back together with its mutation
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type AuditResult<T> = Result<T, AuditError>;

impl AuditError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for AuditError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Infrastructure(other),
        }
    }
}

impl From<LedgerError> for AuditError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => Self::Validation(msg),
            LedgerError::Domain(e) => Self::Validation(e.to_string()),
            key_error @ (LedgerError::InvalidKey { .. } | LedgerError::KeyUnavailable { .. }) => {
                Self::Configuration(key_error.to_string())
            }
        }
    }
}
