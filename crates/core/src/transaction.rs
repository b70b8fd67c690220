//! Transaction - immutable financial movement on a bank account
//!
//! A transaction is written once and never edited. A correction is a new
//! transaction of the opposite kind.

use crate::amount::Amount;
use crate::entity::Entity;
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Direction of a transaction relative to the project's bank account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money coming in
    Credit,
    /// Money going out
    Debit,
}

impl TransactionKind {
    /// Stable code used in canonical encoding and storage
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "CREDIT",
            TransactionKind::Debit => "DEBIT",
        }
    }

    /// The kind that offsets this one
    pub fn opposite(&self) -> Self {
        match self {
            TransactionKind::Credit => TransactionKind::Debit,
            TransactionKind::Debit => TransactionKind::Credit,
        }
    }
}

/// A persisted, sealed transaction.
///
/// `signature` and `data_hash` are produced by the ledger crate before the
/// row is inserted; this crate treats them as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Amount,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub bank_account_id: Uuid,
    pub accounting_account_id: Uuid,
    pub signature: String,
    pub data_hash: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Transaction {
    const ENTITY_TYPE: &'static str = "Transaction";

    fn entity_id(&self) -> Uuid {
        self.id
    }
}

/// Caller input for a transaction that has not been sealed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: Amount,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub bank_account_id: Uuid,
    pub accounting_account_id: Uuid,
    pub created_by: String,
}

impl NewTransaction {
    /// Check the invariants a transaction must satisfy before it is sealed.
    ///
    /// `today` is passed in so the check is deterministic under test.
    pub fn validate(&self, today: NaiveDate) -> Result<(), CoreError> {
        if self.amount.is_zero() {
            return Err(CoreError::ZeroAmount);
        }
        if self.date > today {
            return Err(CoreError::FutureDate {
                date: self.date,
                today,
            });
        }
        if self.bank_account_id.is_nil() {
            return Err(CoreError::NilId {
                field: "bank_account_id",
            });
        }
        if self.accounting_account_id.is_nil() {
            return Err(CoreError::NilId {
                field: "accounting_account_id",
            });
        }
        if self.created_by.trim().is_empty() {
            return Err(CoreError::EmptyField { field: "created_by" });
        }
        Ok(())
    }

    /// Build the offsetting input for an existing transaction
    pub fn offsetting(original: &Transaction, date: NaiveDate, created_by: impl Into<String>) -> Self {
        Self {
            amount: original.amount,
            date,
            kind: original.kind.opposite(),
            bank_account_id: original.bank_account_id,
            accounting_account_id: original.accounting_account_id,
            created_by: created_by.into(),
        }
    }
}
