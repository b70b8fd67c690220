//! Repository traits consumed by the audit core

use crate::error::StoreResult;
use crate::filter::{AuditFilter, TransactionFilter};
use async_trait::async_trait;
use tally_core::{AuditEntry, BankAccount, Project, ProjectStatus, Transaction};
use uuid::Uuid;

/// Read access to projects, transactions and the audit trail
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn load_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn load_bank_account(&self, id: Uuid) -> StoreResult<Option<BankAccount>>;

    async fn load_transaction(&self, id: Uuid) -> StoreResult<Option<Transaction>>;

    /// Transactions of one bank account, ordered by date then insertion
    async fn load_transactions(
        &self,
        bank_account_id: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>>;

    /// Audit entries ordered by timestamp then insertion
    async fn load_audit_entries(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>>;
}

/// One atomic unit of work.
///
/// Writes become visible only on `commit`; dropping the value rolls them
/// back. Transactions and audit entries can only be inserted.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Whether writes in this unit commit or roll back together
    fn is_atomic(&self) -> bool;

    async fn insert_project(&mut self, project: &Project) -> StoreResult<()>;

    async fn insert_bank_account(&mut self, account: &BankAccount) -> StoreResult<()>;

    async fn update_project_status(&mut self, id: Uuid, status: ProjectStatus) -> StoreResult<()>;

    async fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()>;

    async fn append_audit_entry(&mut self, entry: &AuditEntry) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;
}

/// A reader that can also open units of work
#[async_trait]
pub trait Store: LedgerReader {
    type Work: UnitOfWork;

    async fn begin(&self) -> StoreResult<Self::Work>;
}
