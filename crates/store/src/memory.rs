//! In-memory store
//!
//! Writes are buffered in `MemoryWork` and applied under one write lock on
//! commit, after every pending write has been checked, so a unit of work
//! lands completely or not at all.

use crate::error::{StoreError, StoreResult};
use crate::filter::{AuditFilter, TransactionFilter};
use crate::traits::{LedgerReader, Store, UnitOfWork};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tally_core::{AuditEntry, BankAccount, Project, ProjectStatus, Transaction};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    projects: Vec<Project>,
    bank_accounts: Vec<BankAccount>,
    transactions: Vec<Transaction>,
    audit_entries: Vec<AuditEntry>,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the backend were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store switched off".to_string()))
        } else {
            Ok(())
        }
    }

    /// Edit a stored transaction row in place, bypassing every API.
    ///
    /// Simulates someone changing the database directly; returns false if
    /// the row does not exist.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn tamper_transaction(&self, id: Uuid, edit: impl FnOnce(&mut Transaction)) -> bool {
        let mut state = self.state.write().await;
        match state.transactions.iter_mut().find(|t| t.id == id) {
            Some(tx) => {
                edit(tx);
                true
            }
            None => false,
        }
    }

    /// Edit a stored audit entry row in place, bypassing every API
    #[cfg(any(test, feature = "test-util"))]
    pub async fn tamper_audit_entry(&self, id: Uuid, edit: impl FnOnce(&mut AuditEntry)) -> bool {
        let mut state = self.state.write().await;
        match state.audit_entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                edit(entry);
                true
            }
            None => false,
        }
    }

    /// Number of committed audit entries
    pub async fn audit_entry_count(&self) -> usize {
        self.state.read().await.audit_entries.len()
    }

    /// Number of committed transactions
    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }
}

#[async_trait]
impl LedgerReader for MemoryStore {
    async fn load_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn load_bank_account(&self, id: Uuid) -> StoreResult<Option<BankAccount>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.bank_accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn load_transaction(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn load_transactions(
        &self,
        bank_account_id: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        let mut rows: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| t.bank_account_id == bank_account_id && filter.matches(t))
            .cloned()
            .collect();
        // stable: insertion order breaks ties
        rows.sort_by_key(|t| t.date);
        Ok(rows)
    }

    async fn load_audit_entries(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        let mut rows: Vec<AuditEntry> = state
            .audit_entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.timestamp);
        Ok(rows)
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Work = MemoryWork;

    async fn begin(&self) -> StoreResult<MemoryWork> {
        self.ensure_available()?;
        Ok(MemoryWork {
            store: self.clone(),
            pending: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum PendingWrite {
    Project(Project),
    BankAccount(BankAccount),
    ProjectStatus(Uuid, ProjectStatus),
    Transaction(Transaction),
    AuditEntry(AuditEntry),
}

/// Buffered unit of work against a `MemoryStore`
#[derive(Debug)]
pub struct MemoryWork {
    store: MemoryStore,
    pending: Vec<PendingWrite>,
}

impl MemoryWork {
    /// Number of writes waiting for commit
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn check_pending(state: &MemoryState, pending: &[PendingWrite]) -> StoreResult<()> {
    let mut projects: HashSet<Uuid> = state.projects.iter().map(|p| p.id).collect();
    let mut accounts: HashSet<Uuid> = state.bank_accounts.iter().map(|a| a.id).collect();
    let mut transactions: HashSet<Uuid> = state.transactions.iter().map(|t| t.id).collect();
    let mut entries: HashSet<Uuid> = state.audit_entries.iter().map(|e| e.id).collect();

    for write in pending {
        match write {
            PendingWrite::Project(p) => {
                if !projects.insert(p.id) {
                    return Err(StoreError::already_exists("Project", p.id));
                }
            }
            PendingWrite::BankAccount(a) => {
                if !accounts.insert(a.id) {
                    return Err(StoreError::already_exists("BankAccount", a.id));
                }
            }
            PendingWrite::ProjectStatus(id, _) => {
                if !projects.contains(id) {
                    return Err(StoreError::not_found("Project", id));
                }
            }
            PendingWrite::Transaction(t) => {
                if !transactions.insert(t.id) {
                    return Err(StoreError::already_exists("Transaction", t.id));
                }
            }
            PendingWrite::AuditEntry(e) => {
                if !entries.insert(e.id) {
                    return Err(StoreError::already_exists("AuditEntry", e.id));
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl UnitOfWork for MemoryWork {
    fn is_atomic(&self) -> bool {
        true
    }

    async fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        self.pending.push(PendingWrite::Project(project.clone()));
        Ok(())
    }

    async fn insert_bank_account(&mut self, account: &BankAccount) -> StoreResult<()> {
        self.pending.push(PendingWrite::BankAccount(account.clone()));
        Ok(())
    }

    async fn update_project_status(&mut self, id: Uuid, status: ProjectStatus) -> StoreResult<()> {
        self.pending.push(PendingWrite::ProjectStatus(id, status));
        Ok(())
    }

    async fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()> {
        self.pending.push(PendingWrite::Transaction(tx.clone()));
        Ok(())
    }

    async fn append_audit_entry(&mut self, entry: &AuditEntry) -> StoreResult<()> {
        self.pending.push(PendingWrite::AuditEntry(entry.clone()));
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.store.ensure_available()?;
        let mut state = self.store.state.write().await;
        check_pending(&state, &self.pending)?;

        for write in self.pending {
            match write {
                PendingWrite::Project(p) => state.projects.push(p),
                PendingWrite::BankAccount(a) => state.bank_accounts.push(a),
                PendingWrite::ProjectStatus(id, status) => {
                    if let Some(project) = state.projects.iter_mut().find(|p| p.id == id) {
                        project.status = status;
                    }
                }
                PendingWrite::Transaction(t) => state.transactions.push(t),
                PendingWrite::AuditEntry(e) => state.audit_entries.push(e),
            }
        }

        tracing::debug!(store = "memory", "Unit of work committed");
        Ok(())
    }
}
