//! AuditLog - signed, hashed, append-only audit entries
//!
//! Entries are appended to the caller's [`UnitOfWork`] and become durable
//! only when that unit commits, so a mutation and its audit entry either
//! both persist or neither does.

use crate::error::{AuditError, AuditResult};
use chrono::Utc;
use serde::Serialize;
use tally_core::{truncate_micros, ActionType, AuditEntry, Entity, Transaction};
use tally_ledger::{Seal, SignatureService};
use tally_store::UnitOfWork;
use tracing::debug;
use uuid::Uuid;

/// Input for one audit entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub actor_id: String,
    pub action: ActionType,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
}

impl AuditRecord {
    pub fn new(
        actor_id: impl Into<String>,
        action: ActionType,
        entity_type: impl Into<String>,
        entity_id: Uuid,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action,
            entity_type: entity_type.into(),
            entity_id,
            previous_value: None,
            new_value: None,
        }
    }

    pub fn previous(mut self, snapshot: impl Into<String>) -> Self {
        self.previous_value = Some(snapshot.into());
        self
    }

    pub fn new_state(mut self, snapshot: impl Into<String>) -> Self {
        self.new_value = Some(snapshot.into());
        self
    }

    fn validate(&self) -> AuditResult<()> {
        if self.actor_id.trim().is_empty() {
            return Err(AuditError::validation("actor_id must not be empty"));
        }
        if self.entity_type.trim().is_empty() {
            return Err(AuditError::validation("entity_type must not be empty"));
        }
        if self.entity_id.is_nil() {
            return Err(AuditError::validation("entity_id must not be nil"));
        }
        Ok(())
    }
}

/// Creates audit entries inside a caller-owned unit of work
#[derive(Clone)]
pub struct AuditLog {
    signer: SignatureService,
}

impl AuditLog {
    pub fn new(signer: &SignatureService) -> Self {
        Self {
            signer: signer.clone(),
        }
    }

    /// Seal and append one entry.
    ///
    /// The entry is written to `work` but not committed; the caller commits
    /// it together with the change it documents. Units of work that cannot
    /// roll back atomically are refused.
    pub async fn append<W: UnitOfWork>(
        &self,
        work: &mut W,
        record: AuditRecord,
    ) -> AuditResult<AuditEntry> {
        if !work.is_atomic() {
            return Err(AuditError::Configuration(
                "audit entries require an atomic unit of work".to_string(),
            ));
        }
        record.validate()?;

        let mut entry = AuditEntry {
            id: Uuid::new_v4(),
            actor_id: record.actor_id,
            action: record.action,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            timestamp: truncate_micros(Utc::now()),
            previous_value: record.previous_value,
            new_value: record.new_value,
            signature: String::new(),
            data_hash: String::new(),
        };

        let seal = Seal::compute(&entry, &self.signer)?;
        if seal.signature.is_empty() || seal.data_hash.is_empty() {
            return Err(AuditError::validation("audit entry seal is incomplete"));
        }
        entry.signature = seal.signature;
        entry.data_hash = seal.data_hash;

        work.append_audit_entry(&entry).await?;

        debug!(
            entry_id = %entry.id,
            action = entry.action.code(),
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            actor = %entry.actor_id,
            "Audit entry appended"
        );
        Ok(entry)
    }

    pub async fn record_create<W, E>(&self, work: &mut W, actor_id: &str, entity: &E) -> AuditResult<AuditEntry>
    where
        W: UnitOfWork,
        E: Entity + Serialize,
    {
        let record = AuditRecord::new(actor_id, ActionType::Create, E::ENTITY_TYPE, entity.entity_id())
            .new_state(snapshot(entity)?);
        self.append(work, record).await
    }

    pub async fn record_update<W, E>(
        &self,
        work: &mut W,
        actor_id: &str,
        before: &E,
        after: &E,
    ) -> AuditResult<AuditEntry>
    where
        W: UnitOfWork,
        E: Entity + Serialize,
    {
        self.record_change(work, actor_id, ActionType::Update, before, after)
            .await
    }

    pub async fn record_status_change<W, E>(
        &self,
        work: &mut W,
        actor_id: &str,
        before: &E,
        after: &E,
    ) -> AuditResult<AuditEntry>
    where
        W: UnitOfWork,
        E: Entity + Serialize,
    {
        self.record_change(work, actor_id, ActionType::StatusChange, before, after)
            .await
    }

    pub async fn record_delete<W, E>(&self, work: &mut W, actor_id: &str, entity: &E) -> AuditResult<AuditEntry>
    where
        W: UnitOfWork,
        E: Entity + Serialize,
    {
        let record = AuditRecord::new(actor_id, ActionType::Delete, E::ENTITY_TYPE, entity.entity_id())
            .previous(snapshot(entity)?);
        self.append(work, record).await
    }

    /// Document a newly sealed transaction; the actor is its creator
    pub async fn record_transaction<W: UnitOfWork>(
        &self,
        work: &mut W,
        tx: &Transaction,
    ) -> AuditResult<AuditEntry> {
        let record = AuditRecord::new(
            tx.created_by.as_str(),
            ActionType::CreateTransaction,
            Transaction::ENTITY_TYPE,
            tx.id,
        )
        .new_state(snapshot(tx)?);
        self.append(work, record).await
    }

    async fn record_change<W, E>(
        &self,
        work: &mut W,
        actor_id: &str,
        action: ActionType,
        before: &E,
        after: &E,
    ) -> AuditResult<AuditEntry>
    where
        W: UnitOfWork,
        E: Entity + Serialize,
    {
        if before.entity_id() != after.entity_id() {
            return Err(AuditError::validation(format!(
                "snapshots describe different entities: {} and {}",
                before.entity_id(),
                after.entity_id()
            )));
        }
        let record = AuditRecord::new(actor_id, action, E::ENTITY_TYPE, after.entity_id())
            .previous(snapshot(before)?)
            .new_state(snapshot(after)?);
        self.append(work, record).await
    }
}

fn snapshot<T: Serialize>(value: &T) -> AuditResult<String> {
    serde_json::to_string(value)
        .map_err(|e| AuditError::validation(format!("cannot serialize snapshot: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use tally_core::{Amount, BankAccount, Project, ProjectStatus};
    use tally_ledger::{check_seal, SigningKey};
    use tally_store::{AuditFilter, LedgerReader, MemoryStore, Store, StoreResult};

    fn signer() -> SignatureService {
        SignatureService::new(SigningKey::generate())
    }

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Bridge".to_string(),
            description: None,
            budget: Amount::new(dec!(1000)).unwrap(),
            bank_account_id: None,
            status: ProjectStatus::Active,
            created_at: truncate_micros(Utc::now()),
            created_by: "alice".to_string(),
        }
    }

    /// A unit of work that writes through immediately
    struct AutoCommit;

    #[async_trait]
    impl UnitOfWork for AutoCommit {
        fn is_atomic(&self) -> bool {
            false
        }

        async fn insert_project(&mut self, _: &Project) -> StoreResult<()> {
            Ok(())
        }

        async fn insert_bank_account(&mut self, _: &BankAccount) -> StoreResult<()> {
            Ok(())
        }

        async fn update_project_status(&mut self, _: Uuid, _: ProjectStatus) -> StoreResult<()> {
            Ok(())
        }

        async fn insert_transaction(&mut self, _: &Transaction) -> StoreResult<()> {
            Ok(())
        }

        async fn append_audit_entry(&mut self, _: &AuditEntry) -> StoreResult<()> {
            Ok(())
        }

        async fn commit(self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_append_seals_and_persists_on_commit() {
        let signer = signer();
        let log = AuditLog::new(&signer);
        let store = MemoryStore::new();
        let project = project();

        let mut work = store.begin().await.unwrap();
        let entry = log.record_create(&mut work, "alice", &project).await.unwrap();
        assert_eq!(store.audit_entry_count().await, 0);
        work.commit().await.unwrap();

        assert_eq!(entry.action, ActionType::Create);
        assert_eq!(entry.entity_type, "Project");
        assert_eq!(entry.entity_id, project.id);
        assert!(entry.previous_value.is_none());
        assert!(check_seal(&entry, &signer).is_intact());

        let stored = store
            .load_audit_entries(&AuditFilter::new().entity(project.id))
            .await
            .unwrap();
        assert_eq!(stored, vec![entry]);
    }

    #[tokio::test]
    async fn test_dropped_work_discards_entry() {
        let log = AuditLog::new(&signer());
        let store = MemoryStore::new();

        let mut work = store.begin().await.unwrap();
        log.record_create(&mut work, "alice", &project()).await.unwrap();
        drop(work);

        assert_eq!(store.audit_entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_status_change_keeps_both_snapshots() {
        let log = AuditLog::new(&signer());
        let store = MemoryStore::new();
        let before = project();
        let mut after = before.clone();
        after.status = ProjectStatus::Closed;

        let mut work = store.begin().await.unwrap();
        let entry = log
            .record_status_change(&mut work, "bob", &before, &after)
            .await
            .unwrap();

        assert_eq!(entry.action, ActionType::StatusChange);
        assert!(entry.previous_value.unwrap().contains("ACTIVE"));
        assert!(entry.new_value.unwrap().contains("CLOSED"));
    }

    #[tokio::test]
    async fn test_change_across_entities_rejected() {
        let log = AuditLog::new(&signer());
        let store = MemoryStore::new();
        let mut work = store.begin().await.unwrap();

        let result = log.record_update(&mut work, "bob", &project(), &project()).await;
        assert!(matches!(result, Err(AuditError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_actor_rejected() {
        let log = AuditLog::new(&signer());
        let store = MemoryStore::new();
        let mut work = store.begin().await.unwrap();

        let result = log.record_delete(&mut work, " ", &project()).await;
        assert!(matches!(result, Err(AuditError::Validation(_))));
        assert_eq!(work.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_nil_entity_rejected() {
        let log = AuditLog::new(&signer());
        let store = MemoryStore::new();
        let mut work = store.begin().await.unwrap();

        let record = AuditRecord::new("alice", ActionType::Update, "Project", Uuid::nil());
        let result = log.append(&mut work, record).await;
        assert!(matches!(result, Err(AuditError::Validation(_))));
    }

    #[tokio::test]
    async fn test_non_atomic_work_refused() {
        let log = AuditLog::new(&signer());
        let result = log.record_create(&mut AutoCommit, "alice", &project()).await;
        assert!(matches!(result, Err(AuditError::Configuration(_))));
    }
}
