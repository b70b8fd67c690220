//! Transaction creation workflow
//!
//! validate -> seal -> insert -> audit -> commit, all in one unit of work.

use crate::error::{AuditError, AuditResult};
use crate::log::AuditLog;
use chrono::{NaiveDate, Utc};
use tally_core::{AuditEntry, NewTransaction, Transaction};
use tally_ledger::{seal_transaction, SignatureService};
use tally_store::{Store, UnitOfWork};
use tracing::info;
use uuid::Uuid;

/// Records sealed transactions together with their audit entries
#[derive(Clone)]
pub struct TransactionRecorder {
    signer: SignatureService,
    audit_log: AuditLog,
}

impl TransactionRecorder {
    pub fn new(signer: &SignatureService) -> Self {
        Self {
            signer: signer.clone(),
            audit_log: AuditLog::new(signer),
        }
    }

    /// Record a transaction and commit
    pub async fn record<S: Store>(
        &self,
        store: &S,
        input: NewTransaction,
    ) -> AuditResult<(Transaction, AuditEntry)> {
        if store.load_bank_account(input.bank_account_id).await?.is_none() {
            return Err(AuditError::not_found("BankAccount", input.bank_account_id));
        }

        let mut work = store.begin().await?;
        let recorded = self.record_in(&mut work, input).await?;
        work.commit().await?;

        let (tx, _) = &recorded;
        info!(
            transaction_id = %tx.id,
            bank_account_id = %tx.bank_account_id,
            kind = tx.kind.code(),
            amount = %tx.amount,
            actor_id = %tx.created_by,
            "Transaction recorded"
        );
        Ok(recorded)
    }

    /// Seal and stage a transaction plus its audit entry without committing
    pub async fn record_in<W: UnitOfWork>(
        &self,
        work: &mut W,
        input: NewTransaction,
    ) -> AuditResult<(Transaction, AuditEntry)> {
        let tx = seal_transaction(input, Uuid::new_v4(), Utc::now(), &self.signer)?;
        work.insert_transaction(&tx).await?;
        let entry = self.audit_log.record_transaction(work, &tx).await?;
        Ok((tx, entry))
    }

    /// Correct an existing transaction by recording its opposite
    pub async fn record_offset<S: Store>(
        &self,
        store: &S,
        original_id: Uuid,
        date: NaiveDate,
        actor_id: &str,
    ) -> AuditResult<(Transaction, AuditEntry)> {
        let original = store
            .load_transaction(original_id)
            .await?
            .ok_or_else(|| AuditError::not_found("Transaction", original_id))?;

        self.record(store, NewTransaction::offsetting(&original, date, actor_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{ActionType, Amount, BankAccount, TransactionKind};
    use tally_ledger::{check_seal, SigningKey};
    use tally_store::{LedgerReader, MemoryStore, TransactionFilter};

    async fn store_with_account() -> (MemoryStore, BankAccount) {
        let store = MemoryStore::new();
        let account = BankAccount {
            id: Uuid::new_v4(),
            name: "Operations".to_string(),
            bank_name: "First Bank".to_string(),
            account_number: "001".to_string(),
            created_at: Utc::now(),
        };
        let mut work = store.begin().await.unwrap();
        work.insert_bank_account(&account).await.unwrap();
        work.commit().await.unwrap();
        (store, account)
    }

    fn input(account: &BankAccount, amount: rust_decimal::Decimal) -> NewTransaction {
        NewTransaction {
            amount: Amount::new(amount).unwrap(),
            date: Utc::now().date_naive(),
            kind: TransactionKind::Debit,
            bank_account_id: account.id,
            accounting_account_id: Uuid::new_v4(),
            created_by: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_commits_transaction_and_entry() {
        let signer = SignatureService::new(SigningKey::generate());
        let recorder = TransactionRecorder::new(&signer);
        let (store, account) = store_with_account().await;

        let (tx, entry) = recorder.record(&store, input(&account, dec!(5000))).await.unwrap();

        assert!(check_seal(&tx, &signer).is_intact());
        assert!(check_seal(&entry, &signer).is_intact());
        assert_eq!(entry.action, ActionType::CreateTransaction);
        assert_eq!(entry.entity_id, tx.id);
        assert_eq!(entry.actor_id, "alice");
        assert_eq!(store.load_transaction(tx.id).await.unwrap(), Some(tx));
        assert_eq!(store.audit_entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        let signer = SignatureService::new(SigningKey::generate());
        let recorder = TransactionRecorder::new(&signer);
        let (store, account) = store_with_account().await;

        let mut zero = input(&account, dec!(0));
        let result = recorder.record(&store, zero.clone()).await;
        assert!(matches!(result, Err(AuditError::Validation(_))));

        zero.amount = Amount::new(dec!(1)).unwrap();
        zero.date = Utc::now().date_naive() + chrono::Days::new(2);
        let result = recorder.record(&store, zero).await;
        assert!(matches!(result, Err(AuditError::Validation(_))));

        assert_eq!(store.transaction_count().await, 0);
        assert_eq!(store.audit_entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_bank_account() {
        let signer = SignatureService::new(SigningKey::generate());
        let recorder = TransactionRecorder::new(&signer);
        let (store, account) = store_with_account().await;
        let mut orphan = input(&account, dec!(10));
        orphan.bank_account_id = Uuid::new_v4();

        let result = recorder.record(&store, orphan).await;
        assert!(matches!(result, Err(AuditError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_offset_records_opposite_kind() {
        let signer = SignatureService::new(SigningKey::generate());
        let recorder = TransactionRecorder::new(&signer);
        let (store, account) = store_with_account().await;
        let (original, _) = recorder.record(&store, input(&account, dec!(75.5))).await.unwrap();

        let today = Utc::now().date_naive();
        let (offset, _) = recorder
            .record_offset(&store, original.id, today, "bob")
            .await
            .unwrap();

        assert_eq!(offset.kind, TransactionKind::Credit);
        assert_eq!(offset.amount, original.amount);
        assert_eq!(offset.created_by, "bob");

        let all = store
            .load_transactions(account.id, &TransactionFilter::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(tally_ledger::BalanceCalculator::calculate(&all), dec!(0));
    }

    #[tokio::test]
    async fn test_offset_of_missing_transaction() {
        let signer = SignatureService::new(SigningKey::generate());
        let recorder = TransactionRecorder::new(&signer);
        let (store, _) = store_with_account().await;

        let result = recorder
            .record_offset(&store, Uuid::new_v4(), Utc::now().date_naive(), "bob")
            .await;
        assert!(result.unwrap_err().is_not_found());
    }
}
