//! Loading everything recorded about one project

use crate::error::{AuditError, AuditResult};
use std::collections::HashSet;
use tally_core::{ActionType, AuditEntry, BankAccount, Entity, Project, Transaction};
use tally_store::{AuditFilter, LedgerReader, TransactionFilter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// A project with its bank account, transactions and audit trail
#[derive(Debug, Clone)]
pub struct ProjectHistory {
    pub project: Project,
    /// `None` when the project has no linked account, or the link dangles
    pub bank_account: Option<BankAccount>,
    /// Ordered by date, then insertion. Rows the audit trail places on the
    /// account but that are now stored elsewhere follow at the end.
    pub transactions: Vec<Transaction>,
    /// Entries referencing the project or any of its transactions, ordered
    /// by timestamp, then insertion
    pub audit_entries: Vec<AuditEntry>,
    /// Transactions recorded on the account that are no longer stored
    /// against it, either moved or gone
    pub displaced_transaction_ids: Vec<Uuid>,
}

impl ProjectHistory {
    pub async fn load<R: LedgerReader + ?Sized>(
        reader: &R,
        project_id: Uuid,
        cancel: &CancellationToken,
    ) -> AuditResult<Self> {
        let project = reader
            .load_project(project_id)
            .await?
            .ok_or_else(|| AuditError::not_found("Project", project_id))?;
        ensure_running(cancel)?;

        let mut bank_account = None;
        let mut transactions = Vec::new();
        let mut displaced_transaction_ids = Vec::new();

        if let Some(account_id) = project.bank_account_id {
            bank_account = reader.load_bank_account(account_id).await?;
            ensure_running(cancel)?;
            transactions = reader
                .load_transactions(account_id, &TransactionFilter::new())
                .await?;
            ensure_running(cancel)?;

            let displaced = load_displaced(reader, account_id, &transactions, cancel).await?;
            for (id, row) in displaced {
                displaced_transaction_ids.push(id);
                transactions.extend(row);
            }
        }
        ensure_running(cancel)?;

        let filter = AuditFilter::new()
            .entity(project.id)
            .entities(transactions.iter().map(|tx| tx.id))
            .entities(displaced_transaction_ids.iter().copied());
        let audit_entries = reader.load_audit_entries(&filter).await?;
        ensure_running(cancel)?;

        debug!(
            project_id = %project.id,
            transactions = transactions.len(),
            displaced = displaced_transaction_ids.len(),
            audit_entries = audit_entries.len(),
            "Project history loaded"
        );

        Ok(Self {
            project,
            bank_account,
            transactions,
            audit_entries,
            displaced_transaction_ids,
        })
    }
}

/// Transactions whose creation entry names `account_id` but which are not
/// among `on_account`, paired with the stored row if one is left
async fn load_displaced<R: LedgerReader + ?Sized>(
    reader: &R,
    account_id: Uuid,
    on_account: &[Transaction],
    cancel: &CancellationToken,
) -> AuditResult<Vec<(Uuid, Option<Transaction>)>> {
    let filter = AuditFilter::new()
        .entity_type(Transaction::ENTITY_TYPE)
        .action(ActionType::CreateTransaction)
        .new_value_contains(account_id.to_string());
    let created = reader.load_audit_entries(&filter).await?;

    let mut known: HashSet<Uuid> = on_account.iter().map(|tx| tx.id).collect();
    let mut displaced = Vec::new();

    for entry in created {
        ensure_running(cancel)?;
        if snapshot_account(&entry) != Some(account_id) || !known.insert(entry.entity_id) {
            continue;
        }
        let row = reader.load_transaction(entry.entity_id).await?;
        warn!(
            transaction_id = %entry.entity_id,
            bank_account_id = %account_id,
            stored_account = ?row.as_ref().map(|tx| tx.bank_account_id),
            "Transaction no longer stored against its account"
        );
        displaced.push((entry.entity_id, row));
    }
    Ok(displaced)
}

fn snapshot_account(entry: &AuditEntry) -> Option<Uuid> {
    let snapshot: serde_json::Value = serde_json::from_str(entry.new_value.as_deref()?).ok()?;
    snapshot.get("bankAccountId")?.as_str()?.parse().ok()
}

pub(crate) fn ensure_running(cancel: &CancellationToken) -> AuditResult<()> {
    if cancel.is_cancelled() {
        Err(AuditError::Cancelled)
    } else {
        Ok(())
    }
}
