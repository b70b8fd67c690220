//! IntegrityVerifier - tamper detection over a project's records
//!
//! Every stored transaction and audit entry is re-encoded and its hash and
//! signature recomputed independently. Either mismatch marks the record as
//! tampered.

use crate::error::AuditResult;
use crate::history::{ensure_running, ProjectHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tally_core::{AuditEntry, Transaction};
use tally_ledger::{check_seal, Sealed, SignatureService};
use tally_store::LedgerReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of one verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub verified_at: DateTime<Utc>,
    pub total_transactions_checked: usize,
    pub tampered_transaction_ids: Vec<Uuid>,
    pub total_audit_entries_checked: usize,
    pub tampered_audit_entry_ids: Vec<Uuid>,
    pub is_valid: bool,
}

impl IntegrityReport {
    pub fn tampered_count(&self) -> usize {
        self.tampered_transaction_ids.len() + self.tampered_audit_entry_ids.len()
    }
}

/// Re-derives stored seals with the current signing key
#[derive(Clone)]
pub struct IntegrityVerifier {
    signer: SignatureService,
}

impl IntegrityVerifier {
    pub fn new(signer: &SignatureService) -> Self {
        Self {
            signer: signer.clone(),
        }
    }

    /// Verify every record belonging to a project.
    ///
    /// A project without a linked bank account has no transactions to check.
    /// Tampering is reported in the result, not as an error.
    pub async fn verify<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        project_id: Uuid,
    ) -> AuditResult<IntegrityReport> {
        self.verify_with_cancel(reader, project_id, &CancellationToken::new())
            .await
    }

    /// Same as [`verify`](Self::verify), abandoning the run with
    /// `AuditError::Cancelled` once `cancel` fires
    pub async fn verify_with_cancel<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        project_id: Uuid,
        cancel: &CancellationToken,
    ) -> AuditResult<IntegrityReport> {
        let history = ProjectHistory::load(reader, project_id, cancel).await?;
        let report = self.check_history(&history, cancel)?;

        info!(
            project_id = %project_id,
            transactions = report.total_transactions_checked,
            audit_entries = report.total_audit_entries_checked,
            tampered = report.tampered_count(),
            valid = report.is_valid,
            "Integrity verification finished"
        );
        Ok(report)
    }

    /// Check a loaded history. Displaced transactions count as tampered
    /// whatever their seal says.
    pub fn check_history(
        &self,
        history: &ProjectHistory,
        cancel: &CancellationToken,
    ) -> AuditResult<IntegrityReport> {
        let mut report = self.check(&history.transactions, &history.audit_entries, cancel)?;

        let stored: HashSet<Uuid> = history.transactions.iter().map(|tx| tx.id).collect();
        for id in &history.displaced_transaction_ids {
            if !stored.contains(id) {
                report.total_transactions_checked += 1;
            }
            if !report.tampered_transaction_ids.contains(id) {
                report.tampered_transaction_ids.push(*id);
            }
        }
        report.is_valid = report.tampered_count() == 0;
        Ok(report)
    }

    /// Check already-loaded records.
    ///
    /// Every row is checked; counts and tampered ids are per distinct id,
    /// and tampered ids keep input order.
    pub fn check(
        &self,
        transactions: &[Transaction],
        audit_entries: &[AuditEntry],
        cancel: &CancellationToken,
    ) -> AuditResult<IntegrityReport> {
        let (total_transactions_checked, tampered_transaction_ids) =
            self.check_all(transactions, cancel)?;
        let (total_audit_entries_checked, tampered_audit_entry_ids) =
            self.check_all(audit_entries, cancel)?;

        let is_valid = tampered_transaction_ids.is_empty() && tampered_audit_entry_ids.is_empty();
        Ok(IntegrityReport {
            verified_at: Utc::now(),
            total_transactions_checked,
            tampered_transaction_ids,
            total_audit_entries_checked,
            tampered_audit_entry_ids,
            is_valid,
        })
    }

    fn check_all<S: Sealed + RecordKind>(
        &self,
        records: &[S],
        cancel: &CancellationToken,
    ) -> AuditResult<(usize, Vec<Uuid>)> {
        let mut seen = HashSet::new();
        let mut flagged = HashSet::new();
        let mut tampered = Vec::new();

        for record in records {
            ensure_running(cancel)?;
            let id = record.record_id();
            seen.insert(id);
            let check = check_seal(record, &self.signer);
            if !check.is_intact() {
                warn!(
                    record = S::KIND,
                    id = %id,
                    hash_ok = check.hash_ok,
                    signature_ok = check.signature_ok,
                    "Tampered record detected"
                );
                if flagged.insert(id) {
                    tampered.push(id);
                }
            }
        }
        Ok((seen.len(), tampered))
    }
}

trait RecordKind {
    const KIND: &'static str;
}

impl RecordKind for Transaction {
    const KIND: &'static str = "transaction";
}

impl RecordKind for AuditEntry {
    const KIND: &'static str = "audit_entry";
}
