//! AccountabilityReportBuilder

use crate::report::AccountabilityReport;
use chrono::Utc;
use tally_audit::{AuditError, AuditResult, IntegrityVerifier, ProjectHistory};
use tally_ledger::{BalanceCalculator, SignatureService};
use tally_store::LedgerReader;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Builds one report per request from freshly loaded records
#[derive(Clone)]
pub struct AccountabilityReportBuilder {
    verifier: IntegrityVerifier,
}

impl AccountabilityReportBuilder {
    pub fn new(signer: &SignatureService) -> Self {
        Self {
            verifier: IntegrityVerifier::new(signer),
        }
    }

    pub async fn build<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        project_id: Uuid,
    ) -> AuditResult<AccountabilityReport> {
        self.build_with_cancel(reader, project_id, &CancellationToken::new())
            .await
    }

    /// Fails with `NotFound` when the project has no bank account, or the
    /// linked account does not exist
    pub async fn build_with_cancel<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        project_id: Uuid,
        cancel: &CancellationToken,
    ) -> AuditResult<AccountabilityReport> {
        let history = ProjectHistory::load(reader, project_id, cancel).await?;

        let account_id = history.project.bank_account_id.ok_or_else(|| {
            AuditError::not_found("BankAccount", format!("linked to project {project_id}"))
        })?;
        let bank_account = history
            .bank_account
            .clone()
            .ok_or_else(|| AuditError::not_found("BankAccount", account_id))?;
        let integrity = self.verifier.check_history(&history, cancel)?;

        let ProjectHistory {
            project,
            mut transactions,
            mut audit_entries,
            ..
        } = history;

        // stable sorts keep insertion order for ties
        transactions.sort_by_key(|tx| tx.date);
        audit_entries.sort_by_key(|entry| entry.timestamp);

        let balance = BalanceCalculator::summarize(&transactions, project.budget);

        let generated_at = Utc::now();
        let report = AccountabilityReport {
            report_id: AccountabilityReport::generate_id(project.id, generated_at),
            generated_at,
            project_id: project.id,
            project_name: project.name,
            project_description: project.description,
            project_status: project.status,
            project_created_by: project.created_by,
            bank_account_id: bank_account.id,
            bank_account_name: bank_account.name,
            bank_name: bank_account.bank_name,
            account_number: bank_account.account_number,
            transactions,
            audit_entries,
            balance,
            integrity,
        };

        info!(
            report_id = %report.report_id,
            project_id = %report.project_id,
            transactions = report.transactions.len(),
            audit_entries = report.audit_entries.len(),
            over_budget = report.balance.is_over_budget,
            valid = report.integrity.is_valid,
            "Accountability report built"
        );
        Ok(report)
    }
}
