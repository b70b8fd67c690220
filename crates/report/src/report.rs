//! AccountabilityReport - the serialized report shape
//!
//! Field names and nesting are relied on by downstream exporters; keep them
//! stable. Balance and integrity fields sit at the top level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_audit::IntegrityReport;
use tally_core::{AuditEntry, ProjectStatus, Transaction};
use tally_ledger::BalanceSummary;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountabilityReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,

    pub project_id: Uuid,
    pub project_name: String,
    pub project_description: Option<String>,
    pub project_status: ProjectStatus,
    pub project_created_by: String,

    pub bank_account_id: Uuid,
    pub bank_account_name: String,
    pub bank_name: String,
    pub account_number: String,

    /// Ascending by date
    pub transactions: Vec<Transaction>,
    /// Ascending by timestamp
    pub audit_entries: Vec<AuditEntry>,

    #[serde(flatten)]
    pub balance: BalanceSummary,
    #[serde(flatten)]
    pub integrity: IntegrityReport,
}

impl AccountabilityReport {
    /// `RPT-<project>-<generated at, ms>-<random>`
    pub fn generate_id(project_id: Uuid, generated_at: DateTime<Utc>) -> String {
        let project = project_id.simple().to_string();
        let nonce = Uuid::new_v4().simple().to_string();
        format!(
            "RPT-{}-{}-{}",
            &project[..8],
            generated_at.format("%Y%m%d%H%M%S%3f"),
            &nonce[..8]
        )
    }

    pub fn is_transaction_tampered(&self, id: Uuid) -> bool {
        self.integrity.tampered_transaction_ids.contains(&id)
    }

    pub fn is_audit_entry_tampered(&self, id: Uuid) -> bool {
        self.integrity.tampered_audit_entry_ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_id_format() {
        let project_id = Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 5).unwrap();

        let id = AccountabilityReport::generate_id(project_id, at);
        assert!(id.starts_with("RPT-0f8fad5b-20240310083005000-"));
        assert_eq!(id.len(), "RPT-0f8fad5b-20240310083005000-".len() + 8);
    }

    #[test]
    fn test_report_ids_differ_at_same_instant() {
        let project_id = Uuid::new_v4();
        let at = Utc::now();
        assert_ne!(
            AccountabilityReport::generate_id(project_id, at),
            AccountabilityReport::generate_id(project_id, at)
        );
    }
}
