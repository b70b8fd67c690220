//! Report exporters - JSON, Markdown, CSV

use crate::report::AccountabilityReport;
use chrono::SecondsFormat;

/// Renders an accountability report in one output format
pub trait ReportExporter {
    fn export(&self, report: &AccountabilityReport) -> String;

    /// File extension for this format
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;

    /// `<report id>.<extension>`
    fn file_name(&self, report: &AccountabilityReport) -> String {
        format!("{}.{}", report.report_id, self.extension())
    }
}

fn integrity_label(tampered: bool) -> &'static str {
    if tampered {
        "TAMPERED"
    } else {
        "OK"
    }
}

// ============================================================================
// JSON Exporter
// ============================================================================

/// The stable serialized report shape
pub struct JsonExporter {
    pretty: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &AccountabilityReport) -> String {
        if self.pretty {
            serde_json::to_string_pretty(report).unwrap_or_default()
        } else {
            serde_json::to_string(report).unwrap_or_default()
        }
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}

// ============================================================================
// Markdown Exporter
// ============================================================================

/// Human-readable accountability statement
pub struct MarkdownExporter {
    include_audit_trail: bool,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self {
            include_audit_trail: true,
        }
    }
}

impl MarkdownExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_audit_trail(mut self) -> Self {
        self.include_audit_trail = false;
        self
    }
}

impl ReportExporter for MarkdownExporter {
    fn export(&self, report: &AccountabilityReport) -> String {
        let mut output = String::new();
        let balance = &report.balance;
        let integrity = &report.integrity;

        output.push_str(&format!("# Accountability Report: {}\n\n", report.project_name));
        output.push_str(&format!("- **Report**: {}\n", report.report_id));
        output.push_str(&format!(
            "- **Generated**: {}\n\n",
            report.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));

        output.push_str("## Project\n\n");
        output.push_str(&format!("- **Id**: {}\n", report.project_id));
        if let Some(description) = &report.project_description {
            output.push_str(&format!("- **Description**: {}\n", description));
        }
        output.push_str(&format!("- **Status**: {}\n", report.project_status));
        output.push_str(&format!("- **Owner**: {}\n", report.project_created_by));
        output.push_str(&format!(
            "- **Bank account**: {} ({}, {})\n\n",
            report.bank_account_name, report.bank_name, report.account_number
        ));

        output.push_str("## Balance\n\n");
        output.push_str(&format!("- **Total credits**: {}\n", balance.total_credits));
        output.push_str(&format!("- **Total debits**: {}\n", balance.total_debits));
        output.push_str(&format!("- **Balance**: {}\n", balance.balance));
        output.push_str(&format!("- **Budget**: {}\n", balance.budget));
        output.push_str(&format!("- **Spent**: {}\n", balance.spent));
        output.push_str(&format!("- **Remaining**: {}\n", balance.remaining));
        if balance.is_over_budget {
            output.push_str("\n> **Over budget.**\n");
        }
        output.push('\n');

        output.push_str("## Integrity\n\n");
        output.push_str(&format!(
            "- **Verified**: {}\n",
            integrity.verified_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        output.push_str(&format!(
            "- **Transactions checked**: {}\n",
            integrity.total_transactions_checked
        ));
        output.push_str(&format!(
            "- **Audit entries checked**: {}\n",
            integrity.total_audit_entries_checked
        ));
        if integrity.is_valid {
            output.push_str("- **Result**: all records intact\n\n");
        } else {
            output.push_str(&format!(
                "- **Result**: INTEGRITY COMPROMISED ({} tampered records)\n\n",
                integrity.tampered_count()
            ));
        }

        output.push_str("## Transactions\n\n");
        output.push_str("| Date | Kind | Amount | Transaction | Created By | Integrity |\n");
        output.push_str("| --- | --- | --- | --- | --- | --- |\n");
        for tx in &report.transactions {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                tx.date,
                tx.kind,
                tx.amount,
                tx.id,
                tx.created_by,
                integrity_label(report.is_transaction_tampered(tx.id))
            ));
        }

        if self.include_audit_trail {
            output.push_str("\n## Audit Trail\n\n");
            output.push_str("| Timestamp | Action | Entity | Actor | Integrity |\n");
            output.push_str("| --- | --- | --- | --- | --- |\n");
            for entry in &report.audit_entries {
                output.push_str(&format!(
                    "| {} | {} | {} {} | {} | {} |\n",
                    entry.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                    entry.action,
                    entry.entity_type,
                    entry.entity_id,
                    entry.actor_id,
                    integrity_label(report.is_audit_entry_tampered(entry.id))
                ));
            }
        }

        output
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    fn mime_type(&self) -> &'static str {
        "text/markdown"
    }
}

// ============================================================================
// CSV Exporter
// ============================================================================

const CSV_HEADERS: [&str; 11] = [
    "id",
    "date",
    "kind",
    "amount",
    "bank_account_id",
    "accounting_account_id",
    "created_by",
    "created_at",
    "data_hash",
    "signature",
    "integrity",
];

/// Transaction ledger, one row per transaction
pub struct CsvExporter {
    delimiter: char,
    include_header: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }

    fn escape_field(&self, field: &str) -> String {
        if field.contains(self.delimiter) || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn push_row(&self, output: &mut String, fields: &[String]) {
        let escaped: Vec<String> = fields.iter().map(|f| self.escape_field(f)).collect();
        output.push_str(&escaped.join(&self.delimiter.to_string()));
        output.push('\n');
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, report: &AccountabilityReport) -> String {
        let mut output = String::new();

        if self.include_header {
            let headers: Vec<String> = CSV_HEADERS.iter().map(|h| h.to_string()).collect();
            self.push_row(&mut output, &headers);
        }

        for tx in &report.transactions {
            let row = [
                tx.id.to_string(),
                tx.date.to_string(),
                tx.kind.code().to_string(),
                tx.amount.to_string(),
                tx.bank_account_id.to_string(),
                tx.accounting_account_id.to_string(),
                tx.created_by.clone(),
                tx.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                tx.data_hash.clone(),
                tx.signature.clone(),
                integrity_label(report.is_transaction_tampered(tx.id)).to_string(),
            ];
            self.push_row(&mut output, &row);
        }

        output
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }
}
