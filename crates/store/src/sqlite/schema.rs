//! SQLite schema and row mapping
//!
//! Decimals, ids, dates and timestamps are stored as TEXT in the exact
//! forms the domain types print, so a row reloads to an identical value.
//! `seq` columns record insertion order for tie-breaking.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::str::FromStr;
use tally_core::{
    ActionType, Amount, AuditEntry, BankAccount, Project, ProjectStatus, Transaction,
    TransactionKind,
};
use uuid::Uuid;

/// DDL statements, applied in order by `SqliteStore::migrate`
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS bank_accounts (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        bank_name TEXT NOT NULL,
        account_number TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        budget TEXT NOT NULL,
        bank_account_id TEXT REFERENCES bank_accounts(id),
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        created_by TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        kind TEXT NOT NULL,
        bank_account_id TEXT NOT NULL,
        accounting_account_id TEXT NOT NULL,
        signature TEXT NOT NULL,
        data_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        created_by TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_account
    ON transactions(bank_account_id, date)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_entries (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        actor_id TEXT NOT NULL,
        action TEXT NOT NULL,
        entity_type TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        previous_value TEXT,
        new_value TEXT,
        signature TEXT NOT NULL,
        data_hash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_audit_entries_entity
    ON audit_entries(entity_id, timestamp)
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS transactions_no_update
    BEFORE UPDATE ON transactions
    BEGIN SELECT RAISE(ABORT, 'transactions are append-only'); END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS transactions_no_delete
    BEFORE DELETE ON transactions
    BEGIN SELECT RAISE(ABORT, 'transactions are append-only'); END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS audit_entries_no_update
    BEFORE UPDATE ON audit_entries
    BEGIN SELECT RAISE(ABORT, 'audit entries are append-only'); END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS audit_entries_no_delete
    BEFORE DELETE ON audit_entries
    BEGIN SELECT RAISE(ABORT, 'audit entries are append-only'); END
    "#,
];

/// Timestamp text form used in every TEXT column
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(entity: &str, id: &str, field: &str, value: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StoreError::corrupt(entity, id, format!("{}: {}", field, e)))
}

fn parse_timestamp(entity: &str, id: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(entity, id, format!("timestamp: {}", e)))
}

fn parse_code<T: FromStr>(entity: &str, id: &str, field: &str, value: &str) -> StoreResult<T> {
    value
        .parse()
        .map_err(|_| StoreError::corrupt(entity, id, format!("{}: unknown code {}", field, value)))
}

fn parse_amount(entity: &str, id: &str, value: &str) -> StoreResult<Amount> {
    value
        .parse()
        .map_err(|e| StoreError::corrupt(entity, id, format!("amount: {}", e)))
}

/// Row type for table `bank_accounts`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BankAccountRow {
    pub id: String,
    pub name: String,
    pub bank_name: String,
    pub account_number: String,
    pub created_at: String,
}

impl TryFrom<BankAccountRow> for BankAccount {
    type Error = StoreError;

    fn try_from(row: BankAccountRow) -> StoreResult<Self> {
        const E: &str = "BankAccount";
        Ok(Self {
            id: parse_uuid(E, &row.id, "id", &row.id)?,
            created_at: parse_timestamp(E, &row.id, &row.created_at)?,
            name: row.name,
            bank_name: row.bank_name,
            account_number: row.account_number,
        })
    }
}

/// Row type for table `projects`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub budget: String,
    pub bank_account_id: Option<String>,
    pub status: String,
    pub created_at: String,
    pub created_by: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> StoreResult<Self> {
        const E: &str = "Project";
        let bank_account_id = match row.bank_account_id.as_deref() {
            Some(value) => Some(parse_uuid(E, &row.id, "bank_account_id", value)?),
            None => None,
        };
        Ok(Self {
            id: parse_uuid(E, &row.id, "id", &row.id)?,
            budget: parse_amount(E, &row.id, &row.budget)?,
            status: parse_code::<ProjectStatus>(E, &row.id, "status", &row.status)?,
            created_at: parse_timestamp(E, &row.id, &row.created_at)?,
            bank_account_id,
            name: row.name,
            description: row.description,
            created_by: row.created_by,
        })
    }
}

/// Row type for table `transactions`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: String,
    pub amount: String, // Decimal stored as TEXT
    pub date: String,
    pub kind: String,
    pub bank_account_id: String,
    pub accounting_account_id: String,
    pub signature: String,
    pub data_hash: String,
    pub created_at: String,
    pub created_by: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> StoreResult<Self> {
        const E: &str = "Transaction";
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| StoreError::corrupt(E, &row.id, format!("date: {}", e)))?;
        Ok(Self {
            id: parse_uuid(E, &row.id, "id", &row.id)?,
            amount: parse_amount(E, &row.id, &row.amount)?,
            date,
            kind: parse_code::<TransactionKind>(E, &row.id, "kind", &row.kind)?,
            bank_account_id: parse_uuid(E, &row.id, "bank_account_id", &row.bank_account_id)?,
            accounting_account_id: parse_uuid(
                E,
                &row.id,
                "accounting_account_id",
                &row.accounting_account_id,
            )?,
            created_at: parse_timestamp(E, &row.id, &row.created_at)?,
            signature: row.signature,
            data_hash: row.data_hash,
            created_by: row.created_by,
        })
    }
}

/// Row type for table `audit_entries`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditEntryRow {
    pub id: String,
    pub actor_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub timestamp: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub signature: String,
    pub data_hash: String,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = StoreError;

    fn try_from(row: AuditEntryRow) -> StoreResult<Self> {
        const E: &str = "AuditEntry";
        Ok(Self {
            id: parse_uuid(E, &row.id, "id", &row.id)?,
            action: parse_code::<ActionType>(E, &row.id, "action", &row.action)?,
            entity_id: parse_uuid(E, &row.id, "entity_id", &row.entity_id)?,
            timestamp: parse_timestamp(E, &row.id, &row.timestamp)?,
            actor_id: row.actor_id,
            entity_type: row.entity_type,
            previous_value: row.previous_value,
            new_value: row.new_value,
            signature: row.signature,
            data_hash: row.data_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_row() -> TransactionRow {
        TransactionRow {
            id: Uuid::new_v4().to_string(),
            amount: "5000.00".to_string(),
            date: "2024-03-01".to_string(),
            kind: "DEBIT".to_string(),
            bank_account_id: Uuid::new_v4().to_string(),
            accounting_account_id: Uuid::new_v4().to_string(),
            signature: "sig".to_string(),
            data_hash: "hash".to_string(),
            created_at: "2024-03-01T10:00:00.123456Z".to_string(),
            created_by: "alice".to_string(),
        }
    }

    #[test]
    fn test_transaction_row_converts() {
        let tx = Transaction::try_from(tx_row()).unwrap();
        assert_eq!(tx.kind, TransactionKind::Debit);
        assert_eq!(format_timestamp(&tx.created_at), "2024-03-01T10:00:00.123456Z");
    }

    #[test]
    fn test_malformed_amount_is_corrupt() {
        let mut row = tx_row();
        row.amount = "lots".to_string();
        assert!(matches!(
            Transaction::try_from(row),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_is_corrupt() {
        let mut row = tx_row();
        row.kind = "REFUND".to_string();
        assert!(matches!(
            Transaction::try_from(row),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
