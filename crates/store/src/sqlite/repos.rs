//! Query functions for the SQLite tables
//!
//! Every function takes any sqlx executor, so the same query runs against
//! the pool for reads and against an open transaction for writes.

use crate::error::{StoreError, StoreResult};
use crate::filter::{AuditFilter, TransactionFilter};
use crate::sqlite::schema::*;
use sqlx::{Executor, QueryBuilder, Sqlite};
use tally_core::{AuditEntry, BankAccount, Project, ProjectStatus, Transaction};
use uuid::Uuid;

fn map_insert_error(err: sqlx::Error, entity: &str, id: Uuid) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::already_exists(entity, id)
        }
        _ => StoreError::Database(err),
    }
}

// ============================================================================
// Bank accounts
// ============================================================================

pub struct BankAccountRepo;

impl BankAccountRepo {
    pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<BankAccount>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, BankAccountRow>("SELECT * FROM bank_accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(executor)
            .await?;
        row.map(BankAccount::try_from).transpose()
    }

    pub async fn insert<'e, E>(executor: E, account: &BankAccount) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "INSERT INTO bank_accounts (id, name, bank_name, account_number, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(account.id.to_string())
        .bind(&account.name)
        .bind(&account.bank_name)
        .bind(&account.account_number)
        .bind(format_timestamp(&account.created_at))
        .execute(executor)
        .await
        .map_err(|e| map_insert_error(e, "BankAccount", account.id))?;
        Ok(())
    }
}

// ============================================================================
// Projects
// ============================================================================

pub struct ProjectRepo;

impl ProjectRepo {
    pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<Project>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(executor)
            .await?;
        row.map(Project::try_from).transpose()
    }

    pub async fn insert<'e, E>(executor: E, project: &Project) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, description, budget, bank_account_id, status, created_at, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id.to_string())
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.budget.value().to_string())
        .bind(project.bank_account_id.map(|id| id.to_string()))
        .bind(project.status.code())
        .bind(format_timestamp(&project.created_at))
        .bind(&project.created_by)
        .execute(executor)
        .await
        .map_err(|e| map_insert_error(e, "Project", project.id))?;
        Ok(())
    }

    pub async fn update_status<'e, E>(executor: E, id: Uuid, status: ProjectStatus) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
            .bind(status.code())
            .bind(id.to_string())
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Project", id));
        }
        Ok(())
    }
}

// ============================================================================
// Transactions (insert + read only)
// ============================================================================

pub struct TransactionRepo;

impl TransactionRepo {
    pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> StoreResult<Option<Transaction>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, amount, date, kind, bank_account_id, accounting_account_id,
                   signature, data_hash, created_at, created_by
            FROM transactions WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;
        row.map(Transaction::try_from).transpose()
    }

    pub async fn get_by_account<'e, E>(
        executor: E,
        bank_account_id: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT id, amount, date, kind, bank_account_id, accounting_account_id,
                   signature, data_hash, created_at, created_by
            FROM transactions WHERE bank_account_id =
            "#,
        );
        qb.push_bind(bank_account_id.to_string());

        if let Some(from) = filter.from {
            qb.push(" AND date >= ").push_bind(from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = filter.to {
            qb.push(" AND date <= ").push_bind(to.format("%Y-%m-%d").to_string());
        }
        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind.code());
        }
        qb.push(" ORDER BY date ASC, seq ASC");

        let rows = qb
            .build_query_as::<TransactionRow>()
            .fetch_all(executor)
            .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    pub async fn insert<'e, E>(executor: E, tx: &Transaction) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, amount, date, kind, bank_account_id, accounting_account_id,
                                      signature, data_hash, created_at, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.id.to_string())
        .bind(tx.amount.value().to_string())
        .bind(tx.date.format("%Y-%m-%d").to_string())
        .bind(tx.kind.code())
        .bind(tx.bank_account_id.to_string())
        .bind(tx.accounting_account_id.to_string())
        .bind(&tx.signature)
        .bind(&tx.data_hash)
        .bind(format_timestamp(&tx.created_at))
        .bind(&tx.created_by)
        .execute(executor)
        .await
        .map_err(|e| map_insert_error(e, "Transaction", tx.id))?;
        Ok(())
    }
}

// ============================================================================
// Audit entries (append + read only)
// ============================================================================

pub struct AuditEntryRepo;

fn entity_ids_json(ids: &[Uuid]) -> String {
    let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    serde_json::Value::from(ids).to_string()
}

impl AuditEntryRepo {
    pub async fn find<'e, E>(executor: E, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT id, actor_id, action, entity_type, entity_id, timestamp,
                   previous_value, new_value, signature, data_hash
            FROM audit_entries WHERE 1 = 1
            "#,
        );

        if !filter.entity_ids.is_empty() {
            // one JSON array parameter, so the id count never hits the bind limit
            qb.push(" AND entity_id IN (SELECT value FROM json_each(")
                .push_bind(entity_ids_json(&filter.entity_ids))
                .push("))");
        }
        if let Some(ref entity_type) = filter.entity_type {
            qb.push(" AND entity_type = ").push_bind(entity_type.clone());
        }
        if let Some(action) = filter.action {
            qb.push(" AND action = ").push_bind(action.code());
        }
        if let Some(ref text) = filter.new_value_contains {
            qb.push(" AND instr(new_value, ").push_bind(text.clone()).push(") > 0");
        }
        if let Some(ref actor_id) = filter.actor_id {
            qb.push(" AND actor_id = ").push_bind(actor_id.clone());
        }
        if let Some(from) = filter.from {
            qb.push(" AND timestamp >= ").push_bind(format_timestamp(&from));
        }
        if let Some(to) = filter.to {
            qb.push(" AND timestamp <= ").push_bind(format_timestamp(&to));
        }
        qb.push(" ORDER BY timestamp ASC, seq ASC");

        let rows = qb
            .build_query_as::<AuditEntryRow>()
            .fetch_all(executor)
            .await?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    pub async fn append<'e, E>(executor: E, entry: &AuditEntry) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_entries (id, actor_id, action, entity_type, entity_id, timestamp,
                                       previous_value, new_value, signature, data_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.actor_id)
        .bind(entry.action.code())
        .bind(&entry.entity_type)
        .bind(entry.entity_id.to_string())
        .bind(format_timestamp(&entry.timestamp))
        .bind(&entry.previous_value)
        .bind(&entry.new_value)
        .bind(&entry.signature)
        .bind(&entry.data_hash)
        .execute(executor)
        .await
        .map_err(|e| map_insert_error(e, "AuditEntry", entry.id))?;
        Ok(())
    }
}
