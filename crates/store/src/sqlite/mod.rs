//! SQLite store (sqlx)

pub mod repos;
pub mod schema;

pub use repos::{AuditEntryRepo, BankAccountRepo, ProjectRepo, TransactionRepo};

use crate::error::StoreResult;
use crate::filter::{AuditFilter, TransactionFilter};
use crate::traits::{LedgerReader, Store, UnitOfWork};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};
use tally_core::{AuditEntry, BankAccount, Project, ProjectStatus, Transaction};
use uuid::Uuid;

/// Store backed by a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to a SQLite database URL (e.g. `sqlite:tally.db?mode=rwc`)
    pub async fn connect(db_url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create tables, indexes and append-only triggers
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in schema::SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("SQLite schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LedgerReader for SqliteStore {
    async fn load_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        ProjectRepo::get_by_id(&self.pool, id).await
    }

    async fn load_bank_account(&self, id: Uuid) -> StoreResult<Option<BankAccount>> {
        BankAccountRepo::get_by_id(&self.pool, id).await
    }

    async fn load_transaction(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        TransactionRepo::get_by_id(&self.pool, id).await
    }

    async fn load_transactions(
        &self,
        bank_account_id: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        TransactionRepo::get_by_account(&self.pool, bank_account_id, filter).await
    }

    async fn load_audit_entries(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>> {
        AuditEntryRepo::find(&self.pool, filter).await
    }
}

#[async_trait]
impl Store for SqliteStore {
    type Work = SqliteWork;

    async fn begin(&self) -> StoreResult<SqliteWork> {
        let tx = self.pool.begin().await?;
        Ok(SqliteWork { tx })
    }
}

/// Unit of work wrapping one SQLite transaction
pub struct SqliteWork {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl UnitOfWork for SqliteWork {
    fn is_atomic(&self) -> bool {
        true
    }

    async fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        ProjectRepo::insert(&mut *self.tx, project).await
    }

    async fn insert_bank_account(&mut self, account: &BankAccount) -> StoreResult<()> {
        BankAccountRepo::insert(&mut *self.tx, account).await
    }

    async fn update_project_status(&mut self, id: Uuid, status: ProjectStatus) -> StoreResult<()> {
        ProjectRepo::update_status(&mut *self.tx, id, status).await
    }

    async fn insert_transaction(&mut self, tx: &Transaction) -> StoreResult<()> {
        TransactionRepo::insert(&mut *self.tx, tx).await
    }

    async fn append_audit_entry(&mut self, entry: &AuditEntry) -> StoreResult<()> {
        AuditEntryRepo::append(&mut *self.tx, entry).await
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        tracing::debug!(store = "sqlite", "Unit of work committed");
        Ok(())
    }
}
