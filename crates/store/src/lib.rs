//! Tally Store - repository collaborators
//!
//! The audit core never talks to a database directly. It reads through
//! `LedgerReader` and writes through a `UnitOfWork` that the caller opens,
//! fills with the domain mutation *and* its audit entry, then commits.
//!
//! Neither trait has a way to update or delete a transaction or an audit
//! entry; the SQLite schema additionally rejects such statements with
//! triggers.
//!
//! ```rust,ignore
//! let store = SqliteStore::connect("sqlite:tally.db?mode=rwc").await?;
//! store.migrate().await?;
//!
//! let mut work = store.begin().await?;
//! work.insert_transaction(&tx).await?;
//! work.append_audit_entry(&entry).await?;
//! work.commit().await?;
//! ```

pub mod error;
pub mod filter;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use filter::{AuditFilter, TransactionFilter};
pub use memory::{MemoryStore, MemoryWork};
pub use sqlite::{SqliteStore, SqliteWork};
pub use traits::{LedgerReader, Store, UnitOfWork};
