//! Tally Core - Domain types
//!
//! This crate contains the records the audit subsystem signs and verifies:
//! - `Amount`: Non-negative fixed-point decimal for money
//! - `Transaction`: Immutable financial movement on a bank account
//! - `AuditEntry`: Immutable record of one state change
//! - `Project` / `BankAccount`: The entities a report is built around
//! - `Entity`: Explicit identifier access, used instead of reflection

pub mod amount;
pub mod audit;
pub mod entity;
pub mod error;
pub mod project;
pub mod transaction;

pub use amount::Amount;
pub use audit::{ActionType, AuditEntry};
pub use entity::Entity;
pub use error::{AmountError, CoreError};
pub use project::{BankAccount, Project, ProjectStatus};
pub use transaction::{NewTransaction, Transaction, TransactionKind};

/// Truncate a timestamp to microsecond precision.
///
/// Every timestamp that ends up in canonical bytes goes through this, so a
/// round trip through storage reproduces it exactly.
pub fn truncate_micros(ts: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    use chrono::{DurationRound, TimeDelta};
    ts.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(ts)
}
