//! Tally Audit - append-only audit trail and tamper detection
//!
//! # Flow
//! ```text
//! mutation ──► UnitOfWork ◄── AuditLog::append ──► commit
//!                                   (same unit, same commit)
//!
//! IntegrityVerifier::verify(project)
//!     └── reload transactions + audit entries
//!         └── recompute hash and signature for each, compare to stored
//! ```
//!
//! Tampering is a result (`IntegrityReport::is_valid == false`), never an
//! error. Errors are reserved for bad input, missing records and
//! infrastructure failures.

pub mod error;
pub mod history;
pub mod log;
pub mod recorder;
pub mod registry;
pub mod verifier;

pub use error::{AuditError, AuditResult};
pub use history::ProjectHistory;
pub use log::{AuditLog, AuditRecord};
pub use recorder::TransactionRecorder;
pub use registry::{NewBankAccount, NewProject, ProjectRegistry};
pub use verifier::{IntegrityReport, IntegrityVerifier};
