//! # Tally Reports
//!
//! Accountability reports for a single project: identity and budget, the
//! ordered ledger, the ordered audit trail, the balance and a fresh
//! integrity check, built in one pass.
//!
//! ## Exporters
//!
//! - [`JsonExporter`] - the stable serialized shape
//! - [`MarkdownExporter`] - human-readable accountability statement
//! - [`CsvExporter`] - transaction ledger with per-row integrity status
//!
//! ## Example
//!
//! ```rust,ignore
//! use tally_report::{AccountabilityReportBuilder, MarkdownExporter, ReportExporter};
//!
//! let report = AccountabilityReportBuilder::new(&signer).build(&store, project_id).await?;
//! let statement = MarkdownExporter::new().export(&report);
//! ```

pub mod builder;
pub mod exporters;
pub mod report;

pub use builder::AccountabilityReportBuilder;
pub use exporters::{CsvExporter, JsonExporter, MarkdownExporter, ReportExporter};
pub use report::AccountabilityReport;
