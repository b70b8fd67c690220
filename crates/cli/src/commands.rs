//! CLI commands

use chrono::{NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tally_audit::{IntegrityReport, NewBankAccount, NewProject};
use tally_core::{Amount, NewTransaction, TransactionKind};
use tally_ledger::SigningKey;
use tally_report::{CsvExporter, JsonExporter, MarkdownExporter, ReportExporter};
use tally_store::{AuditFilter, LedgerReader};
use uuid::Uuid;

use crate::context::{open_store, AppContext};

/// Output format of `tally report`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Json,
    #[value(alias = "md")]
    Markdown,
    Csv,
}

impl ReportFormat {
    pub fn exporter(&self) -> Box<dyn ReportExporter> {
        match self {
            ReportFormat::Json => Box::new(JsonExporter::new()),
            ReportFormat::Markdown => Box::new(MarkdownExporter::new()),
            ReportFormat::Csv => Box::new(CsvExporter::new()),
        }
    }
}

/// Generate a signing key, written to `output` or printed
pub fn keygen(output: Option<&Path>) -> Result<(), anyhow::Error> {
    let key = SigningKey::generate();
    let hex_key = key.to_hex();

    match output {
        Some(path) => {
            write_secret(path, &hex_key)?;
            println!("✅ Generated signing key");
            println!("   Saved to: {}", path.display());
            println!();
            println!("To use: export TALLY_KEY_FILE={}", path.display());
        }
        None => {
            println!("✅ Generated signing key");
            println!();
            println!("To use: export TALLY_SIGNING_KEY={}", hex_key);
        }
    }
    Ok(())
}

/// Write a key file readable by the owner only
fn write_secret(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path)?;
    // the mode only applies on creation
    #[cfg(unix)]
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents.as_bytes())
}

/// Create the database schema
pub async fn init(database_url: &str) -> Result<(), anyhow::Error> {
    open_store(database_url).await?;
    println!("✅ Database ready at {}", database_url);
    Ok(())
}

pub async fn create_bank_account(
    ctx: &AppContext,
    name: &str,
    bank_name: &str,
    account_number: &str,
) -> Result<Uuid, anyhow::Error> {
    let account = ctx
        .registry()
        .create_bank_account(
            &ctx.store,
            ctx.actor()?,
            NewBankAccount {
                name: name.to_string(),
                bank_name: bank_name.to_string(),
                account_number: account_number.to_string(),
            },
        )
        .await?;

    println!("✅ Created bank account {} ({})", account.name, account.id);
    Ok(account.id)
}

pub async fn create_project(
    ctx: &AppContext,
    name: &str,
    description: Option<String>,
    budget: Decimal,
    bank_account_id: Option<Uuid>,
) -> Result<Uuid, anyhow::Error> {
    let budget = Amount::new(budget)?;
    let project = ctx
        .registry()
        .create_project(
            &ctx.store,
            ctx.actor()?,
            NewProject {
                name: name.to_string(),
                description,
                budget,
                bank_account_id,
            },
        )
        .await?;

    println!(
        "✅ Created project {} ({}) with budget {}",
        project.name, project.id, project.budget
    );
    Ok(project.id)
}

pub async fn close_project(ctx: &AppContext, project_id: Uuid) -> Result<(), anyhow::Error> {
    let project = ctx
        .registry()
        .close_project(&ctx.store, ctx.actor()?, project_id)
        .await?;
    println!("✅ Closed project {} ({})", project.name, project.id);
    Ok(())
}

pub async fn record_transaction(
    ctx: &AppContext,
    bank_account_id: Uuid,
    accounting_account_id: Uuid,
    amount: Decimal,
    kind: &str,
    date: Option<NaiveDate>,
) -> Result<Uuid, anyhow::Error> {
    let kind: TransactionKind = kind
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown transaction kind: {kind} (credit, debit)"))?;

    let input = NewTransaction {
        amount: Amount::new(amount)?,
        date: date.unwrap_or_else(|| Utc::now().date_naive()),
        kind,
        bank_account_id,
        accounting_account_id,
        created_by: ctx.actor()?.to_string(),
    };
    let (tx, entry) = ctx.recorder().record(&ctx.store, input).await?;

    println!(
        "✅ Recorded {} {} on {} ({})",
        tx.kind, tx.amount, tx.date, tx.id
    );
    println!("   Hash: {}", tx.data_hash);
    println!("   Audit entry: {}", entry.id);
    Ok(tx.id)
}

pub async fn offset_transaction(
    ctx: &AppContext,
    original_id: Uuid,
    date: Option<NaiveDate>,
) -> Result<Uuid, anyhow::Error> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let (tx, _) = ctx
        .recorder()
        .record_offset(&ctx.store, original_id, date, ctx.actor()?)
        .await?;

    println!(
        "✅ Offset {} with {} {} ({})",
        original_id, tx.kind, tx.amount, tx.id
    );
    Ok(tx.id)
}

pub async fn audit_log(
    ctx: &AppContext,
    filter: AuditFilter,
    limit: usize,
) -> Result<(), anyhow::Error> {
    let entries = ctx.store.load_audit_entries(&filter).await?;

    if entries.is_empty() {
        println!("No audit entries found");
        return Ok(());
    }

    let shown = entries.len().min(limit);
    println!("Audit Trail ({} of {} entries):", shown, entries.len());
    println!("{:-<100}", "");
    println!(
        "{:<27} {:<18} {:<12} {:<36} Actor",
        "Timestamp", "Action", "Entity", "Entity ID"
    );
    println!("{:-<100}", "");

    // newest last, so show the tail
    for entry in &entries[entries.len() - shown..] {
        println!(
            "{:<27} {:<18} {:<12} {:<36} {}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            entry.action.to_string(),
            entry.entity_type,
            entry.entity_id.to_string(),
            entry.actor_id
        );
    }
    Ok(())
}

/// Verify a project; an invalid result is returned as an error
pub async fn verify(ctx: &AppContext, project_id: Uuid) -> Result<IntegrityReport, anyhow::Error> {
    let report = ctx.verifier().verify(&ctx.store, project_id).await?;

    println!(
        "Checked {} transactions and {} audit entries",
        report.total_transactions_checked, report.total_audit_entries_checked
    );

    if report.is_valid {
        println!("✅ All records intact");
        return Ok(report);
    }

    for id in &report.tampered_transaction_ids {
        println!("❌ Tampered transaction: {}", id);
    }
    for id in &report.tampered_audit_entry_ids {
        println!("❌ Tampered audit entry: {}", id);
    }
    anyhow::bail!(
        "Integrity compromised: {} tampered records",
        report.tampered_count()
    )
}

/// Build a report and write it to `output_dir`, or to stdout when `None`
pub async fn report(
    ctx: &AppContext,
    project_id: Uuid,
    format: ReportFormat,
    output_dir: Option<&Path>,
) -> Result<Option<PathBuf>, anyhow::Error> {
    let report = ctx.report_builder().build(&ctx.store, project_id).await?;
    let exporter = format.exporter();
    let rendered = exporter.export(&report);

    let Some(dir) = output_dir else {
        print!("{}", rendered);
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let path = dir.join(exporter.file_name(&report));
    std::fs::write(&path, rendered)?;

    println!("✅ Report {} written to {}", report.report_id, path.display());
    if !report.integrity.is_valid {
        println!(
            "⚠️  Integrity compromised: {} tampered records",
            report.integrity.tampered_count()
        );
    }
    if report.balance.is_over_budget {
        println!(
            "⚠️  Over budget: spent {} of {}",
            report.balance.spent, report.balance.budget
        );
    }
    Ok(Some(path))
}
