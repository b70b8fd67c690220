//! Tally CLI - Main entry point

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tally_cli::commands::{self, ReportFormat};
use tally_cli::{AppConfig, AppContext};
use tally_store::AuditFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Tally - project budgets with a signed, verifiable audit trail", long_about = None)]
struct Cli {
    /// Database URL (overrides TALLY_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// File holding the hex signing key (overrides TALLY_KEY_FILE)
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,

    /// Directory for generated reports (overrides TALLY_REPORT_DIR)
    #[arg(long, global = true)]
    report_dir: Option<PathBuf>,

    /// Acting user recorded on every change (overrides TALLY_ACTOR)
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new signing key
    Keygen {
        /// Write the key to this file instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create the database schema
    Init,

    /// Manage bank accounts
    #[command(subcommand)]
    BankAccount(BankAccountCommand),

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Record transactions
    #[command(subcommand)]
    Tx(TxCommand),

    /// Inspect the audit trail
    #[command(subcommand)]
    Audit(AuditCommand),

    /// Verify hashes and signatures of a project's records
    Verify {
        /// Project ID
        project: Uuid,
    },

    /// Build an accountability report
    Report {
        /// Project ID
        project: Uuid,
        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ReportFormat,
        /// Print to stdout instead of writing to the report directory
        #[arg(long)]
        stdout: bool,
    },
}

#[derive(Subcommand)]
enum BankAccountCommand {
    /// Register a bank account
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        bank_name: String,
        #[arg(long)]
        account_number: String,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project
    Create {
        #[arg(long)]
        name: String,
        /// Allowed net debit
        #[arg(long)]
        budget: Decimal,
        #[arg(long)]
        description: Option<String>,
        /// Bank account funding the project
        #[arg(long)]
        bank_account: Option<Uuid>,
    },

    /// Close an active project
    Close {
        /// Project ID
        project: Uuid,
    },
}

#[derive(Subcommand)]
enum TxCommand {
    /// Record a credit or debit
    Record {
        #[arg(long)]
        bank_account: Uuid,
        #[arg(long)]
        accounting_account: Uuid,
        #[arg(long)]
        amount: Decimal,
        /// credit or debit
        #[arg(long)]
        kind: String,
        /// Value date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Correct a transaction by recording its opposite
    Offset {
        /// Transaction ID to offset
        transaction: Uuid,
        /// Value date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum AuditCommand {
    /// List audit entries, oldest first
    Log {
        /// Filter by entity ID
        #[arg(long)]
        entity: Option<Uuid>,
        /// Filter by entity type (Project, BankAccount, Transaction)
        #[arg(long)]
        entity_type: Option<String>,
        /// Filter by acting user
        #[arg(long)]
        by: Option<String>,
        /// Maximum number of entries to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()
        .with_database_url(cli.database_url)
        .with_key_file(cli.key_file)
        .with_report_dir(cli.report_dir)
        .with_actor(cli.actor);

    match cli.command {
        Commands::Keygen { output } => {
            commands::keygen(output.as_deref())?;
        }

        Commands::Init => {
            commands::init(&config.database_url).await?;
        }

        Commands::BankAccount(BankAccountCommand::Create {
            name,
            bank_name,
            account_number,
        }) => {
            let ctx = AppContext::new(config).await?;
            commands::create_bank_account(&ctx, &name, &bank_name, &account_number).await?;
        }

        Commands::Project(ProjectCommand::Create {
            name,
            budget,
            description,
            bank_account,
        }) => {
            let ctx = AppContext::new(config).await?;
            commands::create_project(&ctx, &name, description, budget, bank_account).await?;
        }

        Commands::Project(ProjectCommand::Close { project }) => {
            let ctx = AppContext::new(config).await?;
            commands::close_project(&ctx, project).await?;
        }

        Commands::Tx(TxCommand::Record {
            bank_account,
            accounting_account,
            amount,
            kind,
            date,
        }) => {
            let ctx = AppContext::new(config).await?;
            commands::record_transaction(&ctx, bank_account, accounting_account, amount, &kind, date)
                .await?;
        }

        Commands::Tx(TxCommand::Offset { transaction, date }) => {
            let ctx = AppContext::new(config).await?;
            commands::offset_transaction(&ctx, transaction, date).await?;
        }

        Commands::Audit(AuditCommand::Log {
            entity,
            entity_type,
            by,
            limit,
        }) => {
            let ctx = AppContext::new(config).await?;
            let mut filter = AuditFilter::new();
            if let Some(id) = entity {
                filter = filter.entity(id);
            }
            if let Some(entity_type) = entity_type {
                filter = filter.entity_type(entity_type);
            }
            if let Some(actor) = by {
                filter = filter.actor(actor);
            }
            commands::audit_log(&ctx, filter, limit).await?;
        }

        Commands::Verify { project } => {
            let ctx = AppContext::new(config).await?;
            commands::verify(&ctx, project).await?;
        }

        Commands::Report {
            project,
            format,
            stdout,
        } => {
            let ctx = AppContext::new(config).await?;
            let output_dir = (!stdout).then(|| ctx.config.report_dir.clone());
            commands::report(&ctx, project, format, output_dir.as_deref()).await?;
        }
    }

    Ok(())
}
