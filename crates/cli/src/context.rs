//! Application context - wires store, signer and workflows together

use crate::config::AppConfig;
use tally_audit::{IntegrityVerifier, ProjectRegistry, TransactionRecorder};
use tally_ledger::SignatureService;
use tally_report::AccountabilityReportBuilder;
use tally_store::SqliteStore;
use tracing::debug;

pub struct AppContext {
    pub config: AppConfig,
    pub store: SqliteStore,
    pub signer: SignatureService,
}

impl AppContext {
    /// Load the signing key, connect and migrate
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let provider = config.key_provider()?;
        let signer = SignatureService::from_provider(provider.as_ref())?;
        Self::with_signer(config, signer).await
    }

    pub async fn with_signer(config: AppConfig, signer: SignatureService) -> anyhow::Result<Self> {
        let store = open_store(&config.database_url).await?;
        Ok(Self {
            config,
            store,
            signer,
        })
    }

    /// The acting user; every mutation is attributed to one
    pub fn actor(&self) -> anyhow::Result<&str> {
        match self.config.actor.as_deref() {
            Some(actor) if !actor.trim().is_empty() => Ok(actor),
            _ => anyhow::bail!("No actor given: pass --actor or set TALLY_ACTOR"),
        }
    }

    pub fn registry(&self) -> ProjectRegistry {
        ProjectRegistry::new(&self.signer)
    }

    pub fn recorder(&self) -> TransactionRecorder {
        TransactionRecorder::new(&self.signer)
    }

    pub fn verifier(&self) -> IntegrityVerifier {
        IntegrityVerifier::new(&self.signer)
    }

    pub fn report_builder(&self) -> AccountabilityReportBuilder {
        AccountabilityReportBuilder::new(&self.signer)
    }
}

pub async fn open_store(database_url: &str) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::connect(database_url).await?;
    store.migrate().await?;
    debug!(database_url, "Store ready");
    Ok(store)
}
