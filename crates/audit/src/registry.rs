//! Project and bank account mutations with their audit entries

use crate::error::{AuditError, AuditResult};
use crate::log::AuditLog;
use chrono::Utc;
use tally_core::{truncate_micros, Amount, BankAccount, Project, ProjectStatus};
use tally_ledger::SignatureService;
use tally_store::{Store, UnitOfWork};
use tracing::info;
use uuid::Uuid;

/// Details for a new project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub budget: Amount,
    pub bank_account_id: Option<Uuid>,
}

/// Details for a new bank account
#[derive(Debug, Clone)]
pub struct NewBankAccount {
    pub name: String,
    pub bank_name: String,
    pub account_number: String,
}

#[derive(Clone)]
pub struct ProjectRegistry {
    audit_log: AuditLog,
}

impl ProjectRegistry {
    pub fn new(signer: &SignatureService) -> Self {
        Self {
            audit_log: AuditLog::new(signer),
        }
    }

    pub async fn create_bank_account<S: Store>(
        &self,
        store: &S,
        actor_id: &str,
        input: NewBankAccount,
    ) -> AuditResult<BankAccount> {
        require_text("name", &input.name)?;
        require_text("account_number", &input.account_number)?;

        let account = BankAccount {
            id: Uuid::new_v4(),
            name: input.name,
            bank_name: input.bank_name,
            account_number: input.account_number,
            created_at: truncate_micros(Utc::now()),
        };

        let mut work = store.begin().await?;
        work.insert_bank_account(&account).await?;
        self.audit_log.record_create(&mut work, actor_id, &account).await?;
        work.commit().await?;

        info!(bank_account_id = %account.id, actor_id, "Bank account created");
        Ok(account)
    }

    pub async fn create_project<S: Store>(
        &self,
        store: &S,
        actor_id: &str,
        input: NewProject,
    ) -> AuditResult<Project> {
        require_text("name", &input.name)?;
        if let Some(account_id) = input.bank_account_id {
            if store.load_bank_account(account_id).await?.is_none() {
                return Err(AuditError::not_found("BankAccount", account_id));
            }
        }

        let project = Project {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            budget: input.budget,
            bank_account_id: input.bank_account_id,
            status: ProjectStatus::Active,
            created_at: truncate_micros(Utc::now()),
            created_by: actor_id.to_string(),
        };

        let mut work = store.begin().await?;
        work.insert_project(&project).await?;
        self.audit_log.record_create(&mut work, actor_id, &project).await?;
        work.commit().await?;

        info!(project_id = %project.id, budget = %project.budget, actor_id, "Project created");
        Ok(project)
    }

    /// Close an active project; closing twice is rejected
    pub async fn close_project<S: Store>(
        &self,
        store: &S,
        actor_id: &str,
        project_id: Uuid,
    ) -> AuditResult<Project> {
        let before = store
            .load_project(project_id)
            .await?
            .ok_or_else(|| AuditError::not_found("Project", project_id))?;
        if before.status == ProjectStatus::Closed {
            return Err(AuditError::validation(format!(
                "project {project_id} is already closed"
            )));
        }

        let after = Project {
            status: ProjectStatus::Closed,
            ..before.clone()
        };

        let mut work = store.begin().await?;
        work.update_project_status(project_id, after.status).await?;
        self.audit_log
            .record_status_change(&mut work, actor_id, &before, &after)
            .await?;
        work.commit().await?;

        info!(project_id = %project_id, actor_id, "Project closed");
        Ok(after)
    }
}

fn require_text(field: &str, value: &str) -> AuditResult<()> {
    if value.trim().is_empty() {
        return Err(AuditError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
