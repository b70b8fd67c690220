//! Projects and the bank accounts that fund them

use crate::amount::Amount;
use crate::entity::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle state of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Closed,
}

impl ProjectStatus {
    pub fn code(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Closed => "CLOSED",
        }
    }
}

/// A budgeted project.
///
/// `budget` is the allowed net-debit ceiling for the project's bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub budget: Amount,
    pub bank_account_id: Option<Uuid>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Entity for Project {
    const ENTITY_TYPE: &'static str = "Project";

    fn entity_id(&self) -> Uuid {
        self.id
    }
}

/// Bank account whose transactions make up a project's ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: Uuid,
    pub name: String,
    pub bank_name: String,
    pub account_number: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for BankAccount {
    const ENTITY_TYPE: &'static str = "BankAccount";

    fn entity_id(&self) -> Uuid {
        self.id
    }
}
