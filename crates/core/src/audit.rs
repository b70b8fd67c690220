//! AuditEntry - immutable record of one state change

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// What kind of change an audit entry documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Create,
    Update,
    StatusChange,
    Delete,
    CreateTransaction,
}

impl ActionType {
    /// Stable code used in canonical encoding and storage
    pub fn code(&self) -> &'static str {
        match self {
            ActionType::Create => "CREATE",
            ActionType::Update => "UPDATE",
            ActionType::StatusChange => "STATUS_CHANGE",
            ActionType::Delete => "DELETE",
            ActionType::CreateTransaction => "CREATE_TRANSACTION",
        }
    }
}

/// One entry of the append-only audit trail.
///
/// Snapshots are opaque serialized state; they are hashed and signed as
/// text and never re-serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: String,
    pub action: ActionType,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub signature: String,
    pub data_hash: String,
}
