//! Query filters for bulk loads

use chrono::{DateTime, NaiveDate, Utc};
use tally_core::{ActionType, AuditEntry, Transaction, TransactionKind};
use uuid::Uuid;

/// Narrows `load_transactions` for one bank account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.to = Some(date);
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.from.map_or(true, |d| tx.date >= d)
            && self.to.map_or(true, |d| tx.date <= d)
            && self.kind.map_or(true, |k| tx.kind == k)
    }
}

/// Narrows `load_audit_entries`. Every set criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Any of these entity ids (empty = no restriction)
    pub entity_ids: Vec<Uuid>,
    pub entity_type: Option<String>,
    pub action: Option<ActionType>,
    pub actor_id: Option<String>,
    /// Substring of the `new_value` snapshot
    pub new_value_contains: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, id: Uuid) -> Self {
        self.entity_ids.push(id);
        self
    }

    pub fn entities(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.entity_ids.extend(ids);
        self
    }

    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn action(mut self, action: ActionType) -> Self {
        self.action = Some(action);
        self
    }

    pub fn new_value_contains(mut self, text: impl Into<String>) -> Self {
        self.new_value_contains = Some(text.into());
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        (self.entity_ids.is_empty() || self.entity_ids.contains(&entry.entity_id))
            && self
                .entity_type
                .as_ref()
                .map_or(true, |t| &entry.entity_type == t)
            && self.action.map_or(true, |a| entry.action == a)
            && self.actor_id.as_ref().map_or(true, |a| &entry.actor_id == a)
            && self.new_value_contains.as_ref().map_or(true, |text| {
                entry
                    .new_value
                    .as_deref()
                    .is_some_and(|value| value.contains(text.as_str()))
            })
            && self.from.map_or(true, |f| entry.timestamp >= f)
            && self.to.map_or(true, |t| entry.timestamp <= t)
    }
}
