//! Explicit identity for audited entities

use uuid::Uuid;

/// An entity whose state changes are recorded in the audit log.
///
/// The audit log needs the entity's type name and identifier for every
/// entry; implementors expose both directly.
pub trait Entity {
    /// Stable type name written into `AuditEntry::entity_type`
    const ENTITY_TYPE: &'static str;

    /// The entity's identifier
    fn entity_id(&self) -> Uuid;
}
