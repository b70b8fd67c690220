//! Canonical encoding - the exact bytes that get hashed and signed
//!
//! Layout (version 1):
//!
//! ```text
//! header := "TALLY" 0x00 | version u8 | len u64 BE | domain utf8
//! field  := tag u8 | [len u64 BE | value utf8]      (no body for Absent)
//!
//! tag    := 0x00 Absent | 0x01 Text | 0x02 Id | 0x03 Decimal
//!         | 0x04 Date | 0x05 Timestamp | 0x06 Code
//! ```
//!
//! Values are rendered as fixed text: ids as lowercase hyphenated UUIDs,
//! decimals normalized (no trailing zeros, `.` separator), dates as
//! `YYYY-MM-DD`, timestamps as RFC 3339 UTC with microseconds. Nothing goes
//! through a general-purpose serializer, so field order and defaulting
//! cannot drift between releases.
//!
//! The field list for each record type is frozen per domain string. Changing
//! it means a new domain (`transaction/v2`), never an edit to an existing one,
//! or historical records stop verifying.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use tally_core::{Amount, AuditEntry, NewTransaction, Transaction, TransactionKind};
use uuid::Uuid;

/// Format version written into every header
pub const CANONICAL_VERSION: u8 = 1;

const MAGIC: &[u8] = b"TALLY\0";

pub const TRANSACTION_DOMAIN: &str = "transaction/v1";
pub const AUDIT_ENTRY_DOMAIN: &str = "audit_entry/v1";

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
enum Tag {
    Absent = 0x00,
    Text = 0x01,
    Id = 0x02,
    Decimal = 0x03,
    Date = 0x04,
    Timestamp = 0x05,
    Code = 0x06,
}

/// Builder for canonical byte sequences.
///
/// The API only accepts the supported field types, so an unsupported field
/// is a compile error rather than a runtime failure.
#[derive(Debug, Clone)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Start a new encoding for the given record domain
    pub fn new(domain: &str) -> Self {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(MAGIC);
        buf.push(CANONICAL_VERSION);
        write_len_prefixed(&mut buf, domain.as_bytes());
        Self { buf }
    }

    pub fn text(self, value: &str) -> Self {
        self.field(Tag::Text, value)
    }

    /// Nullable text: `None` encodes as the Absent tag, distinct from `""`
    pub fn optional_text(mut self, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(Tag::Text, v),
            None => {
                self.buf.push(Tag::Absent as u8);
                self
            }
        }
    }

    pub fn id(self, value: Uuid) -> Self {
        let text = value.hyphenated().to_string();
        self.field(Tag::Id, &text)
    }

    pub fn decimal(self, value: Decimal) -> Self {
        let text = value.normalize().to_string();
        self.field(Tag::Decimal, &text)
    }

    pub fn amount(self, value: Amount) -> Self {
        self.decimal(value.value())
    }

    pub fn date(self, value: NaiveDate) -> Self {
        let text = value.format("%Y-%m-%d").to_string();
        self.field(Tag::Date, &text)
    }

    pub fn timestamp(self, value: DateTime<Utc>) -> Self {
        let text = value.to_rfc3339_opts(SecondsFormat::Micros, true);
        self.field(Tag::Timestamp, &text)
    }

    /// Stable enum code such as `DEBIT` or `CREATE_TRANSACTION`
    pub fn code(self, value: &'static str) -> Self {
        self.field(Tag::Code, value)
    }

    /// Finish and return the encoded bytes
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn field(mut self, tag: Tag, value: &str) -> Self {
        self.buf.push(tag as u8);
        write_len_prefixed(&mut self.buf, value.as_bytes());
        self
    }
}

fn write_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    buf.extend_from_slice(bytes);
}

/// A record with a frozen canonical field list
pub trait Canonical {
    /// Identity of the actor the signature binds
    fn actor_id(&self) -> &str;

    /// Canonical bytes of the signed fields
    fn canonical_bytes(&self) -> Vec<u8>;
}

fn transaction_fields(
    amount: Amount,
    date: NaiveDate,
    kind: TransactionKind,
    bank_account_id: Uuid,
    accounting_account_id: Uuid,
    created_by: &str,
) -> Vec<u8> {
    CanonicalEncoder::new(TRANSACTION_DOMAIN)
        .amount(amount)
        .date(date)
        .code(kind.code())
        .id(bank_account_id)
        .id(accounting_account_id)
        .text(created_by)
        .finish()
}

impl Canonical for Transaction {
    fn actor_id(&self) -> &str {
        &self.created_by
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        transaction_fields(
            self.amount,
            self.date,
            self.kind,
            self.bank_account_id,
            self.accounting_account_id,
            &self.created_by,
        )
    }
}

impl Canonical for NewTransaction {
    fn actor_id(&self) -> &str {
        &self.created_by
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        transaction_fields(
            self.amount,
            self.date,
            self.kind,
            self.bank_account_id,
            self.accounting_account_id,
            &self.created_by,
        )
    }
}

impl Canonical for AuditEntry {
    fn actor_id(&self) -> &str {
        &self.actor_id
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        CanonicalEncoder::new(AUDIT_ENTRY_DOMAIN)
            .text(&self.actor_id)
            .code(self.action.code())
            .text(&self.entity_type)
            .id(self.entity_id)
            .timestamp(self.timestamp)
            .optional_text(self.previous_value.as_deref())
            .optional_text(self.new_value.as_deref())
            .finish()
    }
}
