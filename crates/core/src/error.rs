//! Core domain errors

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Malformed amount: {0}")]
    Malformed(String),
}

/// Errors raised when a domain record violates its invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("Transaction amount must be positive")]
    ZeroAmount,

    #[error("Transaction date {date} is in the future (today is {today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("{field} cannot be the nil id")]
    NilId { field: &'static str },

    #[error("Unknown {kind} code: {value}")]
    UnknownCode { kind: &'static str, value: String },
}
