//! Tally Ledger - cryptographic fingerprints and balances
//!
//! Every transaction and audit entry carries two fingerprints computed over
//! its canonical bytes:
//! - a SHA-256 data hash (tamper evidence)
//! - an HMAC-SHA-256 signature keyed by the environment's signing key
//!   (non-repudiation: the actor id is one of the signed fields)
//!
//! # Key Types
//! - `CanonicalEncoder`: fixed, versioned byte layout for typed fields
//! - `SignatureService`: signs and verifies canonical bytes
//! - `BalanceCalculator`: folds transactions into a signed balance

pub mod balance;
pub mod canonical;
pub mod error;
pub mod hash;
pub mod seal;
pub mod signature;

pub use balance::{BalanceCalculator, BalanceSummary};
pub use canonical::{Canonical, CanonicalEncoder, CANONICAL_VERSION};
pub use error::{LedgerError, LedgerResult};
pub use seal::{check_seal, seal_transaction, Seal, SealCheck, Sealed};
pub use signature::{
    EnvKeyProvider, FileKeyProvider, KeyProvider, SignatureService, SigningKey,
    StaticKeyProvider, MIN_KEY_LEN,
};
