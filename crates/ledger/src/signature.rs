//! Keyed signatures over canonical bytes
//!
//! A signature is HMAC-SHA-256 keyed with the environment's signing key.
//! Only a holder of that key can produce one, and because the actor id is
//! part of the signed fields the signature also pins *who* acted.
//!
//! The key comes from a `KeyProvider` at construction and is read-only
//! afterwards; `SignatureService` is cheap to clone and safe to share
//! across tasks.

use crate::canonical::Canonical;
use crate::error::{LedgerError, LedgerResult};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Minimum signing key length in bytes
pub const MIN_KEY_LEN: usize = 32;

/// Secret key material. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn from_bytes(bytes: Vec<u8>) -> LedgerResult<Self> {
        if bytes.len() < MIN_KEY_LEN {
            return Err(LedgerError::InvalidKey {
                reason: format!(
                    "key must be at least {} bytes, got {}",
                    MIN_KEY_LEN,
                    bytes.len()
                ),
            });
        }
        Ok(Self(bytes))
    }

    /// Parse a hex-encoded key (surrounding whitespace ignored)
    pub fn from_hex(hex_key: &str) -> LedgerResult<Self> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| LedgerError::InvalidKey {
            reason: format!("invalid key hex: {}", e),
        })?;
        Self::from_bytes(bytes)
    }

    /// Generate a new random 32-byte key
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Export as hex (for storage by the operator, never for logs)
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    fn mac(&self) -> LedgerResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.0).map_err(|e| LedgerError::InvalidKey {
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Source of the environment's signing key
pub trait KeyProvider: Send + Sync {
    /// Human-readable name of the source, used in error messages
    fn source_name(&self) -> String;

    /// Load the signing key
    fn signing_key(&self) -> LedgerResult<SigningKey>;
}

/// Key handed over directly (tests, embedding callers)
pub struct StaticKeyProvider {
    key: SigningKey,
}

impl StaticKeyProvider {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn source_name(&self) -> String {
        "static".to_string()
    }

    fn signing_key(&self) -> LedgerResult<SigningKey> {
        Ok(self.key.clone())
    }
}

/// Hex key read from an environment variable
pub struct EnvKeyProvider {
    var: String,
}

impl EnvKeyProvider {
    pub const DEFAULT_VAR: &'static str = "TALLY_SIGNING_KEY";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvKeyProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl KeyProvider for EnvKeyProvider {
    fn source_name(&self) -> String {
        format!("env:{}", self.var)
    }

    fn signing_key(&self) -> LedgerResult<SigningKey> {
        let value = std::env::var(&self.var).map_err(|e| LedgerError::KeyUnavailable {
            source_name: self.source_name(),
            reason: e.to_string(),
        })?;
        SigningKey::from_hex(&value)
    }
}

/// Hex key read from a file (as written by `tally keygen`)
pub struct FileKeyProvider {
    path: PathBuf,
}

impl FileKeyProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl KeyProvider for FileKeyProvider {
    fn source_name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn signing_key(&self) -> LedgerResult<SigningKey> {
        let value = std::fs::read_to_string(&self.path).map_err(|e| {
            LedgerError::KeyUnavailable {
                source_name: self.source_name(),
                reason: e.to_string(),
            }
        })?;
        SigningKey::from_hex(&value)
    }
}

/// Signs and verifies canonical bytes with the environment's key
#[derive(Clone)]
pub struct SignatureService {
    key: Arc<SigningKey>,
}

impl SignatureService {
    pub fn new(key: SigningKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Load the key once from a provider
    pub fn from_provider(provider: &dyn KeyProvider) -> LedgerResult<Self> {
        let key = provider.signing_key()?;
        tracing::debug!(source = %provider.source_name(), "Signing key loaded");
        Ok(Self::new(key))
    }

    /// Sign canonical bytes on behalf of `actor_id`.
    ///
    /// The actor must already be one of the encoded fields; the argument
    /// is checked here so an anonymous signature cannot be produced.
    pub fn sign(&self, bytes: &[u8], actor_id: &str) -> LedgerResult<String> {
        if actor_id.trim().is_empty() {
            return Err(LedgerError::Validation(
                "cannot sign without an actor id".to_string(),
            ));
        }
        let mut mac = self.key.mac()?;
        mac.update(bytes);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of a hex signature against recomputed bytes
    pub fn verify(&self, bytes: &[u8], signature: &str) -> bool {
        let Ok(sig_bytes) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = self.key.mac() else {
            return false;
        };
        mac.update(bytes);
        mac.verify_slice(&sig_bytes).is_ok()
    }

    pub fn sign_record<C: Canonical + ?Sized>(&self, record: &C) -> LedgerResult<String> {
        self.sign(&record.canonical_bytes(), record.actor_id())
    }

    pub fn verify_record<C: Canonical + ?Sized>(&self, record: &C, signature: &str) -> bool {
        self.verify(&record.canonical_bytes(), signature)
    }
}

impl fmt::Debug for SignatureService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureService").finish_non_exhaustive()
    }
}
