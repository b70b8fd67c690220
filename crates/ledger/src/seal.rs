//! Sealing records with both fingerprints, and checking stored seals

use crate::canonical::Canonical;
use crate::error::LedgerResult;
use crate::hash;
use crate::signature::SignatureService;
use chrono::{DateTime, Utc};
use tally_core::{AuditEntry, NewTransaction, Transaction};
use uuid::Uuid;

/// The pair of fingerprints stored alongside a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seal {
    pub data_hash: String,
    pub signature: String,
}

impl Seal {
    /// Compute both fingerprints over a record's canonical bytes
    pub fn compute<C: Canonical + ?Sized>(
        record: &C,
        signer: &SignatureService,
    ) -> LedgerResult<Self> {
        let bytes = record.canonical_bytes();
        Ok(Self {
            data_hash: hash::digest(&bytes),
            signature: signer.sign(&bytes, record.actor_id())?,
        })
    }
}

/// A persisted record carrying its own seal
pub trait Sealed: Canonical {
    fn record_id(&self) -> Uuid;
    fn stored_hash(&self) -> &str;
    fn stored_signature(&self) -> &str;
}

impl Sealed for Transaction {
    fn record_id(&self) -> Uuid {
        self.id
    }

    fn stored_hash(&self) -> &str {
        &self.data_hash
    }

    fn stored_signature(&self) -> &str {
        &self.signature
    }
}

impl Sealed for AuditEntry {
    fn record_id(&self) -> Uuid {
        self.id
    }

    fn stored_hash(&self) -> &str {
        &self.data_hash
    }

    fn stored_signature(&self) -> &str {
        &self.signature
    }
}

/// Outcome of re-deriving a stored seal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealCheck {
    pub hash_ok: bool,
    pub signature_ok: bool,
}

impl SealCheck {
    /// Either mismatch on its own marks the record as tampered
    pub fn is_intact(&self) -> bool {
        self.hash_ok && self.signature_ok
    }
}

/// Recompute hash and signature independently and compare to what is stored
pub fn check_seal<S: Sealed + ?Sized>(record: &S, signer: &SignatureService) -> SealCheck {
    let bytes = record.canonical_bytes();
    SealCheck {
        hash_ok: hash::verify(&bytes, record.stored_hash()),
        signature_ok: signer.verify(&bytes, record.stored_signature()),
    }
}

/// Validate and seal a new transaction.
///
/// This is the step the transaction-creation workflow runs before
/// persistence; the returned value is final and must be stored as-is.
pub fn seal_transaction(
    new_tx: NewTransaction,
    id: Uuid,
    created_at: DateTime<Utc>,
    signer: &SignatureService,
) -> LedgerResult<Transaction> {
    new_tx.validate(created_at.date_naive())?;
    let seal = Seal::compute(&new_tx, signer)?;

    Ok(Transaction {
        id,
        amount: new_tx.amount,
        date: new_tx.date,
        kind: new_tx.kind,
        bank_account_id: new_tx.bank_account_id,
        accounting_account_id: new_tx.accounting_account_id,
        signature: seal.signature,
        data_hash: seal.data_hash,
        created_at: tally_core::truncate_micros(created_at),
        created_by: new_tx.created_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::signature::SigningKey;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_core::{Amount, CoreError, TransactionKind};

    fn signer() -> SignatureService {
        SignatureService::new(SigningKey::generate())
    }

    fn new_tx() -> NewTransaction {
        NewTransaction {
            amount: Amount::new(dec!(5000)).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            kind: TransactionKind::Debit,
            bank_account_id: Uuid::new_v4(),
            accounting_account_id: Uuid::new_v4(),
            created_by: "alice".to_string(),
        }
    }

    fn sealed(signer: &SignatureService) -> Transaction {
        seal_transaction(new_tx(), Uuid::new_v4(), Utc::now(), signer).unwrap()
    }

    #[test]
    fn test_fresh_transaction_verifies() {
        let signer = signer();
        let tx = sealed(&signer);
        assert!(!tx.data_hash.is_empty());
        assert!(!tx.signature.is_empty());
        assert!(check_seal(&tx, &signer).is_intact());
    }

    #[test]
    fn test_each_field_change_breaks_both_checks() {
        let signer = signer();
        let tx = sealed(&signer);

        let mutations: Vec<Box<dyn Fn(&mut Transaction)>> = vec![
            Box::new(|t: &mut Transaction| t.amount = Amount::new(dec!(5001)).unwrap()),
            Box::new(|t: &mut Transaction| t.date = t.date.succ_opt().unwrap()),
            Box::new(|t: &mut Transaction| t.kind = TransactionKind::Credit),
            Box::new(|t: &mut Transaction| t.bank_account_id = Uuid::new_v4()),
            Box::new(|t: &mut Transaction| t.accounting_account_id = Uuid::new_v4()),
            Box::new(|t: &mut Transaction| t.created_by = "mallory".to_string()),
        ];

        for mutate in mutations {
            let mut tampered = tx.clone();
            mutate(&mut tampered);
            let check = check_seal(&tampered, &signer);
            assert!(!check.hash_ok);
            assert!(!check.signature_ok);
        }
    }

    #[test]
    fn test_rehashed_tamper_still_fails_signature() {
        let signer = signer();
        let mut tx = sealed(&signer);
        tx.amount = Amount::new(dec!(1)).unwrap();
        tx.data_hash = hash::hash_record(&tx);

        let check = check_seal(&tx, &signer);
        assert!(check.hash_ok);
        assert!(!check.signature_ok);
        assert!(!check.is_intact());
    }

    #[test]
    fn test_future_date_is_rejected_before_sealing() {
        let mut input = new_tx();
        input.date = NaiveDate::from_ymd_opt(2999, 1, 1).unwrap();
        let result = seal_transaction(input, Uuid::new_v4(), Utc::now(), &signer());
        assert!(matches!(
            result,
            Err(LedgerError::Domain(CoreError::FutureDate { .. }))
        ));
    }
}
