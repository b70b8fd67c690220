//! Balance calculation over a project's transactions
//!
//! Sign convention:
//! - `balance = Σ credits − Σ debits`
//! - a project's `budget` is the allowed net-debit ceiling
//! - `spent = max(0, −balance)`; the project is over budget iff `spent > budget`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{Amount, Transaction, TransactionKind};

/// Folds transactions into a signed balance
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Credits minus debits. Empty input yields zero.
    pub fn calculate(transactions: &[Transaction]) -> Decimal {
        transactions.iter().fold(Decimal::ZERO, |acc, tx| match tx.kind {
            TransactionKind::Credit => acc + tx.amount.value(),
            TransactionKind::Debit => acc - tx.amount.value(),
        })
    }

    /// True when net spending exceeds the budget ceiling
    pub fn is_over_budget(balance: Decimal, budget: Amount) -> bool {
        -balance > budget.value()
    }

    /// Full breakdown for reporting
    pub fn summarize(transactions: &[Transaction], budget: Amount) -> BalanceSummary {
        let mut total_credits = Decimal::ZERO;
        let mut total_debits = Decimal::ZERO;
        for tx in transactions {
            match tx.kind {
                TransactionKind::Credit => total_credits += tx.amount.value(),
                TransactionKind::Debit => total_debits += tx.amount.value(),
            }
        }

        let balance = total_credits - total_debits;
        let spent = (-balance).max(Decimal::ZERO);

        BalanceSummary {
            total_credits,
            total_debits,
            balance,
            budget: budget.value(),
            spent,
            remaining: budget.value() - spent,
            is_over_budget: Self::is_over_budget(balance, budget),
        }
    }
}

/// Balance breakdown carried in the accountability report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub balance: Decimal,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub is_over_budget: bool,
}
