use chrono::{Days, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_audit::{AuditError, NewBankAccount, NewProject, ProjectRegistry, TransactionRecorder};
use tally_core::{ActionType, Amount, AuditEntry, NewTransaction, Project, TransactionKind};
use tally_ledger::{SignatureService, SigningKey};
use tally_report::{AccountabilityReportBuilder, JsonExporter, ReportExporter};
use tally_store::{MemoryStore, Store, UnitOfWork};
use uuid::Uuid;

struct Setup {
    store: MemoryStore,
    signer: SignatureService,
    project: Project,
}

async fn setup(budget: Decimal) -> Setup {
    let store = MemoryStore::new();
    let signer = SignatureService::new(SigningKey::generate());
    let registry = ProjectRegistry::new(&signer);
    let account = registry
        .create_bank_account(
            &store,
            "alice",
            NewBankAccount {
                name: "Operations".to_string(),
                bank_name: "First Bank".to_string(),
                account_number: "001-234".to_string(),
            },
        )
        .await
        .unwrap();
    let project = registry
        .create_project(
            &store,
            "alice",
            NewProject {
                name: "Bridge".to_string(),
                description: None,
                budget: Amount::new(budget).unwrap(),
                bank_account_id: Some(account.id),
            },
        )
        .await
        .unwrap();
    Setup {
        store,
        signer,
        project,
    }
}

async fn record(setup: &Setup, amount: Decimal, kind: TransactionKind, days_ago: u64) -> Uuid {
    let (tx, _) = TransactionRecorder::new(&setup.signer)
        .record(
            &setup.store,
            NewTransaction {
                amount: Amount::new(amount).unwrap(),
                date: Utc::now().date_naive() - Days::new(days_ago),
                kind,
                bank_account_id: setup.project.bank_account_id.unwrap(),
                accounting_account_id: Uuid::new_v4(),
                created_by: "alice".to_string(),
            },
        )
        .await
        .unwrap();
    tx.id
}

#[tokio::test]
async fn test_report_orders_transactions_by_date() {
    let setup = setup(dec!(1000)).await;
    let middle = record(&setup, dec!(10), TransactionKind::Debit, 5).await;
    let newest = record(&setup, dec!(20), TransactionKind::Debit, 1).await;
    let oldest = record(&setup, dec!(30), TransactionKind::Credit, 9).await;

    let report = AccountabilityReportBuilder::new(&setup.signer)
        .build(&setup.store, setup.project.id)
        .await
        .unwrap();

    let ids: Vec<Uuid> = report.transactions.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![oldest, middle, newest]);
    assert!(report
        .audit_entries
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(report.integrity.is_valid);
    assert_eq!(report.integrity.total_transactions_checked, 3);
    assert_eq!(report.balance.balance, dec!(0));
    assert!(!report.balance.is_over_budget);
}

#[tokio::test]
async fn test_report_orders_audit_entries_by_timestamp() {
    let setup = setup(dec!(1000)).await;
    let now = Utc::now();
    let entry = |offset_secs: i64| AuditEntry {
        id: Uuid::new_v4(),
        actor_id: "importer".to_string(),
        action: ActionType::Update,
        entity_type: "Project".to_string(),
        entity_id: setup.project.id,
        timestamp: now - Duration::seconds(offset_secs),
        previous_value: None,
        new_value: None,
        signature: "imported".to_string(),
        data_hash: "imported".to_string(),
    };
    let later = entry(10);
    let earlier = entry(3600);

    let mut work = setup.store.begin().await.unwrap();
    work.append_audit_entry(&later).await.unwrap();
    work.append_audit_entry(&earlier).await.unwrap();
    work.commit().await.unwrap();

    let report = AccountabilityReportBuilder::new(&setup.signer)
        .build(&setup.store, setup.project.id)
        .await
        .unwrap();

    let ids: Vec<Uuid> = report.audit_entries.iter().map(|e| e.id).collect();
    let earlier_pos = ids.iter().position(|id| *id == earlier.id).unwrap();
    let later_pos = ids.iter().position(|id| *id == later.id).unwrap();
    assert!(earlier_pos < later_pos);
    // unsealed imports fail verification
    assert!(!report.integrity.is_valid);
    assert!(report.is_audit_entry_tampered(earlier.id));
}

#[tokio::test]
async fn test_report_flags_over_budget_and_tampering() {
    let setup = setup(dec!(100)).await;
    let spent = record(&setup, dec!(150), TransactionKind::Debit, 0).await;
    setup
        .store
        .tamper_transaction(spent, |t| t.kind = TransactionKind::Credit)
        .await;

    let report = AccountabilityReportBuilder::new(&setup.signer)
        .build(&setup.store, setup.project.id)
        .await
        .unwrap();

    // the tampered row is still reported as stored
    assert_eq!(report.balance.balance, dec!(150));
    assert_eq!(report.integrity.tampered_transaction_ids, vec![spent]);
    assert!(report.is_transaction_tampered(spent));

    let json: serde_json::Value =
        serde_json::from_str(&JsonExporter::new().export(&report)).unwrap();
    assert_eq!(json["isValid"], false);
    assert_eq!(json["projectId"], setup.project.id.to_string());
}

#[tokio::test]
async fn test_report_keeps_moved_transaction() {
    let setup = setup(dec!(100)).await;
    let kept = record(&setup, dec!(20), TransactionKind::Debit, 2).await;
    let moved = record(&setup, dec!(150), TransactionKind::Debit, 1).await;
    setup
        .store
        .tamper_transaction(moved, |t| t.bank_account_id = Uuid::new_v4())
        .await;

    let report = AccountabilityReportBuilder::new(&setup.signer)
        .build(&setup.store, setup.project.id)
        .await
        .unwrap();

    let ids: Vec<Uuid> = report.transactions.iter().map(|tx| tx.id).collect();
    assert_eq!(ids, vec![kept, moved]);
    assert_eq!(report.balance.balance, dec!(-170));
    assert!(!report.integrity.is_valid);
    assert_eq!(report.integrity.tampered_transaction_ids, vec![moved]);
    assert!(report.audit_entries.iter().any(|entry| entry.entity_id == moved));
}

#[tokio::test]
async fn test_report_balance_over_budget() {
    let setup = setup(dec!(100)).await;
    record(&setup, dec!(150), TransactionKind::Debit, 0).await;

    let report = AccountabilityReportBuilder::new(&setup.signer)
        .build(&setup.store, setup.project.id)
        .await
        .unwrap();

    assert_eq!(report.balance.balance, dec!(-150));
    assert_eq!(report.balance.spent, dec!(150));
    assert_eq!(report.balance.remaining, dec!(-50));
    assert!(report.balance.is_over_budget);
    assert!(report.report_id.starts_with("RPT-"));
}

#[tokio::test]
async fn test_report_requires_bank_account() {
    let store = MemoryStore::new();
    let signer = SignatureService::new(SigningKey::generate());
    let project = ProjectRegistry::new(&signer)
        .create_project(
            &store,
            "alice",
            NewProject {
                name: "Unfunded".to_string(),
                description: None,
                budget: Amount::ZERO,
                bank_account_id: None,
            },
        )
        .await
        .unwrap();

    let result = AccountabilityReportBuilder::new(&signer)
        .build(&store, project.id)
        .await;
    assert!(matches!(result, Err(AuditError::NotFound { .. })));
}

#[tokio::test]
async fn test_report_unknown_project() {
    let store = MemoryStore::new();
    let signer = SignatureService::new(SigningKey::generate());
    let result = AccountabilityReportBuilder::new(&signer)
        .build(&store, Uuid::new_v4())
        .await;
    assert!(result.unwrap_err().is_not_found());
}
