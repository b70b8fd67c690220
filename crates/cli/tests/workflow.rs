use rust_decimal_macros::dec;
use std::path::Path;
use tally_cli::commands::{self, ReportFormat};
use tally_cli::{AppConfig, AppContext};
use tally_ledger::{FileKeyProvider, KeyProvider, SignatureService, SigningKey};
use uuid::Uuid;

fn config(dir: &Path, actor: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: format!("sqlite:{}?mode=rwc", dir.join("tally.db").display()),
        key_source: None,
        report_dir: dir.join("reports"),
        actor: actor.map(str::to_string),
    }
}

#[tokio::test]
async fn test_full_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let signer = SignatureService::new(SigningKey::generate());
    let ctx = AppContext::with_signer(config(dir.path(), Some("alice")), signer)
        .await
        .unwrap();

    let account = commands::create_bank_account(&ctx, "Operations", "First Bank", "001-234")
        .await
        .unwrap();
    let project = commands::create_project(&ctx, "Bridge", None, dec!(1000), Some(account))
        .await
        .unwrap();
    let tx = commands::record_transaction(&ctx, account, Uuid::new_v4(), dec!(250.75), "debit", None)
        .await
        .unwrap();
    commands::offset_transaction(&ctx, tx, None).await.unwrap();

    let integrity = commands::verify(&ctx, project).await.unwrap();
    assert!(integrity.is_valid);
    assert_eq!(integrity.total_transactions_checked, 2);

    let path = commands::report(&ctx, project, ReportFormat::Json, Some(&ctx.config.report_dir))
        .await
        .unwrap()
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["projectName"], "Bridge");
    assert_eq!(json["balance"], "0.00");
    assert_eq!(json["transactions"].as_array().unwrap().len(), 2);
    assert!(path.extension().is_some_and(|ext| ext == "json"));

    commands::close_project(&ctx, project).await.unwrap();
    assert!(commands::close_project(&ctx, project).await.is_err());
}

#[tokio::test]
async fn test_verify_with_wrong_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AppContext::with_signer(
        config(dir.path(), Some("alice")),
        SignatureService::new(SigningKey::generate()),
    )
    .await
    .unwrap();
    let account = commands::create_bank_account(&ctx, "Ops", "Bank", "9").await.unwrap();
    let project = commands::create_project(&ctx, "Roof", None, dec!(50), Some(account))
        .await
        .unwrap();
    commands::record_transaction(&ctx, account, Uuid::new_v4(), dec!(10), "CREDIT", None)
        .await
        .unwrap();

    let other = AppContext::with_signer(
        config(dir.path(), Some("alice")),
        SignatureService::new(SigningKey::generate()),
    )
    .await
    .unwrap();
    let err = commands::verify(&other, project).await.unwrap_err();
    assert!(err.to_string().contains("Integrity compromised"));
}

#[tokio::test]
async fn test_mutations_require_actor() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AppContext::with_signer(
        config(dir.path(), None),
        SignatureService::new(SigningKey::generate()),
    )
    .await
    .unwrap();

    let result = commands::create_bank_account(&ctx, "Ops", "Bank", "1").await;
    assert!(result.unwrap_err().to_string().contains("No actor"));
}

#[tokio::test]
async fn test_unknown_kind_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AppContext::with_signer(
        config(dir.path(), Some("alice")),
        SignatureService::new(SigningKey::generate()),
    )
    .await
    .unwrap();
    let account = commands::create_bank_account(&ctx, "Ops", "Bank", "1").await.unwrap();

    let result =
        commands::record_transaction(&ctx, account, Uuid::new_v4(), dec!(1), "refund", None).await;
    assert!(result.is_err());
}

#[test]
fn test_keygen_file_is_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.key");
    commands::keygen(Some(&path)).unwrap();

    let key = FileKeyProvider::new(&path).signing_key().unwrap();
    assert_eq!(key.to_hex(), std::fs::read_to_string(&path).unwrap());
}

#[cfg(unix)]
#[test]
fn test_keygen_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.key");
    std::fs::write(&path, "stale").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    commands::keygen(Some(&path)).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_ne!(std::fs::read_to_string(&path).unwrap(), "stale");
}
