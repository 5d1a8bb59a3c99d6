use super::*;
use bounty_warden_core::config::{PermitConfig, QualityConfig};
use bounty_warden_core::errors::PermitError;
use bounty_warden_core::style::Role;
use std::collections::BTreeMap;

const SNAPSHOT: &str = r#"{
    "issue": {
        "id": 9000,
        "number": 7,
        "title": "Improve the parser",
        "author": { "id": 1, "login": "alice", "kind": "User" },
        "body": null,
        "assignee": { "id": 2, "login": "bob", "kind": "User" }
    },
    "comments": [
        {
            "id": 10,
            "issue_number": 7,
            "author": { "id": 1, "login": "alice", "kind": "User" },
            "body": "one two three four five six seven eight nine ten",
            "created_at": "2024-03-01T10:00:00Z"
        },
        {
            "id": 11,
            "issue_number": 7,
            "author": { "id": 2, "login": "bob", "kind": "User" },
            "body": "done",
            "created_at": "2024-03-01T11:00:00Z"
        },
        {
            "id": 12,
            "issue_number": 7,
            "author": { "id": 99, "login": "ci", "kind": "Bot" },
            "body": "build passed",
            "created_at": "2024-03-01T12:00:00Z"
        }
    ]
}"#;

const ALICE_WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const SIGNER_KEY: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

fn engine() -> RewardEngine {
    let quality = QualityScorer::new(
        Arc::new(FixedRelevanceJudge::new(Decimal::ONE)),
        &QualityConfig::default(),
    );
    RewardEngine::new(BTreeMap::new(), quality)
}

fn snapshot() -> IssueSnapshot {
    serde_json::from_str(SNAPSHOT).unwrap()
}

fn config_with_wallet() -> BountyWardenConfig {
    let mut config = BountyWardenConfig::default();
    config
        .wallets
        .insert("1".to_string(), ALICE_WALLET.to_string());
    config
}

#[test]
fn test_parse_repo() {
    assert_eq!(
        parse_repo("owner/repo").unwrap(),
        ("owner".to_string(), "repo".to_string())
    );
    assert!(matches!(parse_repo("owner"), Err(CliError::InvalidArguments(_))));
    assert!(matches!(parse_repo("/repo"), Err(CliError::InvalidArguments(_))));
    assert!(matches!(parse_repo("a/b/c"), Err(CliError::InvalidArguments(_))));
}

#[test]
fn test_snapshot_defaults() {
    let snapshot = snapshot();

    assert_eq!(snapshot.comments.len(), 3);
    assert!(snapshot.collaborators.is_empty());
}

#[tokio::test]
async fn test_score_snapshot_without_permits() {
    let outcome = score_snapshot(&engine(), &snapshot(), None, "WXDAI")
        .await
        .unwrap();

    assert_eq!(outcome.final_scores.len(), 2);
    assert_eq!(outcome.final_scores[&1].role, Role::Issuer);
    assert_eq!(outcome.final_scores[&1].total, Decimal::from(2));
    assert_eq!(outcome.final_scores[&2].total, Decimal::ZERO);
    assert!(!outcome.final_scores.contains_key(&99));
    assert!(outcome.permits.is_none());
    assert!(outcome.comment.contains("[ 2 WXDAI ]"));
}

#[tokio::test]
async fn test_score_snapshot_with_permits() {
    let config = config_with_wallet();
    let generator = build_permit_generator(&config, Some(SIGNER_KEY)).unwrap();

    let outcome = score_snapshot(&engine(), &snapshot(), Some(&generator), "WXDAI")
        .await
        .unwrap();

    let permits = outcome.permits.unwrap();
    let permit = permits[&1].as_ref().unwrap();
    assert_eq!(permit.transaction.transfer_details.to, ALICE_WALLET);
    assert_eq!(permit.transaction.permit.permitted.amount, "2000000000000000000");
}

#[tokio::test]
async fn test_score_snapshot_without_signer_fails() {
    let generator = build_permit_generator(&config_with_wallet(), None).unwrap();

    let result = score_snapshot(&engine(), &snapshot(), Some(&generator), "WXDAI").await;

    assert!(matches!(result, Err(CliError::ScoringFailed(ref m)) if m.contains("signer")));
}

#[test]
fn test_invalid_signer_key_is_a_config_error() {
    let result = build_permit_generator(&BountyWardenConfig::default(), Some("0xnot-a-key"));

    assert!(matches!(result, Err(CliError::ConfigError(_))));
}

#[test]
fn test_invalid_wallet_key_is_a_config_error() {
    let mut config = BountyWardenConfig::default();
    config
        .wallets
        .insert("alice".to_string(), ALICE_WALLET.to_string());

    let result = build_permit_generator(&config, Some(SIGNER_KEY));

    assert!(matches!(result, Err(CliError::ConfigError(ref m)) if m.contains("alice")));
}

#[tokio::test]
async fn test_render_table() {
    let outcome = score_snapshot(&engine(), &snapshot(), None, "WXDAI")
        .await
        .unwrap();
    let mut permits = PermitResults::new();
    permits.insert(2, Err(PermitError::WalletNotRegistered("bob".to_string())));

    let table = render_table(&outcome.final_scores, Some(&permits), "WXDAI");
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("USER"));
    assert!(lines[1].starts_with("@alice"));
    assert!(lines[1].contains("Issuer"));
    assert!(lines[1].contains("2 WXDAI"));
    assert!(lines[1].ends_with('-'));
    assert!(lines[2].starts_with("@bob"));
    assert!(lines[2].ends_with("@bob has no wallet registered"));
}

#[tokio::test]
async fn test_render_json() {
    let config = config_with_wallet();
    let generator = build_permit_generator(&config, Some(SIGNER_KEY)).unwrap();
    let outcome = score_snapshot(&engine(), &snapshot(), Some(&generator), "WXDAI")
        .await
        .unwrap();

    let json = render_json(&outcome.final_scores, outcome.permits.as_ref()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["rewards"]["1"]["user"]["login"], "alice");
    assert_eq!(value["rewards"]["1"]["role"], "Issuer");
    assert_eq!(value["permits"]["1"]["status"], "generated");
    assert!(value["permits"]["1"]["claimUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://pay.ubq.fi?claim="));

    let without_permits = render_json(&outcome.final_scores, None).unwrap();
    let value: serde_json::Value = serde_json::from_str(&without_permits).unwrap();
    assert!(value.get("permits").is_none());
}

#[test]
fn test_default_permit_config_symbol() {
    assert_eq!(PermitConfig::default().token_symbol, "WXDAI");
}
