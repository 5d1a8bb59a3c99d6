use super::*;
use crate::combiner::UserReward;
use crate::permit::eip712::keccak256;
use crate::permit::signer::{HexKeyDecryptor, LocalKeySigner};
use crate::style::Role;
use crate::test_support::human;
use async_trait::async_trait;
use bounty_warden_developer_platforms::errors::Error;
use bounty_warden_developer_platforms::wallets::InMemoryWalletRegistry;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use std::str::FromStr;

const ALICE_WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const CAROL_WALLET: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// Signs by echoing the digest, so tests can tell which digest was signed.
struct EchoSigner {
    owner: Address,
}

impl PermitSigner for EchoSigner {
    fn address(&self) -> Address {
        self.owner
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 65], PermitError> {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(digest);
        bytes[32..52].copy_from_slice(&self.owner);
        bytes[64] = 27;
        Ok(bytes)
    }
}

struct BrokenRegistry;

#[async_trait]
impl WalletRegistry for BrokenRegistry {
    async fn get_wallet_address(&self, _user_id: u64) -> Result<Option<String>, Error> {
        Err(Error::WalletRegistryError("database offline".to_string()))
    }
}

fn reward(id: u64, login: &str, total: &str) -> UserReward {
    UserReward {
        user: human(id, login),
        role: Role::Default,
        total: dec(total),
        comments: Vec::new(),
        specification: None,
    }
}

fn scores(rewards: Vec<UserReward>) -> FinalScores {
    rewards.into_iter().map(|r| (r.user.id, r)).collect()
}

fn wallets() -> Arc<InMemoryWalletRegistry> {
    let mut registry = InMemoryWalletRegistry::default();
    registry.register(1, ALICE_WALLET);
    registry.register(3, CAROL_WALLET);
    Arc::new(registry)
}

fn echo_signer() -> Arc<dyn PermitSigner> {
    Arc::new(EchoSigner { owner: [0xaa; 20] })
}

fn generator(config: PermitConfig, signer: Option<Arc<dyn PermitSigner>>) -> PermitGenerator {
    PermitGenerator::new(config, wallets(), signer)
}

#[tokio::test]
async fn test_missing_rpc_url_is_fatal() {
    let config = PermitConfig {
        rpc_url: " ".to_string(),
        ..PermitConfig::default()
    };
    let result = generator(config, Some(echo_signer()))
        .generate_permits(&scores(vec![reward(1, "alice", "5")]), 9000)
        .await;

    match result {
        Err(e) => {
            assert!(matches!(e, PermitError::Configuration(_)));
            assert!(e.is_fatal());
        }
        Ok(_) => panic!("expected a configuration error"),
    }
}

#[tokio::test]
async fn test_invalid_token_address_is_fatal() {
    let config = PermitConfig {
        payment_token: "WXDAI".to_string(),
        ..PermitConfig::default()
    };
    let result = generator(config, Some(echo_signer()))
        .generate_permits(&scores(vec![reward(1, "alice", "5")]), 9000)
        .await;

    assert!(matches!(result, Err(PermitError::Configuration(ref m)) if m.contains("WXDAI")));
}

#[tokio::test]
async fn test_missing_signer_is_fatal() {
    let result = generator(PermitConfig::default(), None)
        .generate_permits(&scores(vec![reward(1, "alice", "5")]), 9000)
        .await;

    assert_eq!(result, Err(PermitError::MissingSignerKey));
}

#[tokio::test]
async fn test_zero_totals_are_skipped_and_missing_wallets_reported() {
    let final_scores = scores(vec![
        reward(1, "alice", "4"),
        reward(2, "bob", "0"),
        reward(3, "carol", "1.5"),
        reward(4, "dave", "2"),
    ]);

    let results = generator(PermitConfig::default(), Some(echo_signer()))
        .generate_permits(&final_scores, 9000)
        .await
        .unwrap();

    assert_eq!(results.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4]);
    assert!(results[&1].is_ok());
    assert!(results[&3].is_ok());
    assert_eq!(
        results[&4],
        Err(PermitError::WalletNotRegistered("dave".to_string()))
    );
}

#[tokio::test]
async fn test_wallet_lookup_failure_is_per_user() {
    let generator = PermitGenerator::new(
        PermitConfig::default(),
        Arc::new(BrokenRegistry),
        Some(echo_signer()),
    );

    let results = generator
        .generate_permits(&scores(vec![reward(1, "alice", "4")]), 9000)
        .await
        .unwrap();

    assert!(matches!(
        &results[&1],
        Err(PermitError::WalletLookupFailed { login, reason })
            if login == "alice" && reason.contains("database offline")
    ));
}

#[tokio::test]
async fn test_permit_contents() {
    let results = generator(PermitConfig::default(), Some(echo_signer()))
        .generate_permits(&scores(vec![reward(1, "alice", "12.345678")]), 9000)
        .await
        .unwrap();
    let permit = results[&1].as_ref().unwrap();
    let transaction = &permit.transaction;

    assert_eq!(permit.amount, dec("12.345678"));
    assert_eq!(permit.token_symbol, "WXDAI");
    assert_eq!(transaction.permit.permitted.amount, "12345678000000000000");
    assert_eq!(
        transaction.permit.permitted.token,
        "0xe91D153E0b41518A2Ce8Dd3D7944Fa863463a97d"
    );
    assert_eq!(transaction.transfer_details.to, ALICE_WALLET);
    assert_eq!(
        transaction.transfer_details.requested_amount,
        transaction.permit.permitted.amount
    );
    assert_eq!(transaction.permit.deadline, U256::MAX.to_dec_string());
    assert_eq!(
        transaction.permit.nonce,
        U256::from_be_bytes(keccak256(b"9000-1")).to_dec_string()
    );
    assert_eq!(transaction.owner, to_checksum_address(&[0xaa; 20]));
    assert!(transaction.signature.starts_with("0x"));
    assert_eq!(transaction.signature.len(), 2 + 130);
}

#[tokio::test]
async fn test_claim_url_round_trip() {
    let results = generator(PermitConfig::default(), Some(echo_signer()))
        .generate_permits(&scores(vec![reward(3, "carol", "1.5")]), 9000)
        .await
        .unwrap();
    let permit = results[&3].as_ref().unwrap();

    assert!(permit.claim_url.starts_with("https://pay.ubq.fi?claim="));
    assert!(permit.claim_url.ends_with("&network=100"));
    assert_eq!(
        decode_claim_url(&permit.claim_url).as_ref(),
        Some(&permit.transaction)
    );
}

#[test]
fn test_claim_json_shape() {
    let transaction = PermitTransactionData {
        permit: PermitData {
            permitted: TokenPermissions {
                token: "0xtoken".to_string(),
                amount: "1".to_string(),
            },
            nonce: "2".to_string(),
            deadline: "3".to_string(),
        },
        transfer_details: TransferDetails {
            to: "0xto".to_string(),
            requested_amount: "1".to_string(),
        },
        owner: "0xowner".to_string(),
        signature: "0xsig".to_string(),
    };

    let value = serde_json::to_value(&transaction).unwrap();

    assert_eq!(value["permit"]["permitted"]["token"], "0xtoken");
    assert_eq!(value["permit"]["nonce"], "2");
    assert_eq!(value["permit"]["deadline"], "3");
    assert_eq!(value["transferDetails"]["to"], "0xto");
    assert_eq!(value["transferDetails"]["requestedAmount"], "1");
    assert_eq!(value["owner"], "0xowner");
    assert_eq!(value["signature"], "0xsig");
}

#[tokio::test]
async fn test_permits_are_idempotent_and_key_dependent() {
    let final_scores = scores(vec![reward(1, "alice", "4")]);
    let key_one = LocalKeySigner::from_stored_key(
        "0x0000000000000000000000000000000000000000000000000000000000000001",
        &HexKeyDecryptor,
    )
    .unwrap();
    let key_two = LocalKeySigner::from_bytes(&[7u8; 32]).unwrap();

    let first = generator(PermitConfig::default(), Some(Arc::new(key_one)))
        .generate_permits(&final_scores, 9000)
        .await
        .unwrap();
    let again = generator(
        PermitConfig::default(),
        Some(Arc::new(
            LocalKeySigner::from_bytes(&{
                let mut key = [0u8; 32];
                key[31] = 1;
                key
            })
            .unwrap(),
        )),
    )
    .generate_permits(&final_scores, 9000)
    .await
    .unwrap();
    let other_key = generator(PermitConfig::default(), Some(Arc::new(key_two)))
        .generate_permits(&final_scores, 9000)
        .await
        .unwrap();

    let first = first[&1].as_ref().unwrap();
    let again = again[&1].as_ref().unwrap();
    let other_key = other_key[&1].as_ref().unwrap();

    assert_eq!(first, again);
    assert_eq!(first.transaction.permit, other_key.transaction.permit);
    assert_eq!(
        first.transaction.transfer_details,
        other_key.transaction.transfer_details
    );
    assert_ne!(first.transaction.signature, other_key.transaction.signature);
    assert_ne!(first.transaction.owner, other_key.transaction.owner);
}

#[tokio::test]
async fn test_signature_recovers_owner() {
    let signer = LocalKeySigner::from_bytes(&[9u8; 32]).unwrap();
    let owner = signer.address();
    let config = PermitConfig::default();

    let results = generator(config.clone(), Some(Arc::new(signer)))
        .generate_permits(&scores(vec![reward(1, "alice", "2.5")]), 9000)
        .await
        .unwrap();
    let transaction = &results[&1].as_ref().unwrap().transaction;

    let permit = PermitTransferFrom {
        token: parse_address(&transaction.permit.permitted.token).unwrap(),
        amount: U256::from_dec_str(&transaction.permit.permitted.amount).unwrap(),
        spender: parse_address(&transaction.transfer_details.to).unwrap(),
        nonce: U256::from_dec_str(&transaction.permit.nonce).unwrap(),
        deadline: U256::from_dec_str(&transaction.permit.deadline).unwrap(),
    };
    let domain = Permit2Domain {
        chain_id: config.network_id,
        verifying_contract: parse_address(&config.permit2_address).unwrap(),
    };
    let digest = permit.signing_hash(&domain);

    let bytes = hex::decode(transaction.signature.trim_start_matches("0x")).unwrap();
    let signature = Signature::from_slice(&bytes[..64]).unwrap();
    let recovery_id = RecoveryId::from_byte(bytes[64] - 27).unwrap();
    let recovered = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).unwrap();

    let point = recovered.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    assert_eq!(&hash[12..], &owner[..]);
    assert_eq!(transaction.owner, to_checksum_address(&owner));
}

#[test]
fn test_to_token_units() {
    assert_eq!(
        to_token_units(dec("12.345678"), 2).unwrap(),
        (dec("12.34"), U256::from_u128(1234))
    );
    assert_eq!(
        to_token_units(dec("3"), 6).unwrap(),
        (dec("3"), U256::from_u128(3_000_000))
    );
    assert_eq!(
        to_token_units(dec("0.999"), 0).unwrap_err(),
        PermitError::InvalidAmount("0.999 rounds to zero at 0 decimals".to_string())
    );
    assert!(matches!(
        to_token_units(dec("-1"), 18),
        Err(PermitError::InvalidAmount(_))
    ));
}
