//! # Payment Permits
//!
//! Converts reward totals into signed Permit2 `PermitTransferFrom`
//! authorizations. Each permit lets the rewarded user pull their reward from
//! the funding wallet through the claim page linked in the summary comment.
//!
//! Configuration problems stop generation for everyone. Problems with a
//! single user (no wallet registered, a signing failure) only affect that
//! user.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bounty_warden_developer_platforms::WalletRegistry;
use futures::stream::{self, StreamExt};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::combiner::{FinalScores, UserReward};
use crate::config::PermitConfig;
use crate::errors::PermitError;

pub mod eip712;
pub mod signer;
pub mod uint;

use eip712::{parse_address, permit_nonce, to_checksum_address, Address, Permit2Domain, PermitTransferFrom};
use signer::PermitSigner;
use uint::U256;

#[cfg(test)]
#[path = "permit_tests.rs"]
mod tests;

/// Largest number of token decimals whose unit still fits in 256 bits.
const MAX_TOKEN_DECIMALS: u32 = 77;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPermissions {
    pub token: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitData {
    pub permitted: TokenPermissions,
    pub nonce: String,
    pub deadline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetails {
    pub to: String,
    pub requested_amount: String,
}

/// The claim payload embedded in a claim URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitTransactionData {
    pub permit: PermitData,
    pub transfer_details: TransferDetails,
    pub owner: String,
    pub signature: String,
}

/// A signed permit for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPermit {
    pub user_id: u64,
    pub login: String,
    /// The reward truncated to the token's decimals
    pub amount: Decimal,
    pub token_symbol: String,
    pub transaction: PermitTransactionData,
    pub claim_url: String,
}

/// Generated permits keyed by user id. Users with a zero total are absent.
pub type PermitResults = BTreeMap<u64, Result<GeneratedPermit, PermitError>>;

/// Validated settings shared by every permit of a run.
#[derive(Debug, Clone)]
struct PermitContext {
    domain: Permit2Domain,
    token: Address,
    owner: Address,
    claim_base_url: String,
    network_id: u64,
    token_decimals: u32,
    token_symbol: String,
}

/// Produces signed permits for the users in a reward ledger.
pub struct PermitGenerator {
    config: PermitConfig,
    wallets: Arc<dyn WalletRegistry>,
    signer: Option<Arc<dyn PermitSigner>>,
}

impl PermitGenerator {
    /// `signer` is `None` when no signer key is configured; generation then
    /// fails with [`PermitError::MissingSignerKey`].
    pub fn new(
        config: PermitConfig,
        wallets: Arc<dyn WalletRegistry>,
        signer: Option<Arc<dyn PermitSigner>>,
    ) -> Self {
        Self {
            config,
            wallets,
            signer,
        }
    }

    pub fn token_symbol(&self) -> &str {
        &self.config.token_symbol
    }

    fn validate(&self) -> Result<(PermitContext, Arc<dyn PermitSigner>), PermitError> {
        let config = &self.config;
        if config.rpc_url.trim().is_empty() {
            return Err(PermitError::Configuration(
                "rpcUrl is not configured".to_string(),
            ));
        }
        if config.claim_base_url.trim().is_empty() {
            return Err(PermitError::Configuration(
                "claimBaseUrl is not configured".to_string(),
            ));
        }
        if config.token_decimals > MAX_TOKEN_DECIMALS {
            return Err(PermitError::Configuration(format!(
                "tokenDecimals must be at most {}, found {}",
                MAX_TOKEN_DECIMALS, config.token_decimals
            )));
        }
        let token = parse_address(&config.payment_token).map_err(|_| {
            PermitError::Configuration(format!(
                "paymentToken '{}' is not an address",
                config.payment_token
            ))
        })?;
        let verifying_contract = parse_address(&config.permit2_address).map_err(|_| {
            PermitError::Configuration(format!(
                "permit2Address '{}' is not an address",
                config.permit2_address
            ))
        })?;
        let signer = self.signer.clone().ok_or(PermitError::MissingSignerKey)?;

        let context = PermitContext {
            domain: Permit2Domain {
                chain_id: config.network_id,
                verifying_contract,
            },
            token,
            owner: signer.address(),
            claim_base_url: config.claim_base_url.trim_end_matches('/').to_string(),
            network_id: config.network_id,
            token_decimals: config.token_decimals,
            token_symbol: config.token_symbol.clone(),
        };
        Ok((context, signer))
    }

    /// Generates a permit for every user with a positive total.
    ///
    /// Returns `Err` only for configuration problems. Per-user failures are
    /// reported in the map.
    #[instrument(skip(self, final_scores), fields(users = final_scores.len()))]
    pub async fn generate_permits(
        &self,
        final_scores: &FinalScores,
        issue_id: u64,
    ) -> Result<PermitResults, PermitError> {
        let (context, signer) = self.validate()?;

        let payable: Vec<&UserReward> = final_scores
            .values()
            .filter(|reward| reward.total > Decimal::ZERO)
            .collect();

        let results: PermitResults = stream::iter(payable)
            .map(|reward| {
                let context = &context;
                let signer = signer.as_ref();
                async move {
                    let result = self.generate_permit(context, signer, reward, issue_id).await;
                    if let Err(e) = &result {
                        warn!(user = reward.user.login.as_str(), error = %e, "No permit generated");
                    }
                    (reward.user.id, result)
                }
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        info!(
            issue_id,
            generated = results.values().filter(|r| r.is_ok()).count(),
            failed = results.values().filter(|r| r.is_err()).count(),
            "Generated permits"
        );
        Ok(results)
    }

    async fn generate_permit(
        &self,
        context: &PermitContext,
        signer: &dyn PermitSigner,
        reward: &UserReward,
        issue_id: u64,
    ) -> Result<GeneratedPermit, PermitError> {
        let login = &reward.user.login;
        let wallet = match self.wallets.get_wallet_address(reward.user.id).await {
            Ok(Some(wallet)) => wallet,
            Ok(None) => return Err(PermitError::WalletNotRegistered(login.clone())),
            Err(e) => {
                return Err(PermitError::WalletLookupFailed {
                    login: login.clone(),
                    reason: e.to_string(),
                })
            }
        };
        let beneficiary = parse_address(&wallet)?;

        let (amount, amount_units) = to_token_units(reward.total, context.token_decimals)?;
        let nonce = permit_nonce(issue_id, reward.user.id);
        let permit = PermitTransferFrom {
            token: context.token,
            amount: amount_units,
            spender: beneficiary,
            nonce,
            deadline: U256::MAX,
        };

        let digest = permit.signing_hash(&context.domain);
        let signature = signer.sign_digest(&digest)?;

        let transaction = PermitTransactionData {
            permit: PermitData {
                permitted: TokenPermissions {
                    token: to_checksum_address(&context.token),
                    amount: amount_units.to_dec_string(),
                },
                nonce: nonce.to_dec_string(),
                deadline: U256::MAX.to_dec_string(),
            },
            transfer_details: TransferDetails {
                to: to_checksum_address(&beneficiary),
                requested_amount: amount_units.to_dec_string(),
            },
            owner: to_checksum_address(&context.owner),
            signature: format!("0x{}", hex::encode(signature)),
        };
        let claim_url = claim_url(&context.claim_base_url, context.network_id, &transaction)?;

        Ok(GeneratedPermit {
            user_id: reward.user.id,
            login: login.clone(),
            amount,
            token_symbol: context.token_symbol.clone(),
            transaction,
            claim_url,
        })
    }
}

/// Truncates `total` to `decimals` places and scales it to token units.
pub fn to_token_units(total: Decimal, decimals: u32) -> Result<(Decimal, U256), PermitError> {
    if total.is_sign_negative() {
        return Err(PermitError::InvalidAmount(format!(
            "{} is negative",
            total
        )));
    }

    let truncated = total.round_dp_with_strategy(decimals, RoundingStrategy::ToZero);
    if truncated.is_zero() {
        return Err(PermitError::InvalidAmount(format!(
            "{} rounds to zero at {} decimals",
            total, decimals
        )));
    }

    let mantissa = u128::try_from(truncated.mantissa())
        .map_err(|_| PermitError::InvalidAmount(truncated.to_string()))?;
    let units = U256::from_u128(mantissa)
        .checked_mul_pow10(decimals.saturating_sub(truncated.scale()))
        .ok_or_else(|| PermitError::InvalidAmount(format!("{} overflows uint256", truncated)))?;

    Ok((truncated, units))
}

/// Builds `<base>?claim=<urlencoded base64 json>&network=<id>`.
pub fn claim_url(
    base: &str,
    network_id: u64,
    transaction: &PermitTransactionData,
) -> Result<String, PermitError> {
    let json = serde_json::to_string(transaction)
        .map_err(|e| PermitError::Signing(format!("failed to encode claim: {}", e)))?;
    let encoded = STANDARD.encode(json);
    Ok(format!(
        "{}?claim={}&network={}",
        base,
        urlencoding::encode(&encoded),
        network_id
    ))
}

/// Reverses [`claim_url`], returning the embedded transaction data.
pub fn decode_claim_url(url: &str) -> Option<PermitTransactionData> {
    let query = url.split_once('?')?.1;
    let claim = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("claim="))?;
    let decoded = urlencoding::decode(claim).ok()?;
    let json = STANDARD.decode(decoded.as_bytes()).ok()?;
    serde_json::from_slice(&json).ok()
}
