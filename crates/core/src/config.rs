//! Configuration settings for the Bounty Warden core functionality.
//!
//! This module centralizes the reward rubric defaults, the quality and permit
//! settings, and the loader for the `bounty-warden.toml` file.
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::errors::ConfigLoadError;
use crate::style::ContributionStyle;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Default name of the configuration file
pub const CONFIG_FILE_NAME: &str = "bounty-warden.toml";

/// HTML comment marker for the reward summary comment
pub const REWARD_COMMENT_MARKER: &str = "<!-- BOUNTY_WARDEN_REWARDS -->";

/// Environment variable holding the permit signer key
pub const SIGNER_KEY_ENV: &str = "BOUNTY_WARDEN_SIGNER_KEY";

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Canonical Permit2 deployment address
pub const DEFAULT_PERMIT2_ADDRESS: &str = "0x000000000022D473030F116dDEE9F6B43aC78BA3";

/// The only supported configuration schema version
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

lazy_static! {
    /// Pre-compiled regex for bot commands such as `/start` or `/wallet 0x...`
    pub static ref SLASH_COMMAND_REGEX: Regex = Regex::new(
        r"^/[A-Za-z][A-Za-z0-9_-]*(?:[ \t]+[^\r\n]*)?$"
    ).expect("Failed to compile slash command regex");
}

/// Top-level configuration struct for bounty-warden
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BountyWardenConfig {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,

    #[serde(default)]
    pub rewards: RewardsConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub permits: PermitConfig,

    /// GitHub user id → wallet address
    #[serde(default)]
    pub wallets: BTreeMap<String, String>,
}

impl Default for BountyWardenConfig {
    fn default() -> Self {
        Self {
            schema_version: SUPPORTED_SCHEMA_VERSION,
            rewards: RewardsConfig::default(),
            quality: QualityConfig::default(),
            permits: PermitConfig::default(),
            wallets: BTreeMap::new(),
        }
    }
}

impl BountyWardenConfig {
    /// Parses the wallet table into user ids and addresses.
    pub fn wallet_entries(&self) -> Result<Vec<(u64, String)>, ConfigLoadError> {
        self.wallets
            .iter()
            .map(|(id, address)| {
                id.trim()
                    .parse::<u64>()
                    .map(|id| (id, address.clone()))
                    .map_err(|_| ConfigLoadError::InvalidWalletUserId(id.clone()))
            })
            .collect()
    }
}

/// Reward rubric overrides.
///
/// Anything not set here falls back to the built-in defaults, so an empty
/// `[rewards]` table yields the default rubric for every style.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RewardsConfig {
    /// Element weight overrides applied to every style
    #[serde(default)]
    pub elements: BTreeMap<String, Decimal>,

    /// Per-style overrides keyed by the style display name
    #[serde(default)]
    pub styles: BTreeMap<String, StyleOverrides>,
}

/// Overrides for a single contribution style.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StyleOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_value: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting_multiplier: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_elements: Option<BTreeSet<String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub elements: BTreeMap<String, Decimal>,
}

impl RewardsConfig {
    /// Builds the effective rubric configuration for every style.
    ///
    /// Fails if an override names a style that does not exist.
    pub fn resolve(&self) -> Result<BTreeMap<ContributionStyle, RubricConfig>, ConfigLoadError> {
        let mut overrides = BTreeMap::new();
        for (name, style_overrides) in &self.styles {
            let style: ContributionStyle = name.parse()?;
            overrides.insert(style, style_overrides);
        }

        let mut resolved = BTreeMap::new();
        for style in ContributionStyle::ALL {
            let mut rubric = RubricConfig::default_for(style);
            for (element, weight) in &self.elements {
                rubric
                    .element_weights
                    .insert(element.to_ascii_lowercase(), *weight);
            }

            if let Some(o) = overrides.get(&style) {
                if let Some(word_value) = o.word_value {
                    rubric.word_value = word_value;
                }
                if let Some(multiplier) = o.formatting_multiplier {
                    rubric.formatting_multiplier = multiplier;
                }
                if let Some(disabled) = &o.disabled_elements {
                    rubric.disabled_elements =
                        disabled.iter().map(|e| e.to_ascii_lowercase()).collect();
                }
                for (element, weight) in &o.elements {
                    rubric
                        .element_weights
                        .insert(element.to_ascii_lowercase(), *weight);
                }
            }

            resolved.insert(style, rubric);
        }

        Ok(resolved)
    }

    /// The overrides that reproduce the built-in defaults, used by
    /// `config init` so the written file documents every knob.
    pub fn documented_defaults() -> Self {
        let styles = ContributionStyle::ALL
            .into_iter()
            .map(|style| {
                let rubric = RubricConfig::default_for(style);
                (
                    style.to_string(),
                    StyleOverrides {
                        word_value: Some(rubric.word_value),
                        formatting_multiplier: Some(rubric.formatting_multiplier),
                        disabled_elements: Some(rubric.disabled_elements),
                        elements: BTreeMap::new(),
                    },
                )
            })
            .collect();

        Self {
            elements: default_element_weights(),
            styles,
        }
    }
}

/// Effective scoring settings for one contribution style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubricConfig {
    /// Value credited per counted word
    pub word_value: Decimal,
    /// Multiplier applied to every element score
    pub formatting_multiplier: Decimal,
    /// Lower-case element name → weight
    pub element_weights: BTreeMap<String, Decimal>,
    /// Elements whose text earns no word credit
    pub disabled_elements: BTreeSet<String>,
}

impl RubricConfig {
    /// The built-in rubric for a style.
    pub fn default_for(style: ContributionStyle) -> Self {
        use ContributionStyle as S;

        let (word_value, formatting_multiplier) = match style {
            S::IssueIssuerSpecification => (Decimal::new(2, 1), Decimal::from(3)),
            S::IssueIssuerComment | S::ReviewIssuerComment => (Decimal::new(2, 1), Decimal::ONE),
            S::IssueAssigneeComment | S::ReviewAssigneeComment | S::ReviewAssigneeCode => {
                (Decimal::ZERO, Decimal::ZERO)
            }
            S::IssueDefaultComment | S::ReviewDefaultComment => {
                (Decimal::new(1, 1), Decimal::new(25, 2))
            }
            S::IssueCollaboratorComment
            | S::ReviewIssuerApproval
            | S::ReviewIssuerRejection
            | S::ReviewCollaboratorComment
            | S::ReviewCollaboratorApproval
            | S::ReviewCollaboratorRejection => (Decimal::new(1, 1), Decimal::ONE),
        };

        Self {
            word_value,
            formatting_multiplier,
            element_weights: default_element_weights(),
            disabled_elements: default_disabled_elements(),
        }
    }
}

/// Quality (relevance) scoring settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QualityConfig {
    /// Comments judged per request
    #[serde(default = "QualityConfig::default_batch_size")]
    pub batch_size: usize,

    /// Requests in flight at once
    #[serde(default = "QualityConfig::default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub openai: OpenAiConfig,
}

impl QualityConfig {
    fn default_batch_size() -> usize {
        10
    }

    fn default_max_concurrency() -> usize {
        4
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            batch_size: Self::default_batch_size(),
            max_concurrency: Self::default_max_concurrency(),
            openai: OpenAiConfig::default(),
        }
    }
}

/// Settings for the OpenAI relevance judge. The API key is read from
/// `OPENAI_API_KEY` and never stored in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    #[serde(default = "OpenAiConfig::default_model")]
    pub model: String,

    #[serde(default = "OpenAiConfig::default_endpoint")]
    pub endpoint: String,
}

impl OpenAiConfig {
    fn default_model() -> String {
        "gpt-4o".to_string()
    }

    fn default_endpoint() -> String {
        "https://api.openai.com/v1".to_string()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            endpoint: Self::default_endpoint(),
        }
    }
}

/// Payment permit settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermitConfig {
    /// EVM chain id
    #[serde(default = "PermitConfig::default_network_id")]
    pub network_id: u64,

    /// ERC-20 token paid out
    #[serde(default = "PermitConfig::default_payment_token")]
    pub payment_token: String,

    #[serde(default = "PermitConfig::default_rpc_url")]
    pub rpc_url: String,

    #[serde(default = "PermitConfig::default_claim_base_url")]
    pub claim_base_url: String,

    #[serde(default = "PermitConfig::default_permit2_address")]
    pub permit2_address: String,

    #[serde(default = "PermitConfig::default_token_decimals")]
    pub token_decimals: u32,

    #[serde(default = "PermitConfig::default_token_symbol")]
    pub token_symbol: String,

    /// Permits signed concurrently
    #[serde(default = "PermitConfig::default_max_concurrency")]
    pub max_concurrency: usize,
}

impl PermitConfig {
    fn default_network_id() -> u64 {
        100
    }

    fn default_payment_token() -> String {
        "0xe91D153E0b41518A2Ce8Dd3D7944Fa863463a97d".to_string()
    }

    fn default_rpc_url() -> String {
        "https://rpc.gnosischain.com".to_string()
    }

    fn default_claim_base_url() -> String {
        "https://pay.ubq.fi".to_string()
    }

    fn default_permit2_address() -> String {
        DEFAULT_PERMIT2_ADDRESS.to_string()
    }

    fn default_token_decimals() -> u32 {
        18
    }

    fn default_token_symbol() -> String {
        "WXDAI".to_string()
    }

    fn default_max_concurrency() -> usize {
        4
    }
}

impl Default for PermitConfig {
    fn default() -> Self {
        Self {
            network_id: Self::default_network_id(),
            payment_token: Self::default_payment_token(),
            rpc_url: Self::default_rpc_url(),
            claim_base_url: Self::default_claim_base_url(),
            permit2_address: Self::default_permit2_address(),
            token_decimals: Self::default_token_decimals(),
            token_symbol: Self::default_token_symbol(),
            max_concurrency: Self::default_max_concurrency(),
        }
    }
}

/// The built-in element weights.
pub fn default_element_weights() -> BTreeMap<String, Decimal> {
    let mut weights = BTreeMap::new();
    weights.insert("a".to_string(), Decimal::ONE);
    weights.insert("blockquote".to_string(), Decimal::ZERO);
    weights.insert("code".to_string(), Decimal::ONE);
    weights.insert("em".to_string(), Decimal::ZERO);
    for heading in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        weights.insert(heading.to_string(), Decimal::ONE);
    }
    weights.insert("img".to_string(), Decimal::ONE);
    weights.insert("li".to_string(), Decimal::new(5, 1));
    weights.insert("strong".to_string(), Decimal::ZERO);
    weights.insert("table".to_string(), Decimal::ONE);
    weights
}

/// Elements whose text earns no word credit by default.
pub fn default_disabled_elements() -> BTreeSet<String> {
    ["blockquote", "em", "img"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Loads the bounty-warden configuration from the given path.
///
/// The style overrides are resolved once here so an unknown style name is
/// reported at load time.
///
/// # Arguments
/// * `path` - Path to the configuration file
///
/// # Returns
/// * `Ok(BountyWardenConfig)` if loaded and valid
/// * `Err(ConfigLoadError)` if there is a problem
pub fn load_bounty_warden_config<P: AsRef<Path>>(
    path: P,
) -> Result<BountyWardenConfig, ConfigLoadError> {
    let path_ref = path.as_ref();
    let content = match fs::read_to_string(path_ref) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigLoadError::NotFound(path_ref.display().to_string()));
        }
        Err(e) => return Err(ConfigLoadError::Io(e)),
    };
    parse_bounty_warden_config(&content)
}

/// Parses and validates configuration text.
pub fn parse_bounty_warden_config(content: &str) -> Result<BountyWardenConfig, ConfigLoadError> {
    let config: BountyWardenConfig = toml::from_str(content)?;
    if config.schema_version != SUPPORTED_SCHEMA_VERSION {
        return Err(ConfigLoadError::UnsupportedSchemaVersion(
            config.schema_version,
        ));
    }
    config.rewards.resolve()?;
    config.wallet_entries()?;
    Ok(config)
}
