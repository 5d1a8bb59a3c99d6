use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use bounty_warden_core::combiner::FinalScores;
use bounty_warden_core::config::{BountyWardenConfig, OPENAI_API_KEY_ENV, SIGNER_KEY_ENV};
use bounty_warden_core::errors::BountyWardenError;
use bounty_warden_core::permit::signer::{HexKeyDecryptor, LocalKeySigner, PermitSigner};
use bounty_warden_core::permit::{GeneratedPermit, PermitGenerator, PermitResults};
use bounty_warden_core::quality::openai::OpenAiRelevanceJudge;
use bounty_warden_core::quality::{FixedRelevanceJudge, QualityScorer, RelevanceJudge};
use bounty_warden_core::render::render_rewards_summary;
use bounty_warden_core::{BountyWarden, RewardEngine, RewardOutcome};
use bounty_warden_developer_platforms::github::{create_token_client, GitHubProvider};
use bounty_warden_developer_platforms::models::{Comment, Issue};
use bounty_warden_developer_platforms::wallets::InMemoryWalletRegistry;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::load_config;
use crate::errors::CliError;

#[cfg(test)]
#[path = "score_tests.rs"]
mod tests;

/// Environment variable holding the GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Output format of the score command
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per rewarded user
    Table,
    /// The full reward ledger as JSON
    Json,
}

/// Arguments for the score command
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Score an issue snapshot stored as JSON instead of fetching it
    #[arg(long, conflicts_with_all = ["repo", "issue", "pull_request"])]
    pub snapshot: Option<PathBuf>,

    /// Repository in the form owner/name
    #[arg(long, requires = "issue")]
    pub repo: Option<String>,

    /// The closed issue to score
    #[arg(long, requires = "repo")]
    pub issue: Option<u64>,

    /// Pull requests whose reviews belong to the conversation
    #[arg(long = "pull-request")]
    pub pull_request: Vec<u64>,

    /// Alternate config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Generate signed permits with the key in BOUNTY_WARDEN_SIGNER_KEY
    #[arg(long)]
    pub sign: bool,

    /// Post the reward summary on the issue
    #[arg(long, requires = "repo")]
    pub post: bool,
}

/// An issue conversation captured for offline scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub issue: Issue,

    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Ids of users with write access to the repository
    #[serde(default)]
    pub collaborators: Vec<u64>,
}

/// Splits `owner/name`.
pub fn parse_repo(repo: &str) -> Result<(String, String), CliError> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(CliError::InvalidArguments(format!(
            "Expected the repository as owner/name, got '{}'",
            repo
        ))),
    }
}

fn build_judge(config: &BountyWardenConfig) -> Arc<dyn RelevanceJudge> {
    match std::env::var(OPENAI_API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => {
            debug!(model = config.quality.openai.model.as_str(), "Using the OpenAI relevance judge");
            Arc::new(OpenAiRelevanceJudge::new(key, &config.quality.openai))
        }
        _ => {
            warn!(
                "{} is not set. Every comment is treated as fully relevant",
                OPENAI_API_KEY_ENV
            );
            Arc::new(FixedRelevanceJudge::new(Decimal::ONE))
        }
    }
}

fn build_engine(config: &BountyWardenConfig) -> Result<RewardEngine, CliError> {
    let quality = QualityScorer::new(build_judge(config), &config.quality);
    RewardEngine::from_config(config, quality)
        .map_err(|e| CliError::ConfigError(format!("Invalid reward configuration: {}", e)))
}

/// Builds the permit generator from the configuration and the signer key in
/// the environment. A missing key is reported by the generator itself.
pub fn build_permit_generator(
    config: &BountyWardenConfig,
    signer_key: Option<&str>,
) -> Result<PermitGenerator, CliError> {
    let wallets = config
        .wallet_entries()
        .map_err(|e| CliError::ConfigError(e.to_string()))?
        .into_iter()
        .collect();

    let signer: Option<Arc<dyn PermitSigner>> = match signer_key {
        Some(key) => {
            let signer = LocalKeySigner::from_stored_key(key, &HexKeyDecryptor)
                .map_err(|e| CliError::ConfigError(e.to_string()))?;
            info!(owner = signer.checksum_address().as_str(), "Loaded the permit signer");
            Some(Arc::new(signer))
        }
        None => None,
    };

    Ok(PermitGenerator::new(
        config.permits.clone(),
        Arc::new(InMemoryWalletRegistry::new(wallets)),
        signer,
    ))
}

/// Scores a snapshot without touching any developer platform.
pub async fn score_snapshot(
    engine: &RewardEngine,
    snapshot: &IssueSnapshot,
    permits: Option<&PermitGenerator>,
    token_symbol: &str,
) -> Result<RewardOutcome, CliError> {
    let final_scores = engine
        .compute_rewards(&snapshot.issue, &snapshot.comments, &snapshot.collaborators)
        .await;

    let permits = match permits {
        Some(generator) => Some(
            generator
                .generate_permits(&final_scores, snapshot.issue.id)
                .await
                .map_err(|e| CliError::ScoringFailed(e.to_string()))?,
        ),
        None => None,
    };

    let comment = render_rewards_summary(&final_scores, permits.as_ref(), token_symbol);
    Ok(RewardOutcome {
        final_scores,
        permits,
        comment,
    })
}

fn map_warden_error(e: BountyWardenError) -> CliError {
    match e {
        BountyWardenError::GitProviderError(m) => CliError::NetworkError(m),
        BountyWardenError::FailedToUpdateIssue(m) => CliError::NetworkError(m),
        BountyWardenError::ConfigError(m) => CliError::ConfigError(m),
        BountyWardenError::PermitError(e) => CliError::ScoringFailed(e.to_string()),
    }
}

/// Execute the score command
#[instrument]
pub async fn execute(args: ScoreArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let engine = build_engine(&config)?;
    let token_symbol = config.permits.token_symbol.clone();

    let generator = if args.sign {
        let key = std::env::var(SIGNER_KEY_ENV).ok();
        Some(build_permit_generator(&config, key.as_deref())?)
    } else {
        None
    };

    let outcome = match (&args.snapshot, &args.repo, args.issue) {
        (Some(path), _, _) => {
            let content = fs::read_to_string(path).map_err(|e| {
                CliError::InvalidArguments(format!("Failed to read {:?}: {}", path, e))
            })?;
            let snapshot: IssueSnapshot = serde_json::from_str(&content).map_err(|e| {
                CliError::InvalidArguments(format!("Invalid snapshot {:?}: {}", path, e))
            })?;
            score_snapshot(&engine, &snapshot, generator.as_ref(), &token_symbol).await?
        }
        (None, Some(repo), Some(issue)) => {
            let (owner, name) = parse_repo(repo)?;
            let token = std::env::var(GITHUB_TOKEN_ENV).map_err(|_| {
                CliError::AuthError(format!("{} is not set", GITHUB_TOKEN_ENV))
            })?;
            let client =
                create_token_client(&token).map_err(|e| CliError::AuthError(e.to_string()))?;
            let warden = BountyWarden::new(GitHubProvider::new(client), engine)
                .with_token_symbol(token_symbol.clone());

            let result = if args.post {
                warden
                    .process_closed_issue(&owner, &name, issue, &args.pull_request, generator.as_ref())
                    .await
            } else {
                warden
                    .compute_issue_rewards(&owner, &name, issue, &args.pull_request, generator.as_ref())
                    .await
            };
            result.map_err(map_warden_error)?
        }
        _ => {
            return Err(CliError::InvalidArguments(
                "Either --snapshot or --repo together with --issue is required".to_string(),
            ))
        }
    };

    let output = match args.format {
        OutputFormat::Table => render_table(&outcome.final_scores, outcome.permits.as_ref(), &token_symbol),
        OutputFormat::Json => render_json(&outcome.final_scores, outcome.permits.as_ref())?,
    };
    println!("{}", output);
    Ok(())
}

/// One line per user, highest total first.
pub fn render_table(
    final_scores: &FinalScores,
    permits: Option<&PermitResults>,
    token_symbol: &str,
) -> String {
    let mut rewards: Vec<_> = final_scores.values().collect();
    rewards.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.user.login.cmp(&b.user.login)));

    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:<24} {:<13} {:>20}  {}",
        "USER", "ROLE", "TOTAL", "PERMIT"
    );
    for reward in rewards {
        let permit = match permits.and_then(|p| p.get(&reward.user.id)) {
            Some(Ok(permit)) => permit.claim_url.clone(),
            Some(Err(e)) => e.to_string(),
            None => "-".to_string(),
        };
        let _ = writeln!(
            table,
            "{:<24} {:<13} {:>20}  {}",
            format!("@{}", reward.user.login),
            reward.role.as_str(),
            format!("{} {}", reward.total.normalize(), token_symbol),
            permit
        );
    }
    table.trim_end().to_string()
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum PermitReport<'a> {
    Generated(&'a GeneratedPermit),
    Failed { error: String },
}

#[derive(Serialize)]
struct ScoreReport<'a> {
    rewards: &'a FinalScores,

    #[serde(skip_serializing_if = "Option::is_none")]
    permits: Option<BTreeMap<u64, PermitReport<'a>>>,
}

/// The reward ledger, and the permits when generated, as pretty JSON.
pub fn render_json(
    final_scores: &FinalScores,
    permits: Option<&PermitResults>,
) -> Result<String, CliError> {
    let report = ScoreReport {
        rewards: final_scores,
        permits: permits.map(|results| {
            results
                .iter()
                .map(|(user, result)| {
                    let entry = match result {
                        Ok(permit) => PermitReport::Generated(permit),
                        Err(e) => PermitReport::Failed {
                            error: e.to_string(),
                        },
                    };
                    (*user, entry)
                })
                .collect()
        }),
    };

    serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::Other(format!("Failed to serialize the report: {}", e)))
}
