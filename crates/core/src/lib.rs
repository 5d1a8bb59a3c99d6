//! # Bounty Warden Core
//!
//! Core business logic for turning the conversation on a closed issue into
//! rewards for the people who took part in it.
//!
//! A scoring run:
//! - classifies every human participant as issuer, assignee, collaborator or
//!   default contributor
//! - scores each eligible comment for quantity (words and formatting) and
//!   quality (relevance to the issue)
//! - converts each user's total into a signed Permit2 payment permit
//! - posts a summary of the rewards back on the issue
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bounty_warden_developer_platforms::IssueProvider;
//! use bounty_warden_core::{BountyWarden, RewardEngine};
//! use bounty_warden_core::config::QualityConfig;
//! use bounty_warden_core::quality::{FixedRelevanceJudge, QualityScorer};
//! use rust_decimal::Decimal;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use anyhow::Result;
//!
//! async fn reward_issue<P: IssueProvider + std::fmt::Debug>(provider: P) -> Result<()> {
//!     let judge = Arc::new(FixedRelevanceJudge::new(Decimal::ONE));
//!     let quality = QualityScorer::new(judge, &QualityConfig::default());
//!     let engine = RewardEngine::new(BTreeMap::new(), quality);
//!
//!     let warden = BountyWarden::new(provider, engine);
//!
//!     // Score issue #123, including the reviews on pull request #124
//!     let outcome = warden
//!         .process_closed_issue("owner", "repo", 123, &[124], None)
//!         .await?;
//!
//!     for reward in outcome.final_scores.values() {
//!         println!("@{} earned {}", reward.user.login, reward.total);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use bounty_warden_developer_platforms::models::{Comment, Issue};
use bounty_warden_developer_platforms::IssueProvider;
use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument, warn};

pub mod combiner;
use combiner::{combine_scores, FinalScores, QualityScore};

pub mod config;
use config::{BountyWardenConfig, PermitConfig, RubricConfig};

pub mod errors;
use errors::{BountyWardenError, ConfigLoadError};

pub mod filter;
use filter::filter_comments;

pub mod markup;

pub mod permit;
use permit::{PermitGenerator, PermitResults};

pub mod quality;
use quality::QualityScorer;

pub mod render;
use render::{render_error_summary, render_rewards_summary};

pub mod roles;
use roles::RoleClassification;

pub mod rubric;
use rubric::{CompiledRubric, ScoringRubric};

pub mod style;
use style::ContributionStyle;

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Computes rewards from an issue snapshot.
///
/// The engine holds the rubric of every contribution style and the quality
/// scorer. It never talks to a developer platform, so a run is a function of
/// the snapshot it is given (and of the relevance judge).
pub struct RewardEngine {
    rubrics: BTreeMap<ContributionStyle, RubricConfig>,
    quality: QualityScorer,
}

impl fmt::Debug for RewardEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewardEngine")
            .field("rubrics", &self.rubrics.len())
            .finish_non_exhaustive()
    }
}

impl RewardEngine {
    /// Styles missing from `rubrics` use [`RubricConfig::default_for`].
    pub fn new(rubrics: BTreeMap<ContributionStyle, RubricConfig>, quality: QualityScorer) -> Self {
        Self { rubrics, quality }
    }

    /// Creates an engine with the rubrics resolved from a loaded configuration.
    pub fn from_config(
        config: &BountyWardenConfig,
        quality: QualityScorer,
    ) -> Result<Self, ConfigLoadError> {
        Ok(Self::new(config.rewards.resolve()?, quality))
    }

    fn rubric_for(&self, style: ContributionStyle) -> RubricConfig {
        self.rubrics
            .get(&style)
            .cloned()
            .unwrap_or_else(|| RubricConfig::default_for(style))
    }

    /// Computes the reward ledger of an issue.
    ///
    /// # Arguments
    ///
    /// * `issue` - The issue; its body is scored as the issuer's specification
    /// * `comments` - Every comment of the conversation, issue thread and reviews
    /// * `collaborator_ids` - Ids of users with write access to the repository
    #[instrument(skip(self, issue, comments, collaborator_ids), fields(issue = issue.number))]
    pub async fn compute_rewards(
        &self,
        issue: &Issue,
        comments: &[Comment],
        collaborator_ids: &[u64],
    ) -> FinalScores {
        let classification = RoleClassification::classify(issue, comments, collaborator_ids);
        self.compute_classified_rewards(issue, comments, &classification)
            .await
    }

    /// Computes the reward ledger for an already classified conversation.
    pub async fn compute_classified_rewards(
        &self,
        issue: &Issue,
        comments: &[Comment],
        classification: &RoleClassification,
    ) -> FinalScores {
        let buckets = filter_comments(issue, comments, classification);

        let rubrics: Vec<CompiledRubric> = buckets
            .iter()
            .map(|(style, list)| {
                let mut rubric = ScoringRubric::new(*style, self.rubric_for(*style));
                for comment in list {
                    rubric.score_comment(comment);
                }
                rubric.compile_user_scores()
            })
            .collect();

        let mut quality_scores = Vec::new();
        let mut judged: Vec<(ContributionStyle, &Comment)> = Vec::new();
        for (style, list) in &buckets {
            for comment in list {
                if style.is_specification() {
                    quality_scores.push(QualityScore {
                        comment_id: comment.id,
                        user_id: comment.author.id,
                        style: *style,
                        score: Decimal::ONE,
                    });
                } else {
                    judged.push((*style, comment));
                }
            }
        }

        let specification = issue.body.as_deref().unwrap_or_default();
        let bodies: Vec<String> = judged.iter().map(|(_, c)| c.body.clone()).collect();
        let relevance = self.quality.score(specification, &bodies).await;
        quality_scores.extend(judged.iter().zip(relevance).map(|((style, comment), score)| {
            QualityScore {
                comment_id: comment.id,
                user_id: comment.author.id,
                style: *style,
                score,
            }
        }));

        let final_scores = combine_scores(&buckets, &rubrics, &quality_scores, classification);
        debug!(
            issue = issue.number,
            users = final_scores.len(),
            judged = bodies.len(),
            "Computed rewards"
        );
        final_scores
    }
}

/// Everything a scoring run produced.
#[derive(Debug, Clone)]
pub struct RewardOutcome {
    /// The reward ledger, keyed by user id
    pub final_scores: FinalScores,

    /// The permits, when permit generation was requested
    pub permits: Option<PermitResults>,

    /// The rendered summary comment
    pub comment: String,
}

/// Main struct for rewarding the contributors of closed issues.
///
/// `BountyWarden` fetches an issue conversation through an [`IssueProvider`],
/// scores it with a [`RewardEngine`], generates permits and publishes the
/// result as a comment on the issue.
///
/// # Examples
///
/// ```rust,no_run
/// use bounty_warden_developer_platforms::IssueProvider;
/// use bounty_warden_core::{BountyWarden, RewardEngine};
/// use anyhow::Result;
///
/// async fn example<P: IssueProvider + std::fmt::Debug>(provider: P, engine: RewardEngine) -> Result<()> {
///     let warden = BountyWarden::new(provider, engine).with_token_symbol("WXDAI");
///
///     let outcome = warden.process_closed_issue("owner", "repo", 123, &[], None).await?;
///
///     println!("Posted: {}", outcome.comment);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct BountyWarden<P: IssueProvider + std::fmt::Debug> {
    provider: P,
    engine: RewardEngine,
    token_symbol: String,
}

impl<P: IssueProvider + std::fmt::Debug> BountyWarden<P> {
    /// Creates a new `BountyWarden` instance.
    ///
    /// When no permits are generated the summary shows amounts in the default
    /// payment token symbol.
    pub fn new(provider: P, engine: RewardEngine) -> Self {
        Self {
            provider,
            engine,
            token_symbol: PermitConfig::default().token_symbol,
        }
    }

    /// Sets the token symbol shown in summaries when no permits are generated.
    pub fn with_token_symbol(mut self, token_symbol: impl Into<String>) -> Self {
        self.token_symbol = token_symbol.into();
        self
    }

    pub fn engine(&self) -> &RewardEngine {
        &self.engine
    }

    /// Fetches the complete conversation of an issue: the issue itself, its
    /// comment thread and the review threads of the linked pull requests.
    #[instrument(skip(self))]
    async fn fetch_conversation(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
        linked_pull_requests: &[u64],
    ) -> Result<(Issue, Vec<Comment>), BountyWardenError> {
        let issue = self
            .provider
            .get_issue(repo_owner, repo_name, issue_number)
            .await
            .map_err(|e| {
                BountyWardenError::GitProviderError(format!(
                    "Failed to fetch issue #{}: {}",
                    issue_number, e
                ))
            })?;

        let mut comments = self
            .provider
            .list_comments(repo_owner, repo_name, issue_number)
            .await
            .map_err(|e| {
                BountyWardenError::GitProviderError(format!(
                    "Failed to list comments of issue #{}: {}",
                    issue_number, e
                ))
            })?;

        for pull_request in linked_pull_requests {
            let reviews = self
                .provider
                .list_reviews(repo_owner, repo_name, *pull_request)
                .await
                .map_err(|e| {
                    BountyWardenError::GitProviderError(format!(
                        "Failed to list reviews of pull request #{}: {}",
                        pull_request, e
                    ))
                })?;
            debug!(
                repository_owner = repo_owner,
                repository = repo_name,
                issue = issue_number,
                pull_request = *pull_request,
                count = reviews.len(),
                "Fetched review comments",
            );
            comments.extend(reviews);
        }

        Ok((issue, comments))
    }

    /// Computes the rewards of an issue without publishing anything.
    ///
    /// # Returns
    ///
    /// The outcome with the rendered summary, or an error when the
    /// conversation cannot be fetched or the permit configuration is invalid.
    #[instrument(skip(self, permits))]
    pub async fn compute_issue_rewards(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
        linked_pull_requests: &[u64],
        permits: Option<&PermitGenerator>,
    ) -> Result<RewardOutcome, BountyWardenError> {
        let (issue, comments) = self
            .fetch_conversation(repo_owner, repo_name, issue_number, linked_pull_requests)
            .await?;
        info!(
            repository_owner = repo_owner,
            repository = repo_name,
            issue = issue_number,
            comments = comments.len(),
            "Scoring the conversation of the issue",
        );

        let classification = RoleClassification::classify_with_provider(
            &self.provider,
            repo_owner,
            repo_name,
            &issue,
            &comments,
        )
        .await;
        let final_scores = self
            .engine
            .compute_classified_rewards(&issue, &comments, &classification)
            .await;

        let (permits, token_symbol) = match permits {
            Some(generator) => {
                let results = generator.generate_permits(&final_scores, issue.id).await?;
                (Some(results), generator.token_symbol().to_string())
            }
            None => (None, self.token_symbol.clone()),
        };

        let comment = render_rewards_summary(&final_scores, permits.as_ref(), &token_symbol);
        Ok(RewardOutcome {
            final_scores,
            permits,
            comment,
        })
    }

    /// Scores a closed issue and publishes the result on it.
    ///
    /// Every run ends with exactly one comment on the issue: the reward
    /// summary, or an explanation of why no rewards could be computed. In
    /// the latter case the error is returned after the comment is posted.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `issue_number` - The closed issue
    /// * `linked_pull_requests` - Pull requests whose reviews are part of the conversation
    /// * `permits` - The permit generator, or `None` to only report scores
    #[instrument(skip(self, permits))]
    pub async fn process_closed_issue(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
        linked_pull_requests: &[u64],
        permits: Option<&PermitGenerator>,
    ) -> Result<RewardOutcome, BountyWardenError> {
        let outcome = self
            .compute_issue_rewards(
                repo_owner,
                repo_name,
                issue_number,
                linked_pull_requests,
                permits,
            )
            .await;

        match outcome {
            Ok(outcome) => {
                self.post_comment(repo_owner, repo_name, issue_number, &outcome.comment)
                    .await?;
                info!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    issue = issue_number,
                    users = outcome.final_scores.len(),
                    "Posted the reward summary on the issue",
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    issue = issue_number,
                    error = %e,
                    "Failed to compute rewards",
                );
                let comment = render_error_summary(&e.to_string());
                if let Err(post_error) = self
                    .post_comment(repo_owner, repo_name, issue_number, &comment)
                    .await
                {
                    warn!(
                        repository_owner = repo_owner,
                        repository = repo_name,
                        issue = issue_number,
                        error = %post_error,
                        "Failed to post the error comment",
                    );
                }
                Err(e)
            }
        }
    }

    async fn post_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
        comment: &str,
    ) -> Result<(), BountyWardenError> {
        self.provider
            .add_comment(repo_owner, repo_name, issue_number, comment)
            .await
            .map_err(|_| BountyWardenError::FailedToUpdateIssue("Failed to add comment".to_string()))
    }
}
