//! # Score Combination
//!
//! Joins quantity scores from the compiled rubrics with quality scores and
//! produces the final reward ledger.

use std::collections::BTreeMap;

use bounty_warden_developer_platforms::models::{Comment, User};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::rubric::{CommentScoreDetails, CompiledRubric, ElementScoreDetail};
use crate::roles::RoleClassification;
use crate::style::{ContributionStyle, Role};

#[cfg(test)]
#[path = "combiner_tests.rs"]
mod tests;

/// The relevance of one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityScore {
    pub comment_id: u64,
    pub user_id: u64,
    /// The bucket the comment was scored in. Comment ids are only unique
    /// within one kind of contribution.
    pub style: ContributionStyle,
    /// Multiplier in `[0, 1]`
    pub score: Decimal,
}

/// The reward earned by one comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReward {
    pub comment_id: u64,
    pub style: ContributionStyle,
    pub url: String,
    pub content: String,
    pub quantity_score: Decimal,
    pub quality_score: Decimal,
    pub final_score: Decimal,
    pub word_score_total: Decimal,
    pub element_score_total: Decimal,
    pub word_score_details: BTreeMap<String, Decimal>,
    pub element_score_details: BTreeMap<String, ElementScoreDetail>,
}

/// Everything one user earned on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub user: User,
    pub role: Role,
    /// Sum of every final score below
    pub total: Decimal,
    pub comments: Vec<CommentReward>,
    pub specification: Option<CommentReward>,
}

impl UserReward {
    fn new(user: User, role: Role) -> Self {
        Self {
            user,
            role,
            total: Decimal::ZERO,
            comments: Vec::new(),
            specification: None,
        }
    }

    /// Every rewarded contribution, specification first.
    pub fn contributions(&self) -> impl Iterator<Item = &CommentReward> {
        self.specification.iter().chain(self.comments.iter())
    }
}

/// User id → reward.
pub type FinalScores = BTreeMap<u64, UserReward>;

/// Multiplies quantity by quality for every scored comment and sums the
/// results per user.
///
/// A quality score whose comment is not in the rubric of its style is
/// ignored. Users who
/// have a scored comment appear in the result even when every one of their
/// comments ends up worth zero.
pub fn combine_scores(
    comments: &BTreeMap<ContributionStyle, Vec<Comment>>,
    rubrics: &[CompiledRubric],
    quality_scores: &[QualityScore],
    classification: &RoleClassification,
) -> FinalScores {
    let mut final_scores = FinalScores::new();

    for quality in quality_scores {
        let style = quality.style;
        let found = rubrics
            .iter()
            .find(|rubric| rubric.style() == style)
            .and_then(|rubric| rubric.comment_score(quality.user_id, quality.comment_id));
        let Some(details) = found else {
            debug!(
                comment = quality.comment_id,
                user = quality.user_id,
                style = %style,
                "No quantity score for comment, skipping"
            );
            continue;
        };
        let Some(comment) = comments
            .get(&style)
            .and_then(|list| list.iter().find(|c| c.id == quality.comment_id))
        else {
            continue;
        };

        let reward = comment_reward(style, comment, details, quality.score);
        let entry = final_scores.entry(quality.user_id).or_insert_with(|| {
            let role = classification
                .role_of(quality.user_id)
                .unwrap_or_else(|| style.role());
            UserReward::new(comment.author.clone(), role)
        });

        entry.total += reward.final_score;
        if style.is_specification() {
            entry.specification = Some(reward);
        } else {
            entry.comments.push(reward);
        }
    }

    for rubric in rubrics {
        for (user_id, comment_id, _) in rubric.comment_scores() {
            if final_scores.contains_key(&user_id) {
                continue;
            }
            let author = comments
                .get(&rubric.style())
                .and_then(|list| list.iter().find(|c| c.id == comment_id))
                .map(|c| c.author.clone());
            if let Some(author) = author {
                let role = classification
                    .role_of(user_id)
                    .unwrap_or_else(|| rubric.style().role());
                final_scores.insert(user_id, UserReward::new(author, role));
            }
        }
    }

    final_scores
}

fn comment_reward(
    style: ContributionStyle,
    comment: &Comment,
    details: &CommentScoreDetails,
    quality: Decimal,
) -> CommentReward {
    let quantity = details.quantity();
    CommentReward {
        comment_id: comment.id,
        style,
        url: comment.html_url.clone(),
        content: comment.body.clone(),
        quantity_score: quantity,
        quality_score: quality,
        final_score: quantity * quality,
        word_score_total: details.word_score_total,
        element_score_total: details.element_score_total,
        word_score_details: details.word_score_details.clone(),
        element_score_details: details.element_score_details.clone(),
    }
}
