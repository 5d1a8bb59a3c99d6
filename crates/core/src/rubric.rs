//! # Scoring Rubric
//!
//! A rubric turns the comments of one contribution style into quantity
//! scores. It is used in two phases:
//!
//! 1. A [`ScoringRubric`] accumulates word and element scores per user and
//!    comment. Recomputing a comment overwrites its previous score.
//! 2. [`ScoringRubric::compile_user_scores`] consumes the rubric and returns a
//!    read-only [`CompiledRubric`] with per-user totals.
//!
//! Scoring is total: malformed markdown or HTML degrades to plain text and
//! never produces an error.

use std::collections::BTreeMap;

use bounty_warden_developer_platforms::models::Comment;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::RubricConfig;
use crate::markup::{element_stats, render_markdown, tokenize, visible_text};
use crate::style::ContributionStyle;

#[cfg(test)]
#[path = "rubric_tests.rs"]
mod tests;

/// Score earned by one HTML element within a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementScoreDetail {
    /// Number of start tags
    pub count: usize,
    /// Words inside the element
    pub words: usize,
    pub score: Decimal,
}

/// The quantity score of one comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentScoreDetails {
    pub word_score_total: Decimal,
    /// Word → score accumulated over its occurrences
    pub word_score_details: BTreeMap<String, Decimal>,
    pub element_score_total: Decimal,
    pub element_score_details: BTreeMap<String, ElementScoreDetail>,
}

impl CommentScoreDetails {
    /// Word score plus element score.
    pub fn quantity(&self) -> Decimal {
        self.word_score_total + self.element_score_total
    }
}

/// Per-user sums over a compiled rubric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserScoreTotal {
    pub word_score: Decimal,
    pub element_score: Decimal,
}

impl UserScoreTotal {
    pub fn quantity(&self) -> Decimal {
        self.word_score + self.element_score
    }
}

type ScoreTable = BTreeMap<u64, BTreeMap<u64, CommentScoreDetails>>;

/// Accumulates quantity scores for one contribution style.
#[derive(Debug, Clone)]
pub struct ScoringRubric {
    style: ContributionStyle,
    config: RubricConfig,
    scores: ScoreTable,
}

impl ScoringRubric {
    pub fn new(style: ContributionStyle, config: RubricConfig) -> Self {
        Self {
            style,
            config,
            scores: BTreeMap::new(),
        }
    }

    pub fn style(&self) -> ContributionStyle {
        self.style
    }

    pub fn config(&self) -> &RubricConfig {
        &self.config
    }

    fn entry(&mut self, user_id: u64, comment_id: u64) -> &mut CommentScoreDetails {
        self.scores
            .entry(user_id)
            .or_default()
            .entry(comment_id)
            .or_default()
    }

    /// Credits every visible word of the comment and stores the result under
    /// `user_id`. Text inside disabled elements is not counted.
    pub fn compute_word_score(&mut self, comment: &Comment, user_id: u64) -> Decimal {
        let html = render_markdown(&comment.body);
        let text = visible_text(&html, &self.config.disabled_elements);
        let word_value = self.config.word_value;

        let mut details: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut total = Decimal::ZERO;
        for word in tokenize(&text) {
            *details.entry(word).or_default() += word_value;
            total += word_value;
        }

        let entry = self.entry(user_id, comment.id);
        entry.word_score_total = total;
        entry.word_score_details = details;
        total
    }

    /// Credits the formatting elements of the comment and stores the result
    /// under `user_id`.
    pub fn compute_element_score(&mut self, comment: &Comment, user_id: u64) -> Decimal {
        let html = render_markdown(&comment.body);
        let multiplier = self.config.formatting_multiplier;
        let stats = element_stats(&html, self.config.element_weights.keys());

        let mut details = BTreeMap::new();
        let mut total = Decimal::ZERO;
        for (element, stat) in stats {
            let weight = self
                .config
                .element_weights
                .get(&element)
                .copied()
                .unwrap_or_default();
            let score = Decimal::from(stat.count) * weight * multiplier;
            if stat.count == 0 && score.is_zero() {
                continue;
            }

            total += score;
            details.insert(
                element,
                ElementScoreDetail {
                    count: stat.count,
                    words: stat.words,
                    score,
                },
            );
        }

        let entry = self.entry(user_id, comment.id);
        entry.element_score_total = total;
        entry.element_score_details = details;
        total
    }

    /// Computes both scores for a comment, credited to its author.
    pub fn score_comment(&mut self, comment: &Comment) -> Decimal {
        let user_id = comment.author.id;
        self.compute_word_score(comment, user_id) + self.compute_element_score(comment, user_id)
    }

    /// Finishes accumulation and sums the scores of every user.
    pub fn compile_user_scores(self) -> CompiledRubric {
        let totals: BTreeMap<u64, UserScoreTotal> = self
            .scores
            .iter()
            .map(|(user_id, comments)| {
                let total = comments.values().fold(UserScoreTotal::default(), |acc, c| {
                    UserScoreTotal {
                        word_score: acc.word_score + c.word_score_total,
                        element_score: acc.element_score + c.element_score_total,
                    }
                });
                (*user_id, total)
            })
            .collect();

        debug!(
            style = %self.style,
            users = totals.len(),
            "Compiled rubric"
        );

        CompiledRubric {
            style: self.style,
            scores: self.scores,
            totals,
        }
    }
}

/// The read-only result of a scoring rubric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRubric {
    style: ContributionStyle,
    scores: ScoreTable,
    totals: BTreeMap<u64, UserScoreTotal>,
}

impl CompiledRubric {
    pub fn style(&self) -> ContributionStyle {
        self.style
    }

    pub fn comment_score(&self, user_id: u64, comment_id: u64) -> Option<&CommentScoreDetails> {
        self.scores.get(&user_id)?.get(&comment_id)
    }

    pub fn user_total(&self, user_id: u64) -> Option<&UserScoreTotal> {
        self.totals.get(&user_id)
    }

    pub fn user_totals(&self) -> &BTreeMap<u64, UserScoreTotal> {
        &self.totals
    }

    /// Every scored (user id, comment id, details) triple.
    pub fn comment_scores(&self) -> impl Iterator<Item = (u64, u64, &CommentScoreDetails)> + '_ {
        self.scores.iter().flat_map(|(user_id, comments)| {
            comments
                .iter()
                .map(move |(comment_id, details)| (*user_id, *comment_id, details))
        })
    }
}
