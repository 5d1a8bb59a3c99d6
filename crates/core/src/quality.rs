//! # Quality Scoring
//!
//! Rates how relevant each comment is to the issue specification. The rating
//! is a multiplier in `[0, 1]` applied to the comment's quantity score.
//!
//! The actual judgment is delegated to a [`RelevanceJudge`]. The
//! [`QualityScorer`] batches comments, bounds the number of judgments in
//! flight and absorbs judge failures, so a scoring run always gets one
//! score per comment.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::config::QualityConfig;
use crate::errors::QualityError;

pub mod openai;

#[cfg(test)]
#[path = "quality_tests.rs"]
mod tests;

/// Judges the relevance of comments to a specification.
///
/// Implementations return one score per comment, in the order the comments
/// were given. Scores outside `[0, 1]` are clamped by the caller.
#[async_trait]
pub trait RelevanceJudge: Send + Sync {
    async fn judge_relevance(
        &self,
        specification: &str,
        comments: &[String],
    ) -> Result<Vec<Decimal>, QualityError>;
}

/// A judge that rates every comment the same.
#[derive(Debug, Clone, Copy)]
pub struct FixedRelevanceJudge {
    score: Decimal,
}

impl FixedRelevanceJudge {
    pub fn new(score: Decimal) -> Self {
        Self { score }
    }
}

#[async_trait]
impl RelevanceJudge for FixedRelevanceJudge {
    async fn judge_relevance(
        &self,
        _specification: &str,
        comments: &[String],
    ) -> Result<Vec<Decimal>, QualityError> {
        Ok(vec![self.score; comments.len()])
    }
}

/// Scores comments through a [`RelevanceJudge`].
#[derive(Clone)]
pub struct QualityScorer {
    judge: Arc<dyn RelevanceJudge>,
    batch_size: usize,
    max_concurrency: usize,
}

impl QualityScorer {
    pub fn new(judge: Arc<dyn RelevanceJudge>, config: &QualityConfig) -> Self {
        Self {
            judge,
            batch_size: config.batch_size.max(1),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Returns one score in `[0, 1]` per comment, in input order.
    ///
    /// A batch that fails, or returns the wrong number of scores, is judged
    /// again one comment at a time. A comment that still cannot be judged
    /// scores zero.
    #[instrument(skip(self, specification, comments), fields(comments = comments.len()))]
    pub async fn score(&self, specification: &str, comments: &[String]) -> Vec<Decimal> {
        if comments.is_empty() {
            return Vec::new();
        }

        let batches: Vec<Vec<Decimal>> = stream::iter(comments.chunks(self.batch_size).enumerate())
            .map(|(index, batch)| self.score_batch(specification, index, batch))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        batches.into_iter().flatten().collect()
    }

    async fn score_batch(&self, specification: &str, index: usize, batch: &[String]) -> Vec<Decimal> {
        let result = self.judge.judge_relevance(specification, batch).await;
        match result {
            Ok(scores) if scores.len() == batch.len() => {
                debug!(batch = index, size = batch.len(), "Judged comment batch");
                return scores.into_iter().map(clamp).collect();
            }
            Ok(scores) => {
                let error = QualityError::LengthMismatch {
                    expected: batch.len(),
                    received: scores.len(),
                };
                warn!(batch = index, error = %error, "Relevance judge returned a partial batch");
            }
            Err(e) => warn!(batch = index, error = %e, "Relevance judge failed for batch"),
        }

        if batch.len() == 1 {
            return vec![Decimal::ZERO];
        }

        let mut scores = Vec::with_capacity(batch.len());
        for (offset, comment) in batch.iter().enumerate() {
            scores.push(self.score_single(specification, index, offset, comment).await);
        }
        scores
    }

    async fn score_single(
        &self,
        specification: &str,
        batch: usize,
        offset: usize,
        comment: &str,
    ) -> Decimal {
        let single = [comment.to_string()];
        match self.judge.judge_relevance(specification, &single).await {
            Ok(scores) if scores.len() == 1 => clamp(scores[0]),
            Ok(scores) => {
                warn!(
                    batch,
                    offset,
                    received = scores.len(),
                    "Relevance judge returned no usable score, using 0"
                );
                Decimal::ZERO
            }
            Err(e) => {
                warn!(batch, offset, error = %e, "Relevance judge failed for comment, using 0");
                Decimal::ZERO
            }
        }
    }
}

fn clamp(score: Decimal) -> Decimal {
    score.max(Decimal::ZERO).min(Decimal::ONE)
}
