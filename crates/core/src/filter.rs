//! Buckets an issue conversation into per-style comment lists.

use std::collections::BTreeMap;

use bounty_warden_developer_platforms::models::{
    Comment, CommentKind, ContributionView, Issue,
};
use tracing::debug;

use crate::config::{REWARD_COMMENT_MARKER, SLASH_COMMAND_REGEX};
use crate::roles::RoleClassification;
use crate::style::{ContributionKind, ContributionStyle};

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;

/// Why a comment earns nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disqualification {
    NotHuman,
    BlankBody,
    SlashCommand,
    RewardSummary,
}

/// Returns the reason `comment` is excluded from scoring, if any.
pub fn disqualification(comment: &Comment) -> Option<Disqualification> {
    let body = comment.body.trim();

    if !comment.author.is_human() {
        Some(Disqualification::NotHuman)
    } else if body.is_empty() {
        Some(Disqualification::BlankBody)
    } else if SLASH_COMMAND_REGEX.is_match(body) {
        Some(Disqualification::SlashCommand)
    } else if body.contains(REWARD_COMMENT_MARKER) {
        Some(Disqualification::RewardSummary)
    } else {
        None
    }
}

/// Builds the comment scored as the issue specification.
///
/// Returns `None` when the issue has no body or was opened by a bot.
pub fn specification_comment(issue: &Issue) -> Option<Comment> {
    let body = issue.body.as_deref().unwrap_or_default();
    if body.trim().is_empty() || !issue.author.is_human() {
        return None;
    }

    Some(Comment {
        id: issue.id,
        issue_number: issue.number,
        author: issue.author.clone(),
        body: body.to_string(),
        created_at: Default::default(),
        html_url: issue.html_url.clone(),
        view: ContributionView::Issue,
        kind: CommentKind::Comment,
    })
}

/// Groups `comments` by contribution style.
///
/// The result holds an entry, possibly empty, for every style. The issue body
/// is the only member of the specification style. A comment lands in at most
/// one style; comments whose (view, role, kind) combination is not scored are
/// dropped.
pub fn filter_comments(
    issue: &Issue,
    comments: &[Comment],
    classification: &RoleClassification,
) -> BTreeMap<ContributionStyle, Vec<Comment>> {
    let mut buckets: BTreeMap<ContributionStyle, Vec<Comment>> = ContributionStyle::ALL
        .into_iter()
        .map(|style| (style, Vec::new()))
        .collect();

    if let Some(specification) = specification_comment(issue) {
        buckets
            .entry(ContributionStyle::IssueIssuerSpecification)
            .or_default()
            .push(specification);
    }

    for comment in comments {
        if let Some(reason) = disqualification(comment) {
            debug!(
                comment = comment.id,
                user = comment.author.login.as_str(),
                reason = ?reason,
                "Skipping comment"
            );
            continue;
        }

        let Some(role) = classification.role_of(comment.author.id) else {
            continue;
        };

        let kind = ContributionKind::from(comment.kind);
        match ContributionStyle::from_parts(comment.view, role, kind) {
            Some(style) => buckets.entry(style).or_default().push(comment.clone()),
            None => debug!(
                comment = comment.id,
                view = comment.view.as_str(),
                role = role.as_str(),
                kind = kind.as_str(),
                "Comment has no scored contribution style"
            ),
        }
    }

    buckets
}
