//! # Reward Summary Rendering
//!
//! Builds the HTML comment posted on a closed issue: one collapsible block
//! per rewarded user with the claim link, a per-style overview and the
//! scores of every comment. Rendering is pure; nothing here talks to a
//! provider.

use std::collections::BTreeMap;
use std::fmt::Write;

use indoc::formatdoc;
use rust_decimal::Decimal;

use crate::combiner::{CommentReward, FinalScores, UserReward};
use crate::config::REWARD_COMMENT_MARKER;
use crate::errors::PermitError;
use crate::permit::{GeneratedPermit, PermitResults};

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

/// Number of characters of a comment shown in the summary table
const EXCERPT_LENGTH: usize = 64;

/// Renders the reward summary for every user in `final_scores`.
///
/// Users are listed by descending total. When `permits` is given, each
/// block links the user's claim page, or explains why there is none.
pub fn render_rewards_summary(
    final_scores: &FinalScores,
    permits: Option<&PermitResults>,
    token_symbol: &str,
) -> String {
    let mut rewards: Vec<&UserReward> = final_scores.values().collect();
    rewards.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.user.login.cmp(&b.user.login)));

    let mut output = String::new();
    output.push_str(REWARD_COMMENT_MARKER);
    output.push('\n');

    if rewards.is_empty() {
        output.push_str("No contributions were eligible for a reward on this issue.\n");
        return output;
    }

    for reward in rewards {
        let permit = permits.and_then(|p| p.get(&reward.user.id));
        output.push_str(&render_user(reward, permit, token_symbol));
    }

    output
}

/// Renders the comment posted when a run cannot produce rewards.
pub fn render_error_summary(message: &str) -> String {
    formatdoc!(
        "{marker}
        > [!CAUTION]
        > Rewards could not be computed for this issue.
        >
        > {message}
        ",
        marker = REWARD_COMMENT_MARKER,
        message = escape_html(message)
    )
}

fn render_user(
    reward: &UserReward,
    permit: Option<&Result<GeneratedPermit, PermitError>>,
    token_symbol: &str,
) -> String {
    let amount = format!("{} {}", format_decimal(reward.total), escape_html(token_symbol));
    let (heading, note) = match permit {
        Some(Ok(p)) => (
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">[ {} ]</a>",
                escape_html(&p.claim_url),
                amount
            ),
            String::new(),
        ),
        Some(Err(PermitError::WalletNotRegistered(login))) => (
            format!("[ {} ]", amount),
            format!(
                "<p>@{} has no wallet registered. Register one with <code>/wallet 0x...</code> to claim this reward.</p>\n",
                escape_html(login)
            ),
        ),
        Some(Err(e)) => (
            format!("[ {} ]", amount),
            format!("<p>No permit was generated: {}</p>\n", escape_html(&e.to_string())),
        ),
        None => (format!("[ {} ]", amount), String::new()),
    };

    let mut block = String::new();
    let _ = writeln!(block, "<details>");
    let _ = writeln!(
        block,
        "<summary><b><h3>&nbsp;{}&nbsp;</h3><h6>@{}</h6></b></summary>",
        heading,
        escape_html(&reward.user.login)
    );
    block.push_str(&note);
    block.push_str(&render_overview(reward));
    block.push_str(&render_comments(reward));
    let _ = writeln!(block, "</details>");
    block
}

fn render_overview(reward: &UserReward) -> String {
    let mut per_style: BTreeMap<String, (usize, Decimal)> = BTreeMap::new();
    for contribution in reward.contributions() {
        let entry = per_style
            .entry(contribution.style.to_string())
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += contribution.final_score;
    }

    let mut table = String::new();
    let _ = writeln!(table, "<h6>Contributions Overview</h6>");
    let _ = writeln!(
        table,
        "<table><thead><tr><th>Contribution</th><th>Count</th><th>Reward</th></tr></thead><tbody>"
    );
    for (style, (count, total)) in &per_style {
        let _ = writeln!(
            table,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            style,
            count,
            format_decimal(*total)
        );
    }
    let _ = writeln!(table, "</tbody></table>");
    table
}

fn render_comments(reward: &UserReward) -> String {
    let mut table = String::new();
    let _ = writeln!(table, "<h6>Conversation Rewards</h6>");
    let _ = writeln!(
        table,
        "<table><thead><tr><th>Comment</th><th>Formatting</th><th>Relevance</th><th>Reward</th></tr></thead><tbody>"
    );
    for contribution in reward.contributions() {
        table.push_str(&render_comment_row(contribution));
    }
    let _ = writeln!(table, "</tbody></table>");
    table
}

fn render_comment_row(contribution: &CommentReward) -> String {
    let mut formatting = String::new();
    let _ = writeln!(
        formatting,
        "words: {}",
        format_decimal(contribution.word_score_total)
    );
    for (element, detail) in &contribution.element_score_details {
        let _ = writeln!(
            formatting,
            "{}: count {}, words {}, score {}",
            element,
            detail.count,
            detail.words,
            format_decimal(detail.score)
        );
    }

    format!(
        "<tr><td><h6><a href=\"{url}\" target=\"_blank\" rel=\"noopener\">{excerpt}</a></h6></td><td><details><summary>{formatting_total}</summary><pre>{formatting}</pre></details></td><td>{quality}</td><td>{reward}</td></tr>\n",
        url = escape_html(&contribution.url),
        excerpt = excerpt(&contribution.content),
        formatting_total = format_decimal(contribution.element_score_total),
        formatting = formatting.trim_end(),
        quality = format_decimal(contribution.quality_score),
        reward = format_decimal(contribution.final_score),
    )
}

/// The first characters of a comment on one line, HTML escaped.
pub fn excerpt(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut shortened: String = collapsed.chars().take(EXCERPT_LENGTH).collect();
    if collapsed.chars().count() > EXCERPT_LENGTH {
        shortened.push('…');
    }
    escape_html(&shortened)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}
