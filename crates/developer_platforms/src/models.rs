//! # Models
//!
//! This module contains the data models used throughout Bounty Warden.
//!
//! These models represent the entities a scoring run reads from a developer
//! platform: issues, the comments and reviews left on them, and the users who
//! wrote them. They are snapshots; a scoring run never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// The type of account behind a [`User`].
///
/// Only human accounts take part in reward scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserKind {
    /// A human account
    #[default]
    User,

    /// An automated account, e.g. a GitHub App
    Bot,

    /// An organization account
    Organization,
}

impl UserKind {
    /// Maps the account type string reported by GitHub (`"User"`, `"Bot"`,
    /// `"Organization"`) onto a `UserKind`. Unknown types are treated as bots
    /// so they never receive rewards.
    pub fn from_github_type(value: &str) -> Self {
        match value {
            "User" => UserKind::User,
            "Organization" => UserKind::Organization,
            _ => UserKind::Bot,
        }
    }
}

/// Represents a user on the developer platform.
///
/// # Examples
///
/// ```
/// use bounty_warden_developer_platforms::models::{User, UserKind};
///
/// let user = User {
///     id: 42,
///     login: "octocat".to_string(),
///     kind: UserKind::User,
/// };
/// assert!(user.is_human());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// The stable numeric identifier of the user
    pub id: u64,

    /// The display name of the user
    pub login: String,

    /// The account type
    #[serde(default)]
    pub kind: UserKind,
}

impl User {
    /// Returns `true` if the account belongs to a human.
    pub fn is_human(&self) -> bool {
        self.kind == UserKind::User
    }
}

/// Represents a label on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// The name of the label
    pub name: String,
}

/// The state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

/// Represents an issue from a developer platform.
///
/// The issue body doubles as the task specification that the issuer is
/// rewarded for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// The unique identifier of the issue
    pub id: u64,

    /// The issue number within its repository
    pub number: u64,

    /// The title of the issue
    pub title: String,

    /// The user who opened the issue
    pub author: User,

    /// The markdown body of the issue, if any
    pub body: Option<String>,

    /// The user the issue is assigned to, if any
    #[serde(default)]
    pub assignee: Option<User>,

    /// The labels on the issue
    #[serde(default)]
    pub labels: Vec<Label>,

    /// Whether the issue is open or closed
    #[serde(default)]
    pub state: IssueState,

    /// The web URL of the issue
    #[serde(default)]
    pub html_url: String,
}

/// The conversation thread a comment was posted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ContributionView {
    /// The issue's own comment thread
    #[default]
    Issue,

    /// The review thread of a pull request linked to the issue
    Review,
}

impl ContributionView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionView::Issue => "Issue",
            ContributionView::Review => "Review",
        }
    }
}

/// What kind of contribution a comment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CommentKind {
    /// A plain conversation comment
    #[default]
    Comment,

    /// A review that approved the pull request
    Approval,

    /// A review that requested changes on the pull request
    Rejection,

    /// A comment attached to a line of code in the pull request
    Code,
}

/// Represents a comment on an issue or on a linked pull request.
///
/// # Examples
///
/// ```
/// use bounty_warden_developer_platforms::models::{Comment, CommentKind, ContributionView, User, UserKind};
/// use chrono::Utc;
///
/// let comment = Comment {
///     id: 456,
///     issue_number: 12,
///     author: User { id: 7, login: "octocat".to_string(), kind: UserKind::User },
///     body: "I can take a look at this.".to_string(),
///     created_at: Utc::now(),
///     html_url: String::new(),
///     view: ContributionView::Issue,
///     kind: CommentKind::Comment,
/// };
/// assert_eq!(comment.author.login, "octocat");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// The unique identifier of the comment
    pub id: u64,

    /// The number of the issue (or pull request) the comment belongs to
    pub issue_number: u64,

    /// The user who wrote the comment
    pub author: User,

    /// The markdown body of the comment
    pub body: String,

    /// When the comment was created
    pub created_at: DateTime<Utc>,

    /// The web URL of the comment
    #[serde(default)]
    pub html_url: String,

    /// The thread the comment was posted in
    #[serde(default)]
    pub view: ContributionView,

    /// The contribution kind of the comment
    #[serde(default)]
    pub kind: CommentKind,
}
