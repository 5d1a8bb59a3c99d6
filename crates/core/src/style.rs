//! # Contribution Styles
//!
//! A contribution style names one independently configured scoring context:
//! the thread a contribution was made in, the role of its author relative to
//! the issue, and the kind of contribution. Only a fixed set of combinations
//! is meaningful; every other combination has no `ContributionStyle` value
//! and therefore can never be scored.

use std::fmt;
use std::str::FromStr;

use bounty_warden_developer_platforms::models::{CommentKind, ContributionView};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ConfigLoadError;

#[cfg(test)]
#[path = "style_tests.rs"]
mod tests;

/// The relationship between a comment author and an issue.
///
/// Roles are computed for every scoring run and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The user who opened the issue
    Issuer,
    /// The user the issue is assigned to
    Assignee,
    /// A user with write access to the repository
    Collaborator,
    /// Anyone else who took part in the conversation
    Default,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Issuer => "Issuer",
            Role::Assignee => "Assignee",
            Role::Collaborator => "Collaborator",
            Role::Default => "Default",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of contribution being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContributionKind {
    Comment,
    /// The issue body written by the issuer
    Specification,
    Approval,
    Rejection,
    Code,
}

impl ContributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionKind::Comment => "Comment",
            ContributionKind::Specification => "Specification",
            ContributionKind::Approval => "Approval",
            ContributionKind::Rejection => "Rejection",
            ContributionKind::Code => "Code",
        }
    }
}

impl From<CommentKind> for ContributionKind {
    fn from(kind: CommentKind) -> Self {
        match kind {
            CommentKind::Comment => ContributionKind::Comment,
            CommentKind::Approval => ContributionKind::Approval,
            CommentKind::Rejection => ContributionKind::Rejection,
            CommentKind::Code => ContributionKind::Code,
        }
    }
}

/// A valid (view, role, contribution kind) combination.
///
/// # Examples
///
/// ```
/// use bounty_warden_core::style::{ContributionKind, ContributionStyle, Role};
/// use bounty_warden_developer_platforms::models::ContributionView;
///
/// let style = ContributionStyle::from_parts(
///     ContributionView::Review,
///     Role::Collaborator,
///     ContributionKind::Approval,
/// );
/// assert_eq!(style, Some(ContributionStyle::ReviewCollaboratorApproval));
/// assert_eq!(style.unwrap().to_string(), "Review Collaborator Approval");
///
/// // Only issuers write specifications.
/// assert!(ContributionStyle::from_parts(
///     ContributionView::Issue,
///     Role::Default,
///     ContributionKind::Specification,
/// )
/// .is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContributionStyle {
    IssueIssuerSpecification,
    IssueIssuerComment,
    IssueAssigneeComment,
    IssueCollaboratorComment,
    IssueDefaultComment,
    ReviewIssuerComment,
    ReviewIssuerApproval,
    ReviewIssuerRejection,
    ReviewAssigneeComment,
    ReviewAssigneeCode,
    ReviewCollaboratorComment,
    ReviewCollaboratorApproval,
    ReviewCollaboratorRejection,
    ReviewDefaultComment,
}

impl ContributionStyle {
    /// Every contribution style, in scoring order.
    pub const ALL: [ContributionStyle; 14] = [
        ContributionStyle::IssueIssuerSpecification,
        ContributionStyle::IssueIssuerComment,
        ContributionStyle::IssueAssigneeComment,
        ContributionStyle::IssueCollaboratorComment,
        ContributionStyle::IssueDefaultComment,
        ContributionStyle::ReviewIssuerComment,
        ContributionStyle::ReviewIssuerApproval,
        ContributionStyle::ReviewIssuerRejection,
        ContributionStyle::ReviewAssigneeComment,
        ContributionStyle::ReviewAssigneeCode,
        ContributionStyle::ReviewCollaboratorComment,
        ContributionStyle::ReviewCollaboratorApproval,
        ContributionStyle::ReviewCollaboratorRejection,
        ContributionStyle::ReviewDefaultComment,
    ];

    /// Looks up the style for a combination, or `None` if the combination is
    /// not scored.
    pub fn from_parts(view: ContributionView, role: Role, kind: ContributionKind) -> Option<Self> {
        use ContributionKind as K;
        use ContributionView as V;

        let style = match (view, role, kind) {
            (V::Issue, Role::Issuer, K::Specification) => Self::IssueIssuerSpecification,
            (V::Issue, Role::Issuer, K::Comment) => Self::IssueIssuerComment,
            (V::Issue, Role::Assignee, K::Comment) => Self::IssueAssigneeComment,
            (V::Issue, Role::Collaborator, K::Comment) => Self::IssueCollaboratorComment,
            (V::Issue, Role::Default, K::Comment) => Self::IssueDefaultComment,
            (V::Review, Role::Issuer, K::Comment) => Self::ReviewIssuerComment,
            (V::Review, Role::Issuer, K::Approval) => Self::ReviewIssuerApproval,
            (V::Review, Role::Issuer, K::Rejection) => Self::ReviewIssuerRejection,
            (V::Review, Role::Assignee, K::Comment) => Self::ReviewAssigneeComment,
            (V::Review, Role::Assignee, K::Code) => Self::ReviewAssigneeCode,
            (V::Review, Role::Collaborator, K::Comment) => Self::ReviewCollaboratorComment,
            (V::Review, Role::Collaborator, K::Approval) => Self::ReviewCollaboratorApproval,
            (V::Review, Role::Collaborator, K::Rejection) => Self::ReviewCollaboratorRejection,
            (V::Review, Role::Default, K::Comment) => Self::ReviewDefaultComment,
            _ => return None,
        };

        Some(style)
    }

    pub fn view(&self) -> ContributionView {
        match self {
            Self::IssueIssuerSpecification
            | Self::IssueIssuerComment
            | Self::IssueAssigneeComment
            | Self::IssueCollaboratorComment
            | Self::IssueDefaultComment => ContributionView::Issue,
            Self::ReviewIssuerComment
            | Self::ReviewIssuerApproval
            | Self::ReviewIssuerRejection
            | Self::ReviewAssigneeComment
            | Self::ReviewAssigneeCode
            | Self::ReviewCollaboratorComment
            | Self::ReviewCollaboratorApproval
            | Self::ReviewCollaboratorRejection
            | Self::ReviewDefaultComment => ContributionView::Review,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::IssueIssuerSpecification
            | Self::IssueIssuerComment
            | Self::ReviewIssuerComment
            | Self::ReviewIssuerApproval
            | Self::ReviewIssuerRejection => Role::Issuer,
            Self::IssueAssigneeComment | Self::ReviewAssigneeComment | Self::ReviewAssigneeCode => {
                Role::Assignee
            }
            Self::IssueCollaboratorComment
            | Self::ReviewCollaboratorComment
            | Self::ReviewCollaboratorApproval
            | Self::ReviewCollaboratorRejection => Role::Collaborator,
            Self::IssueDefaultComment | Self::ReviewDefaultComment => Role::Default,
        }
    }

    pub fn kind(&self) -> ContributionKind {
        match self {
            Self::IssueIssuerSpecification => ContributionKind::Specification,
            Self::IssueIssuerComment
            | Self::IssueAssigneeComment
            | Self::IssueCollaboratorComment
            | Self::IssueDefaultComment
            | Self::ReviewIssuerComment
            | Self::ReviewAssigneeComment
            | Self::ReviewCollaboratorComment
            | Self::ReviewDefaultComment => ContributionKind::Comment,
            Self::ReviewIssuerApproval | Self::ReviewCollaboratorApproval => {
                ContributionKind::Approval
            }
            Self::ReviewIssuerRejection | Self::ReviewCollaboratorRejection => {
                ContributionKind::Rejection
            }
            Self::ReviewAssigneeCode => ContributionKind::Code,
        }
    }

    pub fn is_specification(&self) -> bool {
        self.kind() == ContributionKind::Specification
    }
}

impl fmt::Display for ContributionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.view().as_str(),
            self.role().as_str(),
            self.kind().as_str()
        )
    }
}

impl FromStr for ContributionStyle {
    type Err = ConfigLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        ContributionStyle::ALL
            .into_iter()
            .find(|style| style.to_string().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ConfigLoadError::UnknownContributionStyle(s.to_string()))
    }
}

impl Serialize for ContributionStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContributionStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
