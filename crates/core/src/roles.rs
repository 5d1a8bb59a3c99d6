//! # Role Classification
//!
//! Partitions the human authors of an issue conversation into the Issuer,
//! Assignee, Collaborator and Default roles. A user holds exactly one role;
//! when several rules match, the Assignee rule wins over Issuer, which wins
//! over Collaborator.

use std::collections::{BTreeSet, HashSet};

use bounty_warden_developer_platforms::models::{Comment, Issue, User};
use bounty_warden_developer_platforms::IssueProvider;
use tracing::{debug, instrument, warn};

use crate::style::{ContributionStyle, Role};

#[cfg(test)]
#[path = "roles_tests.rs"]
mod tests;

/// The users eligible for a contribution style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleUsers {
    /// Issuer and Assignee styles belong to at most one user
    Single(User),
    /// Collaborator and Default styles may hold many users
    Many(Vec<User>),
    /// The style has no eligible user in this conversation
    None,
}

impl StyleUsers {
    pub fn ids(&self) -> Vec<u64> {
        match self {
            StyleUsers::Single(user) => vec![user.id],
            StyleUsers::Many(users) => users.iter().map(|u| u.id).collect(),
            StyleUsers::None => Vec::new(),
        }
    }
}

/// The role of every human participant in one issue conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleClassification {
    issuer: User,
    assignee: Option<User>,
    collaborators: Vec<User>,
    contributors: Vec<User>,
}

impl RoleClassification {
    /// Classifies the authors of `comments` relative to `issue`.
    ///
    /// `collaborator_ids` holds the repository users with write access.
    /// Bot and organization authors are ignored.
    pub fn classify(issue: &Issue, comments: &[Comment], collaborator_ids: &[u64]) -> Self {
        let collaborator_ids: HashSet<u64> = collaborator_ids.iter().copied().collect();
        let assignee = issue.assignee.clone().filter(User::is_human);
        let assignee_id = assignee.as_ref().map(|a| a.id);

        let mut seen = BTreeSet::new();
        let mut collaborators = Vec::new();
        let mut contributors = Vec::new();

        for comment in comments {
            let author = &comment.author;
            if !author.is_human() || !seen.insert(author.id) {
                continue;
            }
            if author.id == issue.author.id || Some(author.id) == assignee_id {
                continue;
            }

            if collaborator_ids.contains(&author.id) {
                collaborators.push(author.clone());
            } else {
                contributors.push(author.clone());
            }
        }

        debug!(
            issue = issue.number,
            collaborators = collaborators.len(),
            contributors = contributors.len(),
            has_assignee = assignee.is_some(),
            "Classified conversation participants"
        );

        Self {
            issuer: issue.author.clone(),
            assignee,
            collaborators,
            contributors,
        }
    }

    /// Classifies the conversation, looking collaborators up through the
    /// provider. A failed lookup is logged and treated as "no collaborators".
    #[instrument(skip(provider, issue, comments), fields(issue = issue.number))]
    pub async fn classify_with_provider<P: IssueProvider + ?Sized>(
        provider: &P,
        repo_owner: &str,
        repo_name: &str,
        issue: &Issue,
        comments: &[Comment],
    ) -> Self {
        let collaborator_ids = match provider.list_collaborator_ids(repo_owner, repo_name).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    error = %e,
                    "Failed to list collaborators. Treating every other participant as a default contributor"
                );
                Vec::new()
            }
        };

        Self::classify(issue, comments, &collaborator_ids)
    }

    pub fn issuer(&self) -> &User {
        &self.issuer
    }

    pub fn assignee(&self) -> Option<&User> {
        self.assignee.as_ref()
    }

    pub fn collaborators(&self) -> &[User] {
        &self.collaborators
    }

    pub fn contributors(&self) -> &[User] {
        &self.contributors
    }

    /// The role held by `user_id`, or `None` for users that did not take part.
    pub fn role_of(&self, user_id: u64) -> Option<Role> {
        if self.assignee.as_ref().is_some_and(|a| a.id == user_id) {
            Some(Role::Assignee)
        } else if self.issuer.id == user_id {
            Some(Role::Issuer)
        } else if self.collaborators.iter().any(|u| u.id == user_id) {
            Some(Role::Collaborator)
        } else if self.contributors.iter().any(|u| u.id == user_id) {
            Some(Role::Default)
        } else {
            None
        }
    }

    /// The users whose contributions are scored under `style`.
    pub fn users_for(&self, style: ContributionStyle) -> StyleUsers {
        if style.is_specification() {
            return StyleUsers::Single(self.issuer.clone());
        }

        match style.role() {
            Role::Issuer => {
                if self.role_of(self.issuer.id) == Some(Role::Issuer) {
                    StyleUsers::Single(self.issuer.clone())
                } else {
                    StyleUsers::None
                }
            }
            Role::Assignee => match &self.assignee {
                Some(assignee) => StyleUsers::Single(assignee.clone()),
                None => StyleUsers::None,
            },
            Role::Collaborator => many_or_none(&self.collaborators),
            Role::Default => many_or_none(&self.contributors),
        }
    }
}

fn many_or_none(users: &[User]) -> StyleUsers {
    if users.is_empty() {
        StyleUsers::None
    } else {
        StyleUsers::Many(users.to_vec())
    }
}
