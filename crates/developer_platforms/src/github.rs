use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    errors::Error,
    models::{Comment, CommentKind, ContributionView, Issue, IssueState, Label, User, UserKind},
    IssueProvider,
};

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;

/// Number of items requested per page from the GitHub REST API.
const PAGE_SIZE: u8 = 100;

/// Creates an `Octocrab` client authenticated with a personal access token.
#[instrument(skip(token))]
pub fn create_token_client(token: &str) -> Result<Octocrab, Error> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| Error::AuthError(format!("Failed to build the GitHub client: {}", e)))
}

fn log_octocrab_error(message: &str, e: octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, backtrace } => {
            let err = *source;
            error!(
                error_message = err.message,
                backtrace = backtrace.to_string(),
                "{}. Received an error from GitHub",
                message
            )
        }
        octocrab::Error::UriParse { source, .. } => error!(
            error_message = source.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        _ => error!(error_message = e.to_string(), message),
    };
}

/// Chooses the provider error that best describes an octocrab failure.
fn classify_octocrab_error(e: &octocrab::Error) -> Error {
    match e {
        octocrab::Error::GitHub { source, .. } => match source.status_code.as_u16() {
            401 => Error::AuthError(source.message.clone()),
            429 => Error::RateLimitExceeded,
            403 if source.message.to_lowercase().contains("rate limit") => {
                Error::RateLimitExceeded
            }
            403 => Error::AuthError(source.message.clone()),
            404 | 410 | 422 => Error::InvalidResponse,
            _ => Error::ApiError(),
        },
        _ => Error::ApiError(),
    }
}

/// Logs an octocrab failure and converts it into a provider error.
fn map_octocrab_error(message: &str, e: octocrab::Error) -> Error {
    let mapped = classify_octocrab_error(&e);
    log_octocrab_error(message, e);
    mapped
}

#[derive(Debug, Serialize)]
struct PageParameters {
    per_page: u8,
    page: u32,
}

/// An account as it appears in the raw REST payloads.
#[derive(Debug, Deserialize)]
struct RawAccount {
    id: u64,
    login: String,
    #[serde(rename = "type", default)]
    account_type: String,
}

impl From<RawAccount> for User {
    fn from(account: RawAccount) -> Self {
        User {
            id: account.id,
            login: account.login,
            kind: UserKind::from_github_type(&account.account_type),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawIssueComment {
    id: u64,
    user: Option<RawAccount>,
    body: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    id: u64,
    user: Option<RawAccount>,
    body: Option<String>,
    state: String,
    submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawReviewComment {
    id: u64,
    user: Option<RawAccount>,
    body: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawPermissions {
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    maintain: bool,
    #[serde(default)]
    push: bool,
}

#[derive(Debug, Deserialize)]
struct RawCollaborator {
    id: u64,
    #[serde(default)]
    permissions: RawPermissions,
}

impl RawCollaborator {
    fn has_write_access(&self) -> bool {
        self.permissions.admin || self.permissions.maintain || self.permissions.push
    }
}

/// Converts a submitted pull request review into a review-thread comment.
///
/// Pending and dismissed reviews, and reviews without an author or
/// submission time, are not contributions and yield `None`.
fn map_review(review: RawReview, pull_request_number: u64) -> Option<Comment> {
    let kind = match review.state.as_str() {
        "APPROVED" => CommentKind::Approval,
        "CHANGES_REQUESTED" => CommentKind::Rejection,
        "COMMENTED" => CommentKind::Comment,
        _ => return None,
    };

    Some(Comment {
        id: review.id,
        issue_number: pull_request_number,
        author: review.user?.into(),
        body: review.body.unwrap_or_default(),
        created_at: review.submitted_at?,
        html_url: review.html_url,
        view: ContributionView::Review,
        kind,
    })
}

/// Line comments left during a review are scored like any other review
/// comment, whoever wrote them.
fn map_review_comment(comment: RawReviewComment, pull_request_number: u64) -> Option<Comment> {
    Some(Comment {
        id: comment.id,
        issue_number: pull_request_number,
        author: comment.user?.into(),
        body: comment.body,
        created_at: comment.created_at,
        html_url: comment.html_url,
        view: ContributionView::Review,
        kind: CommentKind::Comment,
    })
}

/// Comments whose author account was deleted yield `None`.
fn map_issue_comment(comment: RawIssueComment, issue_number: u64) -> Option<Comment> {
    Some(Comment {
        id: comment.id,
        issue_number,
        author: comment.user?.into(),
        body: comment.body.unwrap_or_default(),
        created_at: comment.created_at,
        html_url: comment.html_url,
        view: ContributionView::Issue,
        kind: CommentKind::Comment,
    })
}

fn map_author(author: octocrab::models::Author) -> User {
    User {
        id: author.id.into_inner(),
        kind: UserKind::from_github_type(&author.r#type),
        login: author.login,
    }
}

#[derive(Debug)]
pub struct GitHubProvider {
    client: Octocrab,
}

impl GitHubProvider {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Fetches every page of a REST collection endpoint.
    async fn get_all_pages<T>(&self, route: &str) -> Result<Vec<T>, octocrab::Error>
    where
        T: DeserializeOwned + Send,
    {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let parameters = PageParameters {
                per_page: PAGE_SIZE,
                page,
            };
            let batch: Vec<T> = self.client.get(route, Some(&parameters)).await?;
            let count = batch.len();
            items.extend(batch);

            if count < PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl IssueProvider for GitHubProvider {
    #[instrument]
    async fn get_issue(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
    ) -> Result<Issue, Error> {
        let issue = match self
            .client
            .issues(repo_owner, repo_name)
            .get(issue_number)
            .await
        {
            Ok(i) => i,
            Err(e) => return Err(map_octocrab_error("Failed to get issue information", e)),
        };

        let state = match issue.state {
            octocrab::models::IssueState::Closed => IssueState::Closed,
            _ => IssueState::Open,
        };

        Ok(Issue {
            id: issue.id.into_inner(),
            number: issue.number,
            title: issue.title,
            author: map_author(issue.user),
            body: issue.body,
            assignee: issue.assignee.map(map_author),
            labels: issue
                .labels
                .into_iter()
                .map(|l| Label { name: l.name })
                .collect(),
            state,
            html_url: issue.html_url.to_string(),
        })
    }

    #[instrument]
    async fn list_comments(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
    ) -> Result<Vec<Comment>, Error> {
        let route = format!(
            "/repos/{}/{}/issues/{}/comments",
            repo_owner, repo_name, issue_number
        );
        let comments: Vec<RawIssueComment> = self
            .get_all_pages(&route)
            .await
            .map_err(|e| map_octocrab_error("Failed to list comments for issue", e))?;

        let mut result: Vec<Comment> = comments
            .into_iter()
            .filter_map(|c| map_issue_comment(c, issue_number))
            .collect();
        result.sort_by_key(|c| c.created_at);

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            issue = issue_number,
            count = result.len(),
            "Listed issue comments",
        );

        Ok(result)
    }

    #[instrument]
    async fn list_reviews(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pull_request_number: u64,
    ) -> Result<Vec<Comment>, Error> {
        let reviews_route = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            repo_owner, repo_name, pull_request_number
        );
        let reviews: Vec<RawReview> = match self.get_all_pages(&reviews_route).await {
            Ok(r) => r,
            Err(e) => {
                return Err(map_octocrab_error(
                    "Failed to list reviews for pull request",
                    e,
                ))
            }
        };

        let comments_route = format!(
            "/repos/{}/{}/pulls/{}/comments",
            repo_owner, repo_name, pull_request_number
        );
        let review_comments: Vec<RawReviewComment> =
            match self.get_all_pages(&comments_route).await {
                Ok(c) => c,
                Err(e) => {
                    return Err(map_octocrab_error(
                        "Failed to list review comments for pull request",
                        e,
                    ))
                }
            };

        let mut result: Vec<Comment> = reviews
            .into_iter()
            .filter_map(|r| map_review(r, pull_request_number))
            .chain(
                review_comments
                    .into_iter()
                    .filter_map(|c| map_review_comment(c, pull_request_number)),
            )
            .collect();
        result.sort_by_key(|c| c.created_at);

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            pull_request = pull_request_number,
            count = result.len(),
            "Listed pull request reviews",
        );

        Ok(result)
    }

    #[instrument]
    async fn list_collaborator_ids(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Vec<u64>, Error> {
        let route = format!("/repos/{}/{}/collaborators", repo_owner, repo_name);
        let collaborators: Vec<RawCollaborator> = match self.get_all_pages(&route).await {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    "Failed to list repository collaborators"
                );
                return Err(map_octocrab_error(
                    "Failed to list repository collaborators",
                    e,
                ));
            }
        };

        Ok(collaborators
            .into_iter()
            .filter(RawCollaborator::has_write_access)
            .map(|c| c.id)
            .collect())
    }

    #[instrument(skip(comment))]
    async fn add_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
        comment: &str,
    ) -> Result<(), Error> {
        match self
            .client
            .issues(repo_owner, repo_name)
            .create_comment(issue_number, comment)
            .await
        {
            Ok(_) => {
                info!(
                    repository_owner = repo_owner,
                    repository = repo_name,
                    issue = issue_number,
                    "Posted comment on issue"
                );
                Ok(())
            }
            Err(e) => {
                let cause = map_octocrab_error("Failed to add issue comment", e);
                Err(Error::FailedToUpdateIssue(format!(
                    "Failed to add comment: {}",
                    cause
                )))
            }
        }
    }
}
