use async_trait::async_trait;

pub mod errors;

pub mod github;

pub mod models;

pub mod wallets;

use errors::Error;
use models::{Comment, Issue};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Trait for reading issue conversations from a developer platform (e.g. GitHub).
///
/// A scoring run needs the complete conversation before it can classify
/// anyone, so implementations must return every page of results.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use bounty_warden_developer_platforms::{IssueProvider, errors::Error, models::{Comment, Issue}};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct GitHubProvider {
///     token: String,
/// }
///
/// #[async_trait]
/// impl IssueProvider for GitHubProvider {
///     async fn get_issue(
///         &self,
///         repo_owner: &str,
///         repo_name: &str,
///         issue_number: u64,
///     ) -> Result<Issue, Error> {
///         // Implementation to fetch the issue from the GitHub API
///         # unimplemented!()
///     }
///
///     // Implement other required methods...
///     # async fn list_comments(&self, _: &str, _: &str, _: u64) -> Result<Vec<Comment>, Error> { unimplemented!() }
///     # async fn list_reviews(&self, _: &str, _: &str, _: u64) -> Result<Vec<Comment>, Error> { unimplemented!() }
///     # async fn list_collaborator_ids(&self, _: &str, _: &str) -> Result<Vec<u64>, Error> { unimplemented!() }
///     # async fn add_comment(&self, _: &str, _: &str, _: u64, _: &str) -> Result<(), Error> { unimplemented!() }
/// }
/// ```
#[async_trait]
pub trait IssueProvider: Send + Sync {
    /// Retrieves an issue.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `issue_number` - The issue number
    async fn get_issue(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
    ) -> Result<Issue, Error>;

    /// Lists all comments in the issue's own thread, ordered by creation time.
    ///
    /// Returned comments carry `ContributionView::Issue`.
    async fn list_comments(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
    ) -> Result<Vec<Comment>, Error>;

    /// Lists the reviews and review comments of a pull request, ordered by
    /// creation time.
    ///
    /// Returned comments carry `ContributionView::Review`; approvals and
    /// change requests are reported as `CommentKind::Approval` and
    /// `CommentKind::Rejection`, review bodies and line comments as
    /// `CommentKind::Comment`.
    async fn list_reviews(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pull_request_number: u64,
    ) -> Result<Vec<Comment>, Error>;

    /// Lists the ids of users with write, maintain or admin permission on the
    /// repository.
    async fn list_collaborator_ids(
        &self,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<Vec<u64>, Error>;

    /// Adds a comment to an issue.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `issue_number` - The issue number
    /// * `comment` - The comment text to add
    async fn add_comment(
        &self,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
        comment: &str,
    ) -> Result<(), Error>;
}

/// Trait for resolving the on-chain address a user wants rewards paid to.
#[async_trait]
pub trait WalletRegistry: Send + Sync {
    /// Returns the registered wallet address of the user, `Ok(None)` if the
    /// user never registered one, or an error if the registry is unreachable.
    async fn get_wallet_address(&self, user_id: u64) -> Result<Option<String>, Error>;
}
