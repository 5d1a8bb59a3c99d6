//! Tests for the provider traits, exercised through trait objects the way the
//! engine consumes them.

use crate::errors::Error;
use crate::models::{Comment, CommentKind, ContributionView, Issue, IssueState, User, UserKind};
use crate::wallets::InMemoryWalletRegistry;
use crate::{IssueProvider, WalletRegistry};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MockIssueProvider {
    posted: Mutex<Vec<String>>,
}

fn user(id: u64, login: &str) -> User {
    User {
        id,
        login: login.to_string(),
        kind: UserKind::User,
    }
}

#[async_trait]
impl IssueProvider for MockIssueProvider {
    async fn get_issue(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        issue_number: u64,
    ) -> Result<Issue, Error> {
        if issue_number == 404 {
            return Err(Error::InvalidResponse);
        }

        Ok(Issue {
            id: 1000 + issue_number,
            number: issue_number,
            title: "Test issue".to_string(),
            author: user(1, "alice"),
            body: Some("Specification".to_string()),
            assignee: None,
            labels: Vec::new(),
            state: IssueState::Closed,
            html_url: String::new(),
        })
    }

    async fn list_comments(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        issue_number: u64,
    ) -> Result<Vec<Comment>, Error> {
        Ok(vec![Comment {
            id: 1,
            issue_number,
            author: user(2, "bob"),
            body: "On it".to_string(),
            created_at: "2024-03-01T10:00:00Z".parse().unwrap(),
            html_url: String::new(),
            view: ContributionView::Issue,
            kind: CommentKind::Comment,
        }])
    }

    async fn list_reviews(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pull_request_number: u64,
    ) -> Result<Vec<Comment>, Error> {
        Ok(Vec::new())
    }

    async fn list_collaborator_ids(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
    ) -> Result<Vec<u64>, Error> {
        Err(Error::RateLimitExceeded)
    }

    async fn add_comment(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _issue_number: u64,
        comment: &str,
    ) -> Result<(), Error> {
        self.posted.lock().unwrap().push(comment.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_provider_usable_as_trait_object() {
    let provider: Box<dyn IssueProvider> = Box::new(MockIssueProvider::default());

    let issue = provider.get_issue("owner", "repo", 12).await.unwrap();
    let comments = provider.list_comments("owner", "repo", 12).await.unwrap();

    assert_eq!(issue.id, 1012);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].issue_number, 12);
}

#[tokio::test]
async fn test_provider_errors_propagate() {
    let provider = MockIssueProvider::default();

    let result = provider.get_issue("owner", "repo", 404).await;
    assert!(matches!(result, Err(Error::InvalidResponse)));

    let collaborators = provider.list_collaborator_ids("owner", "repo").await;
    assert!(matches!(collaborators, Err(Error::RateLimitExceeded)));
}

#[tokio::test]
async fn test_add_comment_records_body() {
    let provider = MockIssueProvider::default();

    provider
        .add_comment("owner", "repo", 12, "Rewards summary")
        .await
        .unwrap();

    let posted = provider.posted.lock().unwrap();
    assert_eq!(posted.as_slice(), ["Rewards summary".to_string()]);
}

#[tokio::test]
async fn test_wallet_registry_as_trait_object() {
    let mut registry = InMemoryWalletRegistry::default();
    registry.register(2, "0x0000000000000000000000000000000000000002");
    let registry: Box<dyn WalletRegistry> = Box::new(registry);

    assert!(registry.get_wallet_address(2).await.unwrap().is_some());
    assert!(registry.get_wallet_address(3).await.unwrap().is_none());
}
