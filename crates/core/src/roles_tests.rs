use super::*;
use crate::test_support::{bot, comment, human, issue};
use async_trait::async_trait;
use bounty_warden_developer_platforms::errors::Error;

#[test]
fn test_classify_assigns_each_user_one_role() {
    let alice = human(1, "alice");
    let bob = human(2, "bob");
    let carol = human(3, "carol");
    let dave = human(4, "dave");

    let issue = issue(alice.clone(), Some(bob.clone()), "spec");
    let comments = vec![
        comment(10, &alice, "hello"),
        comment(11, &bob, "on it"),
        comment(12, &carol, "looks good"),
        comment(13, &dave, "+1"),
        comment(14, &carol, "again"),
    ];

    let classification = RoleClassification::classify(&issue, &comments, &[3, 99]);

    assert_eq!(classification.role_of(1), Some(Role::Issuer));
    assert_eq!(classification.role_of(2), Some(Role::Assignee));
    assert_eq!(classification.role_of(3), Some(Role::Collaborator));
    assert_eq!(classification.role_of(4), Some(Role::Default));
    assert_eq!(classification.role_of(99), None);
    assert_eq!(classification.collaborators(), &[carol]);
    assert_eq!(classification.contributors(), &[dave]);
    assert_eq!(classification.role_of(5), None);
}

#[test]
fn test_issuer_who_is_collaborator_stays_issuer() {
    let alice = human(1, "alice");
    let issue = issue(alice.clone(), None, "spec");
    let comments = vec![comment(10, &alice, "hello")];

    let classification = RoleClassification::classify(&issue, &comments, &[1]);

    assert_eq!(classification.role_of(1), Some(Role::Issuer));
    assert!(classification.collaborators().is_empty());
}

#[test]
fn test_self_assigned_issuer_is_assignee() {
    let alice = human(1, "alice");
    let issue = issue(alice.clone(), Some(alice.clone()), "spec");
    let comments = vec![comment(10, &alice, "hello")];

    let classification = RoleClassification::classify(&issue, &comments, &[]);

    assert_eq!(classification.role_of(1), Some(Role::Assignee));
    assert_eq!(
        classification.users_for(ContributionStyle::IssueIssuerComment),
        StyleUsers::None
    );
    assert_eq!(
        classification.users_for(ContributionStyle::IssueAssigneeComment),
        StyleUsers::Single(alice.clone())
    );
    assert_eq!(
        classification.users_for(ContributionStyle::IssueIssuerSpecification),
        StyleUsers::Single(alice)
    );
}

#[test]
fn test_bots_are_never_classified() {
    let alice = human(1, "alice");
    let robot = bot(50, "ubiquity-os[bot]");
    let issue = issue(alice.clone(), Some(robot.clone()), "spec");
    let comments = vec![comment(10, &robot, "Assigned!")];

    let classification = RoleClassification::classify(&issue, &comments, &[50]);

    assert_eq!(classification.role_of(50), None);
    assert!(classification.assignee().is_none());
    assert!(classification.collaborators().is_empty());
    assert!(classification.contributors().is_empty());
}

#[test]
fn test_users_for_styles() {
    let alice = human(1, "alice");
    let carol = human(3, "carol");
    let dave = human(4, "dave");
    let erin = human(5, "erin");

    let issue = issue(alice.clone(), None, "spec");
    let comments = vec![
        comment(12, &carol, "a"),
        comment(13, &dave, "b"),
        comment(14, &erin, "c"),
    ];

    let classification = RoleClassification::classify(&issue, &comments, &[3]);

    assert_eq!(
        classification.users_for(ContributionStyle::ReviewIssuerApproval),
        StyleUsers::Single(alice)
    );
    assert_eq!(
        classification.users_for(ContributionStyle::ReviewAssigneeCode),
        StyleUsers::None
    );
    assert_eq!(
        classification
            .users_for(ContributionStyle::IssueCollaboratorComment)
            .ids(),
        vec![3]
    );
    assert_eq!(
        classification
            .users_for(ContributionStyle::ReviewDefaultComment)
            .ids(),
        vec![4, 5]
    );
}

struct FailingCollaborators;

#[async_trait]
impl IssueProvider for FailingCollaborators {
    async fn get_issue(&self, _: &str, _: &str, _: u64) -> Result<Issue, Error> {
        Err(Error::InvalidResponse)
    }

    async fn list_comments(&self, _: &str, _: &str, _: u64) -> Result<Vec<Comment>, Error> {
        Ok(Vec::new())
    }

    async fn list_reviews(&self, _: &str, _: &str, _: u64) -> Result<Vec<Comment>, Error> {
        Ok(Vec::new())
    }

    async fn list_collaborator_ids(&self, _: &str, _: &str) -> Result<Vec<u64>, Error> {
        Err(Error::RateLimitExceeded)
    }

    async fn add_comment(&self, _: &str, _: &str, _: u64, _: &str) -> Result<(), Error> {
        Ok(())
    }
}

#[tokio::test]
async fn test_classify_with_provider_falls_back_to_default() {
    let alice = human(1, "alice");
    let carol = human(3, "carol");
    let issue = issue(alice, None, "spec");
    let comments = vec![comment(12, &carol, "I maintain this repo")];

    let classification = RoleClassification::classify_with_provider(
        &FailingCollaborators,
        "owner",
        "repo",
        &issue,
        &comments,
    )
    .await;

    assert_eq!(classification.role_of(3), Some(Role::Default));
}
