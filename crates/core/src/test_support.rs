//! Builders shared by the unit tests of this crate.

use bounty_warden_developer_platforms::models::{
    Comment, CommentKind, ContributionView, Issue, IssueState, User, UserKind,
};

pub fn human(id: u64, login: &str) -> User {
    User {
        id,
        login: login.to_string(),
        kind: UserKind::User,
    }
}

pub fn bot(id: u64, login: &str) -> User {
    User {
        id,
        login: login.to_string(),
        kind: UserKind::Bot,
    }
}

pub fn issue(author: User, assignee: Option<User>, body: &str) -> Issue {
    Issue {
        id: 9000,
        number: 7,
        title: "Improve the parser".to_string(),
        author,
        body: if body.is_empty() {
            None
        } else {
            Some(body.to_string())
        },
        assignee,
        labels: Vec::new(),
        state: IssueState::Closed,
        html_url: "https://github.com/owner/repo/issues/7".to_string(),
    }
}

pub fn comment(id: u64, author: &User, body: &str) -> Comment {
    Comment {
        id,
        issue_number: 7,
        author: author.clone(),
        body: body.to_string(),
        created_at: "2024-03-01T10:00:00Z".parse().expect("valid timestamp"),
        html_url: format!("https://github.com/owner/repo/issues/7#issuecomment-{}", id),
        view: ContributionView::Issue,
        kind: CommentKind::Comment,
    }
}

pub fn review(id: u64, author: &User, body: &str, kind: CommentKind) -> Comment {
    Comment {
        view: ContributionView::Review,
        kind,
        html_url: format!("https://github.com/owner/repo/pull/8#discussion_r{}", id),
        ..comment(id, author, body)
    }
}

/// `count` distinct plain words.
pub fn words(count: usize) -> String {
    (0..count)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}
