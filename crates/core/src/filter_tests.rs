use super::*;
use crate::test_support::{bot, comment, human, issue, review};

#[test]
fn test_every_style_has_an_entry() {
    let alice = human(1, "alice");
    let issue = issue(alice, None, "");
    let classification = RoleClassification::classify(&issue, &[], &[]);

    let buckets = filter_comments(&issue, &[], &classification);

    assert_eq!(buckets.len(), ContributionStyle::ALL.len());
    assert!(buckets.values().all(Vec::is_empty));
}

#[test]
fn test_specification_comes_from_issue_body() {
    let alice = human(1, "alice");
    let issue = issue(alice.clone(), None, "Please make the parser faster");
    let classification = RoleClassification::classify(&issue, &[], &[]);

    let buckets = filter_comments(&issue, &[], &classification);
    let spec = &buckets[&ContributionStyle::IssueIssuerSpecification];

    assert_eq!(spec.len(), 1);
    assert_eq!(spec[0].id, issue.id);
    assert_eq!(spec[0].author, alice);
    assert_eq!(spec[0].body, "Please make the parser faster");
    assert!(buckets[&ContributionStyle::IssueIssuerComment].is_empty());
}

#[test]
fn test_comments_land_in_matching_styles() {
    let alice = human(1, "alice");
    let bob = human(2, "bob");
    let carol = human(3, "carol");
    let dave = human(4, "dave");

    let issue = issue(alice.clone(), Some(bob.clone()), "spec");
    let comments = vec![
        comment(10, &alice, "thanks"),
        comment(11, &bob, "working on it"),
        review(12, &carol, "lgtm", CommentKind::Approval),
        review(13, &bob, "fixed typo here", CommentKind::Code),
        comment(14, &dave, "me too"),
        review(15, &alice, "needs tests", CommentKind::Rejection),
    ];
    let classification = RoleClassification::classify(&issue, &comments, &[3]);

    let buckets = filter_comments(&issue, &comments, &classification);
    let ids = |style: ContributionStyle| -> Vec<u64> {
        buckets[&style].iter().map(|c| c.id).collect()
    };

    assert_eq!(ids(ContributionStyle::IssueIssuerComment), vec![10]);
    assert_eq!(ids(ContributionStyle::IssueAssigneeComment), vec![11]);
    assert_eq!(ids(ContributionStyle::ReviewCollaboratorApproval), vec![12]);
    assert_eq!(ids(ContributionStyle::ReviewAssigneeCode), vec![13]);
    assert_eq!(ids(ContributionStyle::IssueDefaultComment), vec![14]);
    assert_eq!(ids(ContributionStyle::ReviewIssuerRejection), vec![15]);

    let total: usize = buckets.values().map(Vec::len).sum();
    assert_eq!(total, comments.len() + 1);
}

#[test]
fn test_invalid_combinations_are_dropped() {
    let alice = human(1, "alice");
    let dave = human(4, "dave");
    let issue = issue(alice, None, "");
    let comments = vec![review(20, &dave, "approved", CommentKind::Approval)];
    let classification = RoleClassification::classify(&issue, &comments, &[]);

    let buckets = filter_comments(&issue, &comments, &classification);

    assert!(buckets.values().all(Vec::is_empty));
}

#[test]
fn test_disqualified_comments_are_skipped() {
    let alice = human(1, "alice");
    let robot = bot(50, "ubiquity-os[bot]");
    let issue = issue(alice.clone(), None, "");
    let comments = vec![
        comment(30, &robot, "Here is your reward"),
        comment(31, &alice, "   \n  "),
        comment(32, &alice, "/start"),
        comment(33, &alice, &format!("{}\n<table></table>", REWARD_COMMENT_MARKER)),
        comment(34, &alice, "/start\nI will also explain my plan"),
    ];
    let classification = RoleClassification::classify(&issue, &comments, &[]);

    let buckets = filter_comments(&issue, &comments, &classification);
    let kept: Vec<u64> = buckets.values().flatten().map(|c| c.id).collect();

    assert_eq!(kept, vec![34]);
}

#[test]
fn test_disqualification_reasons() {
    let alice = human(1, "alice");
    let robot = bot(50, "bot");

    assert_eq!(
        disqualification(&comment(1, &robot, "hi")),
        Some(Disqualification::NotHuman)
    );
    assert_eq!(
        disqualification(&comment(1, &alice, "")),
        Some(Disqualification::BlankBody)
    );
    assert_eq!(
        disqualification(&comment(1, &alice, "  /wallet 0xabc  ")),
        Some(Disqualification::SlashCommand)
    );
    assert_eq!(
        disqualification(&comment(1, &alice, REWARD_COMMENT_MARKER)),
        Some(Disqualification::RewardSummary)
    );
    assert_eq!(disqualification(&comment(1, &alice, "real work")), None);
}

#[test]
fn test_bot_issuer_has_no_specification() {
    let robot = bot(50, "bot");
    let issue = issue(robot, None, "Generated issue body");

    assert!(specification_comment(&issue).is_none());
}
