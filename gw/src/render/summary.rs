//! Per-event summary templates
//!
//! Each payload variant produces a one-line headline and optional body lines.
//! Layout (columns, wrapping, timestamp) happens in the parent module.

use crate::event::{Comment, Event, EventPayload};

use super::text::ellipsis;

/// Headline plus body, before layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub headline: String,
    pub body: Vec<String>,
}

impl Summary {
    fn line(headline: String) -> Self {
        Self {
            headline,
            body: Vec::new(),
        }
    }

    fn with_body(headline: String, body: Vec<String>) -> Self {
        Self { headline, body }
    }
}

fn plural(count: u64, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}

/// Blank line, truncated comment text, blank line, link
fn comment_body(comment: &Comment, body_lines: usize) -> Vec<String> {
    let text = comment.body.replace('\r', "");
    let mut body = vec![String::new()];
    body.extend(ellipsis(text.trim_end(), body_lines).lines().map(str::to_string));
    if !comment.html_url.is_empty() {
        body.push(String::new());
        body.push(comment.html_url.clone());
    }
    body
}

fn title_body(title: &str) -> Vec<String> {
    if title.is_empty() {
        Vec::new()
    } else {
        vec![String::new(), title.to_string()]
    }
}

/// Build the summary for one event
pub fn summarize(event: &Event, body_lines: usize) -> Summary {
    let actor = &event.actor.login;

    match &event.payload {
        EventPayload::Create(p) => match &p.git_ref {
            Some(git_ref) => Summary::line(format!("@{} created a new {}: {}", actor, p.ref_type, git_ref)),
            None => Summary::line(format!("@{} created a new {}", actor, p.ref_type)),
        },
        EventPayload::Delete(p) => Summary::line(format!("@{} deleted {} {}", actor, p.ref_type, p.git_ref)),
        EventPayload::Push(p) => {
            let headline = format!(
                "@{} pushed {} to {}",
                actor,
                plural(p.distinct_size, "commit", "commits"),
                p.branch()
            );
            let commits: Vec<String> = p
                .distinct_commits()
                .map(|c| format!("{} {}", c.short_sha(), c.message.lines().next().unwrap_or("")))
                .collect();
            if commits.is_empty() {
                Summary::line(headline)
            } else {
                let mut body = vec![String::new()];
                body.extend(commits);
                Summary::with_body(headline, body)
            }
        }
        EventPayload::IssueComment(p) => Summary::with_body(
            format!("@{} commented on issue #{}", actor, p.issue.number),
            comment_body(&p.comment, body_lines),
        ),
        EventPayload::Issues(p) => Summary::with_body(
            format!("@{} {} #{}", actor, p.action, p.issue.number),
            title_body(&p.issue.title),
        ),
        EventPayload::PullRequest(p) => Summary::with_body(
            format!(
                "@{} {} a pull request #{}",
                actor,
                p.display_action(),
                p.pull_request.number
            ),
            title_body(&p.pull_request.title),
        ),
        EventPayload::PullRequestReviewComment(p) => Summary::with_body(
            format!("@{} commented on pull request #{}", actor, p.pull_request.number),
            comment_body(&p.comment, body_lines),
        ),
        EventPayload::CommitComment(p) => Summary::with_body(
            format!("@{} commented on commit {}", actor, p.comment.commit_id),
            comment_body(&p.comment.comment, body_lines),
        ),
        EventPayload::Gollum(p) => Summary::line(format!(
            "@{} modified {}",
            actor,
            plural(p.pages.len() as u64, "wiki page", "wiki pages")
        )),
        EventPayload::Watch(_) => Summary::line(format!("@{} is now watching", actor)),
        EventPayload::Fork(p) => Summary::line(format!("@{} forked the repo at {}", actor, p.forkee.html_url)),
        EventPayload::Member(p) => Summary::line(format!(
            "@{} {} @{} as a collaborator",
            actor, p.action, p.member.login
        )),
        EventPayload::Public(_) => Summary::line(format!("@{} made the repository public", actor)),
        EventPayload::Release(p) => Summary::line(format!("@{} {} release {}", actor, p.action, p.release.tag_name)),
        EventPayload::Unknown { raw_type } => Summary::line(format!("Unhandled event [{}]", raw_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{
        Commit, CommitAuthor, CreatePayload, GollumPayload, IssueCommentPayload, IssueRef, PushPayload, UserRef,
        WikiPage, decode_envelope,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn event(payload: EventPayload) -> Event {
        Event {
            id: "1".to_string(),
            actor: UserRef {
                login: "octocat".to_string(),
            },
            raw_type: "X".to_string(),
            repo_name: "octo/hello".to_string(),
            org_name: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            payload,
        }
    }

    fn commit(sha: &str, message: &str, distinct: bool) -> Commit {
        Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            author: CommitAuthor::default(),
            url: String::new(),
            distinct,
        }
    }

    #[test]
    fn test_push_lists_only_distinct_commits() {
        let payload = PushPayload {
            git_ref: "refs/heads/feature".to_string(),
            head: "c".repeat(40),
            before: "0".repeat(40),
            size: 3,
            distinct_size: 2,
            commits: vec![
                commit(&"a".repeat(40), "first\n\nlong description", true),
                commit(&"b".repeat(40), "merged already", false),
                commit(&"c".repeat(40), "third", true),
            ],
        };
        let summary = summarize(&event(EventPayload::Push(payload)), 5);
        assert_eq!(summary.headline, "@octocat pushed 2 commits to feature");
        assert_eq!(summary.body, vec!["".to_string(), "aaaaaaaa first".to_string(), "cccccccc third".to_string()]);
    }

    #[test]
    fn test_push_single_commit_is_singular() {
        let payload = PushPayload {
            git_ref: "refs/heads/main".to_string(),
            head: String::new(),
            before: String::new(),
            size: 1,
            distinct_size: 1,
            commits: vec![commit("1234567890", "one", true)],
        };
        let summary = summarize(&event(EventPayload::Push(payload)), 5);
        assert_eq!(summary.headline, "@octocat pushed 1 commit to main");
    }

    #[test]
    fn test_comment_truncated_with_ellipsis() {
        let payload = IssueCommentPayload {
            action: "created".to_string(),
            issue: IssueRef {
                number: 12,
                title: String::new(),
                html_url: String::new(),
            },
            comment: Comment {
                id: 1,
                html_url: "https://example.com/c/1".to_string(),
                body: "l1\r\nl2\r\nl3\r\nl4".to_string(),
                user: None,
            },
        };
        let summary = summarize(&event(EventPayload::IssueComment(payload)), 2);
        assert_eq!(summary.headline, "@octocat commented on issue #12");
        assert_eq!(summary.body, vec!["", "l1", "l2", "...", "", "https://example.com/c/1"]);
    }

    #[test]
    fn test_create_without_ref() {
        let payload = CreatePayload {
            ref_type: "repository".to_string(),
            git_ref: None,
            master_branch: Some("main".to_string()),
            description: None,
        };
        let summary = summarize(&event(EventPayload::Create(payload)), 5);
        assert_eq!(summary.headline, "@octocat created a new repository");
    }

    #[test]
    fn test_gollum_pluralization() {
        let page = WikiPage {
            page_name: "Home".to_string(),
            title: "Home".to_string(),
            action: "edited".to_string(),
            sha: String::new(),
            html_url: String::new(),
        };
        let one = summarize(
            &event(EventPayload::Gollum(GollumPayload {
                pages: vec![page.clone()],
            })),
            5,
        );
        assert_eq!(one.headline, "@octocat modified 1 wiki page");
        let two = summarize(
            &event(EventPayload::Gollum(GollumPayload {
                pages: vec![page.clone(), page],
            })),
            5,
        );
        assert_eq!(two.headline, "@octocat modified 2 wiki pages");
    }

    #[test]
    fn test_unknown_has_no_body() {
        let summary = summarize(
            &event(EventPayload::Unknown {
                raw_type: "GistEvent".to_string(),
            }),
            5,
        );
        assert_eq!(summary.headline, "Unhandled event [GistEvent]");
        assert!(summary.body.is_empty());
    }

    fn decoded(raw_type: &str, payload: Value) -> Event {
        decode_envelope(json!({
            "id": "42",
            "type": raw_type,
            "actor": {"login": "a"},
            "repo": {"name": "octo/hello"},
            "created_at": "2024-03-01T12:00:00Z",
            "payload": payload,
        }))
        .unwrap()
    }

    #[test]
    fn test_templates_per_kind() {
        let comment = json!({"id": 1, "body": "Looks good", "html_url": "https://c/1"});
        let cases: Vec<(&str, Value, &str, Vec<&str>)> = vec![
            (
                "DeleteEvent",
                json!({"ref": "topic", "ref_type": "branch"}),
                "@a deleted branch topic",
                vec![],
            ),
            (
                "IssuesEvent",
                json!({"action": "opened", "issue": {"number": 9, "title": "Bug"}}),
                "@a opened #9",
                vec!["", "Bug"],
            ),
            (
                "PullRequestEvent",
                json!({"action": "closed", "number": 3, "pull_request": {"number": 3, "title": "T", "merged": true}}),
                "@a merged a pull request #3",
                vec!["", "T"],
            ),
            (
                "PullRequestEvent",
                json!({"action": "closed", "number": 4, "pull_request": {"number": 4, "title": "U", "merged": false}}),
                "@a closed a pull request #4",
                vec!["", "U"],
            ),
            (
                "PullRequestEvent",
                json!({"action": "opened", "number": 5, "pull_request": {"number": 5, "title": ""}}),
                "@a opened a pull request #5",
                vec![],
            ),
            (
                "PullRequestReviewCommentEvent",
                json!({"action": "created", "pull_request": {"number": 7}, "comment": comment}),
                "@a commented on pull request #7",
                vec!["", "Looks good", "", "https://c/1"],
            ),
            (
                "CommitCommentEvent",
                json!({"comment": {"id": 2, "body": "nit", "html_url": "", "commit_id": "abc123"}}),
                "@a commented on commit abc123",
                vec!["", "nit"],
            ),
            ("WatchEvent", json!({"action": "started"}), "@a is now watching", vec![]),
            (
                "ForkEvent",
                json!({"forkee": {"full_name": "a/hello", "html_url": "https://github.com/a/hello"}}),
                "@a forked the repo at https://github.com/a/hello",
                vec![],
            ),
            (
                "MemberEvent",
                json!({"member": {"login": "b"}}),
                "@a added @b as a collaborator",
                vec![],
            ),
            (
                "MemberEvent",
                json!({"action": "removed", "member": {"login": "b"}}),
                "@a removed @b as a collaborator",
                vec![],
            ),
            ("PublicEvent", json!({}), "@a made the repository public", vec![]),
            (
                "ReleaseEvent",
                json!({"action": "published", "release": {"tag_name": "v1"}}),
                "@a published release v1",
                vec![],
            ),
            (
                "CreateEvent",
                json!({"ref": "v2", "ref_type": "tag"}),
                "@a created a new tag: v2",
                vec![],
            ),
        ];

        for (raw_type, payload, headline, body) in cases {
            let summary = summarize(&decoded(raw_type, payload), 5);
            assert_eq!(summary.headline, headline, "{}", raw_type);
            assert_eq!(summary.body, body, "{}", raw_type);
        }
    }

    #[test]
    fn test_kinds_without_template_are_unhandled() {
        for raw_type in ["GistEvent", "SponsorshipEvent"] {
            let summary = summarize(&decoded(raw_type, json!({"action": "created"})), 5);
            assert_eq!(summary.headline, format!("Unhandled event [{}]", raw_type));
            assert!(summary.body.is_empty());
        }
    }
}
