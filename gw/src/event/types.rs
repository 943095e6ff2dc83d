//! Event data model
//!
//! An [`Event`] is what the poller hands downstream after the envelope has been
//! classified. Payload structs carry only the fields their summaries need; every
//! optional field is defaulted so older or trimmed API payloads still decode.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Account reference (actor, member, comment author)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRef {
    pub login: String,
}

/// Repository reference as it appears in an envelope (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoRef {
    pub name: String,
}

/// Organization reference as it appears in an envelope
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrgRef {
    pub login: String,
}

/// Raw event record before payload resolution
///
/// The payload stays type-erased until the discriminator has been looked up.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub id: String,
    #[serde(rename = "type")]
    pub raw_type: String,
    pub actor: UserRef,
    pub repo: RepoRef,
    #[serde(default)]
    pub org: Option<OrgRef>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A decoded activity event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Source-assigned id; opaque, only compared for identity
    pub id: String,
    pub actor: UserRef,
    /// The discriminator exactly as the API sent it
    pub raw_type: String,
    pub repo_name: String,
    pub org_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payload: EventPayload,
}

/// Typed payload, one variant per event type with a summary template
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    CommitComment(CommitCommentPayload),
    Create(CreatePayload),
    Delete(DeletePayload),
    Fork(ForkPayload),
    Gollum(GollumPayload),
    IssueComment(IssueCommentPayload),
    Issues(IssuesPayload),
    Member(MemberPayload),
    Public(PublicPayload),
    PullRequest(PullRequestPayload),
    PullRequestReviewComment(PullRequestReviewCommentPayload),
    Push(PushPayload),
    Release(ReleasePayload),
    Watch(WatchPayload),
    /// Discriminator not recognized, or recognized without a decode target
    Unknown { raw_type: String },
}

impl EventPayload {
    pub fn is_unknown(&self) -> bool {
        matches!(self, EventPayload::Unknown { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatePayload {
    pub ref_type: String,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub master_branch: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeletePayload {
    pub ref_type: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub before: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub distinct_size: u64,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

impl PushPayload {
    /// Branch name with the `refs/heads/` prefix removed
    pub fn branch(&self) -> &str {
        self.git_ref.strip_prefix("refs/heads/").unwrap_or(&self.git_ref)
    }

    /// Commits not already reachable through an earlier push
    pub fn distinct_commits(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter().filter(|c| c.distinct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: CommitAuthor,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub distinct: bool,
}

impl Commit {
    /// First eight characters of the sha
    pub fn short_sha(&self) -> &str {
        match self.sha.char_indices().nth(8) {
            Some((idx, _)) => &self.sha[..idx],
            None => &self.sha,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub commit_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub merged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueCommentPayload {
    #[serde(default)]
    pub action: String,
    pub issue: IssueRef,
    pub comment: Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssuesPayload {
    pub action: String,
    pub issue: IssueRef,
    #[serde(default)]
    pub assignee: Option<UserRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestPayload {
    pub action: String,
    #[serde(default)]
    pub number: u64,
    pub pull_request: PullRequestRef,
}

impl PullRequestPayload {
    /// Action as shown to the user; a closed-and-merged PR reads as "merged"
    pub fn display_action(&self) -> &str {
        if self.action == "closed" && self.pull_request.merged {
            "merged"
        } else {
            &self.action
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestReviewCommentPayload {
    #[serde(default)]
    pub action: String,
    pub pull_request: PullRequestRef,
    pub comment: Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitCommentPayload {
    pub comment: CommitComment,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GollumPayload {
    #[serde(default)]
    pub pages: Vec<WikiPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WikiPage {
    #[serde(default)]
    pub page_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchPayload {
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForkPayload {
    pub forkee: Forkee,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Forkee {
    #[serde(default)]
    pub full_name: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberPayload {
    #[serde(default = "default_member_action")]
    pub action: String,
    pub member: UserRef,
}

fn default_member_action() -> String {
    "added".to_string()
}

/// PublicEvent carries an empty payload object
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublicPayload {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleasePayload {
    pub action: String,
    pub release: ReleaseRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseRef {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: String,
}
