//! Event type discriminators
//!
//! The table below is the single mapping from the API's `type` string to an
//! [`EventKind`]. Kinds without a payload target decode to `Unknown`.

use std::fmt;

/// Every discriminator the activity API is known to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CommitComment,
    Create,
    Delete,
    Deployment,
    DeploymentStatus,
    Download,
    Follow,
    Fork,
    ForkApply,
    Gist,
    Gollum,
    IssueComment,
    Issues,
    Member,
    Membership,
    PageBuild,
    Public,
    PullRequest,
    PullRequestReviewComment,
    Push,
    Release,
    Repository,
    Status,
    TeamAdd,
    Watch,
}

/// Discriminator string → kind
const KIND_TABLE: &[(&str, EventKind)] = &[
    ("CommitCommentEvent", EventKind::CommitComment),
    ("CreateEvent", EventKind::Create),
    ("DeleteEvent", EventKind::Delete),
    ("DeploymentEvent", EventKind::Deployment),
    ("DeploymentStatusEvent", EventKind::DeploymentStatus),
    ("DownloadEvent", EventKind::Download),
    ("FollowEvent", EventKind::Follow),
    ("ForkEvent", EventKind::Fork),
    ("ForkApplyEvent", EventKind::ForkApply),
    ("GistEvent", EventKind::Gist),
    ("GollumEvent", EventKind::Gollum),
    ("IssueCommentEvent", EventKind::IssueComment),
    ("IssuesEvent", EventKind::Issues),
    ("MemberEvent", EventKind::Member),
    ("MembershipEvent", EventKind::Membership),
    ("PageBuildEvent", EventKind::PageBuild),
    ("PublicEvent", EventKind::Public),
    ("PullRequestEvent", EventKind::PullRequest),
    ("PullRequestReviewCommentEvent", EventKind::PullRequestReviewComment),
    ("PushEvent", EventKind::Push),
    ("ReleaseEvent", EventKind::Release),
    ("RepositoryEvent", EventKind::Repository),
    ("StatusEvent", EventKind::Status),
    ("TeamAddEvent", EventKind::TeamAdd),
    ("WatchEvent", EventKind::Watch),
];

impl EventKind {
    /// Look up a discriminator; `None` for anything not in the table
    pub fn from_discriminator(raw: &str) -> Option<Self> {
        KIND_TABLE.iter().find(|(name, _)| *name == raw).map(|(_, kind)| *kind)
    }

    /// The discriminator string the API uses for this kind
    pub fn as_str(self) -> &'static str {
        KIND_TABLE
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("UnknownEvent")
    }

    /// All known kinds, in table order
    pub fn all() -> impl Iterator<Item = EventKind> {
        KIND_TABLE.iter().map(|(_, kind)| *kind)
    }

    /// Whether the decoder has a payload struct for this kind
    pub fn has_payload_target(self) -> bool {
        matches!(
            self,
            EventKind::CommitComment
                | EventKind::Create
                | EventKind::Delete
                | EventKind::Fork
                | EventKind::Gollum
                | EventKind::IssueComment
                | EventKind::Issues
                | EventKind::Member
                | EventKind::Public
                | EventKind::PullRequest
                | EventKind::PullRequestReviewComment
                | EventKind::Push
                | EventKind::Release
                | EventKind::Watch
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_round_trips_every_kind() {
        for kind in EventKind::all() {
            assert_eq!(EventKind::from_discriminator(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_table_has_no_duplicates() {
        let names: HashSet<_> = KIND_TABLE.iter().map(|(n, _)| *n).collect();
        let kinds: HashSet<_> = KIND_TABLE.iter().map(|(_, k)| *k).collect();
        assert_eq!(names.len(), KIND_TABLE.len());
        assert_eq!(kinds.len(), KIND_TABLE.len());
        assert_eq!(KIND_TABLE.len(), 25);
    }

    #[test]
    fn test_unknown_discriminator() {
        assert_eq!(EventKind::from_discriminator("SponsorshipEvent"), None);
        assert_eq!(EventKind::from_discriminator("pushevent"), None);
        assert_eq!(EventKind::from_discriminator(""), None);
    }

    #[test]
    fn test_payload_targets() {
        assert!(EventKind::Push.has_payload_target());
        assert!(EventKind::Watch.has_payload_target());
        assert!(!EventKind::Gist.has_payload_target());
        assert!(!EventKind::TeamAdd.has_payload_target());
        assert_eq!(EventKind::all().filter(|k| k.has_payload_target()).count(), 14);
    }
}
