//! Activity events: data model, discriminator table and envelope decoder

mod decode;
mod kind;
mod types;

pub use decode::{DecodeError, decode_batch, decode_envelope, decode_payload, envelope_id};
pub use kind::EventKind;
pub use types::{
    Comment, Commit, CommitAuthor, CommitComment, CommitCommentPayload, CreatePayload, DeletePayload, Envelope, Event,
    EventPayload, ForkPayload, Forkee, GollumPayload, IssueCommentPayload, IssueRef, IssuesPayload, MemberPayload,
    OrgRef, PublicPayload, PullRequestPayload, PullRequestRef, PullRequestReviewCommentPayload, PushPayload,
    ReleasePayload, ReleaseRef, RepoRef, UserRef, WatchPayload, WikiPage,
};
