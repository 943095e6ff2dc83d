//! Source descriptors and the endpoint table
//!
//! A descriptor names one independently pollable feed. Its textual form is
//! `kind:identifier` (`org:rust-lang`, `repo:tokio-rs/tokio`, `received`) and
//! doubles as the source identifier carried on every batch.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::ConfigError;

/// Which feed a descriptor points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Public events of an organization
    Org,
    /// An organization's events as seen by the authenticated user (includes private)
    UserOrg,
    /// Events of one repository
    Repo,
    /// Events performed by a user
    User,
    /// Events received by the authenticated user (the default feed)
    ReceivedEvents,
}

impl SourceKind {
    fn prefix(self) -> &'static str {
        match self {
            SourceKind::Org => "org",
            SourceKind::UserOrg => "user-org",
            SourceKind::Repo => "repo",
            SourceKind::User => "user",
            SourceKind::ReceivedEvents => "received",
        }
    }

    /// Whether the endpoint path embeds the authenticated login
    pub fn needs_login(self) -> bool {
        matches!(self, SourceKind::UserOrg | SourceKind::ReceivedEvents)
    }
}

/// One configured feed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    /// Org, `owner/name`, or login; empty for the received-events feed
    pub identifier: String,
}

impl SourceDescriptor {
    pub fn org(org: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(SourceKind::Org, org)
    }

    pub fn user_org(org: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(SourceKind::UserOrg, org)
    }

    pub fn repo(full_name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(SourceKind::Repo, full_name)
    }

    pub fn user(login: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(SourceKind::User, login)
    }

    pub fn received() -> Self {
        Self {
            kind: SourceKind::ReceivedEvents,
            identifier: String::new(),
        }
    }

    /// Build and validate a descriptor
    pub fn new(kind: SourceKind, identifier: impl Into<String>) -> Result<Self, ConfigError> {
        let identifier = identifier.into();
        let descriptor = Self { kind, identifier };
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: &str| Err(ConfigError::invalid_source(self.to_string(), reason));

        match self.kind {
            SourceKind::ReceivedEvents => {
                if !self.identifier.is_empty() {
                    return fail("the received feed takes no identifier");
                }
            }
            SourceKind::Repo => {
                let parts: Vec<&str> = self.identifier.split('/').collect();
                if parts.len() != 2 {
                    return fail("expected owner/name");
                }
                if !parts.iter().all(|p| is_valid_name(p)) {
                    return fail("owner and name must be non-empty and contain only letters, digits, '-', '_' or '.'");
                }
            }
            SourceKind::Org | SourceKind::UserOrg | SourceKind::User => {
                if !is_valid_name(&self.identifier) {
                    return fail("name must be non-empty and contain only letters, digits, '-', '_' or '.'");
                }
            }
        }
        Ok(())
    }

    /// Concrete endpoint path for this feed
    ///
    /// `login` is the authenticated user; it is required for the user-scoped
    /// org feed and the received-events feed.
    pub fn endpoint(&self, login: Option<&str>) -> Result<String, ConfigError> {
        debug!(source = %self, ?login, "endpoint: called");
        let need_login = || {
            login.filter(|l| !l.is_empty()).ok_or_else(|| {
                ConfigError::IdentityUnresolved(format!("source '{}' needs the authenticated login", self))
            })
        };

        let path = match self.kind {
            SourceKind::Org => format!("/orgs/{}/events", self.identifier),
            SourceKind::UserOrg => format!("/users/{}/events/orgs/{}", need_login()?, self.identifier),
            SourceKind::Repo => format!("/repos/{}/events", self.identifier),
            SourceKind::User => format!("/users/{}/events", self.identifier),
            SourceKind::ReceivedEvents => format!("/users/{}/received_events", need_login()?),
        };
        Ok(path)
    }

    /// Resolve the endpoint once, producing the immutable poll target
    pub fn resolve(&self, login: Option<&str>) -> Result<ResolvedSource, ConfigError> {
        Ok(ResolvedSource {
            descriptor: self.clone(),
            path: self.endpoint(login)?,
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == SourceKind::ReceivedEvents {
            f.write_str(self.kind.prefix())
        } else {
            write!(f, "{}:{}", self.kind.prefix(), self.identifier)
        }
    }
}

impl FromStr for SourceDescriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "received" {
            return Ok(Self::received());
        }

        let (prefix, identifier) = s
            .split_once(':')
            .ok_or_else(|| ConfigError::invalid_source(s, "expected kind:identifier"))?;

        let kind = match prefix {
            "org" => SourceKind::Org,
            "user-org" => SourceKind::UserOrg,
            "repo" => SourceKind::Repo,
            "user" => SourceKind::User,
            "received" => SourceKind::ReceivedEvents,
            other => {
                return Err(ConfigError::invalid_source(
                    s,
                    format!("unknown kind '{}' (expected org, user-org, repo, user, received)", other),
                ));
            }
        };

        Self::new(kind, identifier)
    }
}

/// A descriptor with its endpoint path fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub descriptor: SourceDescriptor,
    pub path: String,
}

impl ResolvedSource {
    /// Identifier carried on every batch from this source
    pub fn id(&self) -> String {
        self.descriptor.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_kind() {
        let cases = [
            ("org:rust-lang", SourceKind::Org, "rust-lang"),
            ("user-org:acme", SourceKind::UserOrg, "acme"),
            ("repo:tokio-rs/tokio", SourceKind::Repo, "tokio-rs/tokio"),
            ("user:octocat", SourceKind::User, "octocat"),
            ("received", SourceKind::ReceivedEvents, ""),
        ];
        for (text, kind, ident) in cases {
            let d: SourceDescriptor = text.parse().unwrap();
            assert_eq!(d.kind, kind, "{}", text);
            assert_eq!(d.identifier, ident, "{}", text);
            assert_eq!(d.to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_bad_descriptors() {
        for text in [
            "rust-lang",
            "team:core",
            "org:",
            "org:has space",
            "repo:justname",
            "repo:a/b/c",
            "repo:/name",
            "user:..",
            "user:a?b",
            "received:someone",
        ] {
            let err = text.parse::<SourceDescriptor>().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSource { .. }), "{}", text);
        }
    }

    #[test]
    fn test_endpoint_table() {
        let login = Some("me");
        assert_eq!(SourceDescriptor::org("acme").unwrap().endpoint(login).unwrap(), "/orgs/acme/events");
        assert_eq!(
            SourceDescriptor::user_org("acme").unwrap().endpoint(login).unwrap(),
            "/users/me/events/orgs/acme"
        );
        assert_eq!(SourceDescriptor::repo("o/r").unwrap().endpoint(login).unwrap(), "/repos/o/r/events");
        assert_eq!(SourceDescriptor::user("bob").unwrap().endpoint(login).unwrap(), "/users/bob/events");
        assert_eq!(SourceDescriptor::received().endpoint(login).unwrap(), "/users/me/received_events");
    }

    #[test]
    fn test_endpoint_requires_login_for_user_scoped_feeds() {
        assert!(SourceDescriptor::received().endpoint(None).is_err());
        assert!(SourceDescriptor::user_org("acme").unwrap().endpoint(Some("")).is_err());
        assert!(SourceDescriptor::org("acme").unwrap().endpoint(None).is_ok());
    }

    #[test]
    fn test_resolved_source_id() {
        let resolved = SourceDescriptor::repo("o/r").unwrap().resolve(None).unwrap();
        assert_eq!(resolved.id(), "repo:o/r");
        assert_eq!(resolved.path, "/repos/o/r/events");
    }
}
