//! Startup errors
//!
//! These are the only errors that stop the process. Everything that happens
//! once polling has begun is reported and retried instead.

use thiserror::Error;

/// Errors raised while turning configuration into running components
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid source '{descriptor}': {reason}")]
    InvalidSource { descriptor: String, reason: String },

    #[error("No GitHub token found (set {env_var}, run `gw login`, or enter one when prompted)")]
    MissingCredential { env_var: String },

    #[error("Could not resolve the authenticated user: {0}")]
    IdentityUnresolved(String),

    #[error("Credential store error: {0}")]
    Store(String),
}

impl ConfigError {
    pub fn invalid_source(descriptor: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSource {
            descriptor: descriptor.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_source_message() {
        let err = ConfigError::invalid_source("repo:nope", "expected owner/name");
        assert_eq!(err.to_string(), "Invalid source 'repo:nope': expected owner/name");
    }

    #[test]
    fn test_missing_credential_names_env_var() {
        let err = ConfigError::MissingCredential {
            env_var: "GITHUB_TOKEN".to_string(),
        };
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }
}
