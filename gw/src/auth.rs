//! Credential providers
//!
//! A token is taken from the first provider that has one: the environment, the
//! token file written by `gw login`, then an interactive prompt. Prompted tokens
//! are saved to the token file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ApiConfig, AuthConfig};
use crate::error::ConfigError;
use crate::poller::EventApi;

/// A bearer token and, when known, the login it belongs to
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    pub token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            login: None,
            token: token.into(),
        }
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Something that may be able to produce credentials
pub trait CredentialProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "not available here, try the next provider"
    fn credentials(&self) -> Result<Option<Credentials>, ConfigError>;

    /// Whether credentials from this provider should be written to the token file
    fn persist(&self) -> bool {
        false
    }
}

/// Token from an environment variable
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn name(&self) -> &'static str {
        "env"
    }

    fn credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        debug!(var = %self.var, "EnvCredentials::credentials: called");
        Ok(std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Credentials::new))
    }
}

/// JSON token file, `{"login": ..., "token": ...}`
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read stored credentials; a missing file is not an error
    pub fn load(&self) -> Result<Option<Credentials>, ConfigError> {
        debug!(path = %self.path.display(), "TokenFile::load: called");
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::Store(format!("Failed to read {}: {}", self.path.display(), e)))?;
        let creds: Credentials = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Store(format!("Failed to parse {}: {}", self.path.display(), e)))?;

        if creds.token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(creds))
    }

    /// Write credentials, readable by the owner only
    pub fn save(&self, creds: &Credentials) -> Result<(), ConfigError> {
        debug!(path = %self.path.display(), login = ?creds.login, "TokenFile::save: called");
        let store_err = |e: std::io::Error| ConfigError::Store(format!("Failed to write {}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(store_err)?;
        }

        let content = serde_json::to_string_pretty(creds).map_err(|e| ConfigError::Store(e.to_string()))?;
        fs::write(&self.path, content).map_err(store_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(store_err)?;
        }

        info!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }
}

impl CredentialProvider for TokenFile {
    fn name(&self) -> &'static str {
        "token-file"
    }

    fn credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        self.load()
    }
}

/// Ask for a personal access token on the terminal
pub struct PromptCredentials;

impl PromptCredentials {
    const PROMPT: &'static str = "GitHub personal access token: ";
}

impl CredentialProvider for PromptCredentials {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        debug!("PromptCredentials::credentials: called");
        let mut rl =
            DefaultEditor::new().map_err(|e| ConfigError::Store(format!("Failed to initialize readline: {}", e)))?;

        match rl.readline(Self::PROMPT) {
            Ok(line) => {
                let token = line.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Credentials::new(token)))
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(ConfigError::Store(format!("Readline error: {}", e))),
        }
    }

    fn persist(&self) -> bool {
        true
    }
}

/// Ordered list of providers
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
    store: Option<TokenFile>,
    env_var: String,
}

impl CredentialChain {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>, store: Option<TokenFile>, env_var: impl Into<String>) -> Self {
        Self {
            providers,
            store,
            env_var: env_var.into(),
        }
    }

    /// env → token file → prompt (when `interactive`)
    pub fn standard(api: &ApiConfig, auth: &AuthConfig, interactive: bool) -> Self {
        let store = TokenFile::new(&auth.token_file);
        let mut providers: Vec<Box<dyn CredentialProvider>> =
            vec![Box::new(EnvCredentials::new(&api.token_env)), Box::new(store.clone())];
        if interactive {
            providers.push(Box::new(PromptCredentials));
        }
        Self::new(providers, Some(store), &api.token_env)
    }

    /// First credentials any provider has
    pub fn resolve(&self) -> Result<Credentials, ConfigError> {
        for provider in &self.providers {
            if let Some(creds) = provider.credentials()? {
                info!(provider = provider.name(), "Using credentials");
                if provider.persist()
                    && let Some(store) = &self.store
                {
                    store.save(&creds)?;
                }
                return Ok(creds);
            }
            debug!(provider = provider.name(), "resolve: nothing here");
        }

        Err(ConfigError::MissingCredential {
            env_var: self.env_var.clone(),
        })
    }
}

/// The login the credentials belong to, asking the API when it is not stored
pub async fn resolve_login(creds: &Credentials, api: &dyn EventApi) -> Result<String, ConfigError> {
    if let Some(login) = creds.login.as_deref().filter(|l| !l.is_empty()) {
        return Ok(login.to_string());
    }

    debug!("resolve_login: asking the API");
    api.current_user()
        .await
        .map_err(|e| ConfigError::IdentityUnresolved(e.to_string()))
}
