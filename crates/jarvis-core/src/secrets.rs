//! API credential lookup.
//!
//! The credential is read from an environment variable first and from a
//! `secrets.toml` file second. Absence is reported as `None` so callers can
//! skip remote calls before any network activity.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{expand_home, CredentialsConfig};
use crate::error::{JarvisError, Result};

/// An API key. The value is never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key. Blank values are rejected.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Resolves the single credential the assistant needs.
#[derive(Debug, Clone)]
pub struct SecretsProvider {
    key: String,
    secrets_file: Option<PathBuf>,
}

impl SecretsProvider {
    pub fn new(key: impl Into<String>, secrets_file: Option<PathBuf>) -> Self {
        Self {
            key: key.into(),
            secrets_file,
        }
    }

    /// Build a provider from config; `file_override` wins over `secrets_file`.
    pub fn from_config(config: &CredentialsConfig, file_override: Option<PathBuf>) -> Self {
        let file = file_override.or_else(|| {
            if config.secrets_file.is_empty() {
                None
            } else {
                Some(expand_home(&config.secrets_file))
            }
        });
        Self::new(config.env_var.clone(), file)
    }

    /// Name of the credential (environment variable and secrets-file key).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Look up the credential. Never fails; unreadable sources count as absent.
    pub fn credential(&self) -> Option<Credential> {
        self.resolve(std::env::var(&self.key).ok())
    }

    fn resolve(&self, env_value: Option<String>) -> Option<Credential> {
        if let Some(credential) = env_value.and_then(Credential::new) {
            debug!(key = %self.key, "Credential found in environment");
            return Some(credential);
        }

        let path = self.secrets_file.as_deref()?;
        match read_secrets_file(path, &self.key) {
            Ok(Some(value)) => {
                let credential = Credential::new(value);
                if credential.is_some() {
                    debug!(
                        key = %self.key,
                        path = %path.display(),
                        "Credential found in secrets file"
                    );
                }
                credential
            }
            Ok(None) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read secrets file");
                None
            }
        }
    }
}

/// Read `key` from a flat TOML secrets file. A missing file is not an error.
fn read_secrets_file(path: &Path, key: &str) -> Result<Option<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let table: toml::Table = toml::from_str(&content)?;
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(JarvisError::Credential(format!(
            "{} must be a string, found {}",
            key,
            other.type_str()
        ))),
    }
}
