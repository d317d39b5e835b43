//! TOML configuration for Jarvis: model candidates, assistant persona,
//! deep-link registry overrides and credential sources.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{JarvisError, Result};

/// Top-level configuration for the Jarvis assistant.
///
/// Loaded from `~/.jarvis/config.toml` by default. Every section is optional;
/// missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JarvisConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl JarvisConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: JarvisConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make every turn fail.
    pub fn validate(&self) -> Result<()> {
        if self.model.candidates.is_empty() {
            return Err(JarvisError::Config(
                "model.candidates must list at least one model".to_string(),
            ));
        }
        if let Some(c) = self.model.candidates.iter().find(|c| c.id.trim().is_empty()) {
            return Err(JarvisError::Config(format!(
                "model candidate with label '{}' has an empty id",
                c.label
            )));
        }
        if self.model.request_timeout_secs == 0 {
            return Err(JarvisError::Config(
                "model.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.credentials.env_var.trim().is_empty() {
            return Err(JarvisError::Config(
                "credentials.env_var must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// One entry of the model preference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// Model identifier as understood by the inference endpoint.
    pub id: String,
    /// Human-readable label shown in the header.
    pub label: String,
}

impl ModelCandidate {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Inference endpoint and model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Preference list, tried top to bottom.
    pub candidates: Vec<ModelCandidate>,
    /// Base URL of the Gemini REST API.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                ModelCandidate::new("gemini-2.5-flash", "Gemini 2.5 ⚡"),
                ModelCandidate::new("gemini-1.5-flash-latest", "Gemini 1.5 (Backup)"),
            ],
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Persona and prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Display name of the assistant.
    pub name: String,
    /// Directive prepended to every request.
    pub system_directive: String,
    /// Appended to the directive; `{actions}` is replaced by the registered
    /// action names. Empty disables the open-app convention.
    pub command_instructions: String,
    /// Instruction sent alongside an uploaded voice recording.
    pub voice_instruction: String,
    /// Transcript text recorded for a voice turn.
    pub voice_placeholder: String,
    /// Delay before a deep-link navigation fires, so the reply renders first.
    pub navigation_delay_ms: u64,
    /// Maximum accepted length of a typed message, in characters.
    pub max_message_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "JARVIS".to_string(),
            system_directive: "You are JARVIS.".to_string(),
            command_instructions: "When the user asks you to open an app, include the tag \
                [[OPEN:<app>]] once in your reply, where <app> is one of: {actions}."
                .to_string(),
            voice_instruction: "Listen to this audio. Be concise, intelligent, and helpful."
                .to_string(),
            voice_placeholder: "🎤 [Voice Command]".to_string(),
            navigation_delay_ms: 1000,
            max_message_chars: 4000,
        }
    }
}

impl AssistantConfig {
    /// Build the full system directive for the given action names.
    pub fn render_directive<S: AsRef<str>>(&self, action_names: &[S]) -> String {
        if self.command_instructions.is_empty() || action_names.is_empty() {
            return self.system_directive.clone();
        }
        let names: Vec<&str> = action_names.iter().map(|n| n.as_ref()).collect();
        let instructions = self.command_instructions.replace("{actions}", &names.join(", "));
        format!("{} {}", self.system_directive, instructions)
    }
}

/// Deep-link action registry overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Whether the built-in app table is loaded before `registry`.
    pub include_defaults: bool,
    /// Action name to target URI; merged over the built-in table.
    pub registry: BTreeMap<String, String>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            registry: BTreeMap::new(),
        }
    }
}

/// Where the API credential is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Environment variable checked first, also the key looked up in the secrets file.
    pub env_var: String,
    /// TOML secrets file checked when the variable is unset.
    pub secrets_file: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_var: "GOOGLE_API_KEY".to_string(),
            secrets_file: "~/.jarvis/secrets.toml".to_string(),
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&path[2..])
    } else {
        PathBuf::from(path)
    }
}
