//! Static table of app deep links.
//!
//! Maps a lowercase action name to the URI scheme that launches the app on a
//! mobile browser. Built once at startup and only read afterwards.

use std::collections::BTreeMap;

use jarvis_core::config::ActionsConfig;

use crate::error::ActionError;

/// Built-in apps available without any configuration.
pub const DEFAULT_ACTIONS: &[(&str, &str)] = &[
    ("gmail", "googlegmail://"),
    ("instagram", "instagram://"),
    ("maps", "comgooglemaps://"),
    ("spotify", "spotify://"),
    ("whatsapp", "whatsapp://"),
    ("youtube", "vnd.youtube://"),
];

/// Schemes that would run code or read local files instead of launching an app.
const DENIED_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript"];

/// Mapping from action name to navigation target.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    targets: BTreeMap<String, String>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding [`DEFAULT_ACTIONS`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, uri) in DEFAULT_ACTIONS {
            registry
                .targets
                .insert((*name).to_string(), (*uri).to_string());
        }
        registry
    }

    /// Build the registry from the `[actions]` config section.
    ///
    /// Entries from `registry` override built-in entries with the same name.
    pub fn from_config(config: &ActionsConfig) -> Result<Self, ActionError> {
        let mut registry = if config.include_defaults {
            Self::with_defaults()
        } else {
            Self::new()
        };
        for (name, uri) in &config.registry {
            registry.register(name, uri)?;
        }
        tracing::debug!(actions = registry.len(), "Action registry built");
        Ok(registry)
    }

    /// Add or replace an entry. The name is case-normalized.
    pub fn register(&mut self, name: &str, target_uri: &str) -> Result<(), ActionError> {
        let key = normalize(name);
        if key.is_empty() {
            return Err(ActionError::EmptyName);
        }
        validate_target(&key, target_uri)?;
        if let Some(previous) = self.targets.insert(key.clone(), target_uri.to_string()) {
            tracing::debug!(name = %key, previous = %previous, "Action target overridden");
        }
        Ok(())
    }

    /// Look up the target for `name`, ignoring case and surrounding whitespace.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.targets.get(&normalize(name)).map(String::as_str)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check that `uri` starts with an RFC 3986 scheme that is not denied.
pub(crate) fn validate_target(name: &str, uri: &str) -> Result<(), ActionError> {
    let invalid = |reason: String| ActionError::InvalidTarget {
        name: name.to_string(),
        reason,
    };

    let scheme = match uri.split_once(':') {
        Some((scheme, _)) if !scheme.is_empty() => scheme,
        _ => return Err(invalid(format!("'{}' has no URI scheme", uri))),
    };

    let well_formed = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !well_formed {
        return Err(invalid(format!("'{}' is not a valid URI scheme", scheme)));
    }

    let lower = scheme.to_ascii_lowercase();
    if DENIED_SCHEMES.contains(&lower.as_str()) {
        return Err(invalid(format!("scheme '{}' is not allowed", lower)));
    }
    Ok(())
}
