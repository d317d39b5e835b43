//! Error types for the action engine.

use jarvis_core::error::JarvisError;

/// Errors from registry construction and deep-link dispatch.
///
/// Interpreting model text never fails; these only surface when building
/// the registry from configuration or handing a request to the navigator.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action name must not be empty")]
    EmptyName,
    #[error("Invalid target for '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),
    #[error("Configuration error: {0}")]
    Config(#[from] JarvisError),
}
