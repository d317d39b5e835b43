//! Shared types, configuration, errors and credential lookup for Jarvis.

pub mod config;
pub mod error;
pub mod secrets;
pub mod types;

pub use config::JarvisConfig;
pub use error::{JarvisError, Result};
pub use secrets::{Credential, SecretsProvider};
pub use types::*;
