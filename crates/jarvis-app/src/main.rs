//! Jarvis application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Install tracing
//! 3. Resolve the API key and build the chat orchestrator
//! 4. Run a one-shot message, or the interactive terminal loop

mod cli;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use jarvis_action::DeepLinkDispatcher;
use jarvis_chat::{ChatOrchestrator, Session};
use jarvis_core::config::JarvisConfig;
use jarvis_core::secrets::SecretsProvider;
use tokio::io::BufReader;

use crate::cli::CliArgs;
use crate::repl::{Repl, TerminalNavigator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, read before tracing so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = JarvisConfig::load(&config_file);
    let config_level = loaded
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(args.resolve_log_level(&config_level))
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Jarvis v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Err(e) if config_file.exists() => {
            tracing::warn!(
                path = %config_file.display(),
                error = %e,
                "Invalid config, using defaults"
            );
            JarvisConfig::default()
        }
        Err(_) => {
            tracing::info!(path = %config_file.display(), "No config file, using defaults");
            JarvisConfig::default()
        }
    };
    config.validate()?;

    // Orchestrator.
    let secrets = SecretsProvider::from_config(&config.credentials, args.secrets.clone());
    let orchestrator = ChatOrchestrator::from_config(&config, &secrets)?;
    let dispatcher = DeepLinkDispatcher::new(
        Arc::new(TerminalNavigator),
        Duration::from_millis(config.assistant.navigation_delay_ms),
    );
    let repl = Repl::new(orchestrator, dispatcher, config.assistant.name.clone());
    let mut session = Session::new();
    tracing::debug!(session = %session.id(), "Session started");

    // One-shot mode waits for the navigation before exiting.
    if let Some(message) = args.message.as_deref() {
        if let Some(audio) = args.audio.as_deref() {
            if let Some(handle) = repl.submit_voice(&mut session, audio).await {
                handle.await?;
            }
        }
        if let Some(handle) = repl.submit_text(&mut session, message).await {
            handle.await?;
        }
        return Ok(());
    }

    repl.print_header(&mut session).await;
    let startup_navigation = match args.audio.as_deref() {
        Some(audio) => repl.submit_voice(&mut session, audio).await,
        None => None,
    };
    repl.run(&mut session, BufReader::new(tokio::io::stdin())).await?;
    if let Some(handle) = startup_navigation {
        handle.await?;
    }

    tracing::info!(turns = session.history().len(), "Jarvis stopped");
    Ok(())
}
