//! Terminal render surface: the interactive loop, command parsing, and the
//! navigator that announces deep links.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jarvis_action::{ActionError, DeepLinkDispatcher, NavigationRequest, Navigator};
use jarvis_chat::{AudioCapture, ChatOrchestrator, Session, TurnOutcome};
use jarvis_core::types::Role;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

const HELP: &str = "Commands:
  /voice <file.wav>  send a voice recording
  /history           show the transcript
  /clear             start a new session
  /model             re-select the model
  /help              show this help
  /quit              exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Message(String),
    Voice(PathBuf),
    History,
    Clear,
    Model,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ReplCommand::Message(line.to_string());
        };
        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        match name.to_lowercase().as_str() {
            "voice" if !rest.is_empty() => ReplCommand::Voice(PathBuf::from(rest)),
            "history" => ReplCommand::History,
            "clear" => ReplCommand::Clear,
            "model" => ReplCommand::Model,
            "help" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

/// Prints the navigation target; the terminal has nothing to open.
pub struct TerminalNavigator;

#[async_trait]
impl Navigator for TerminalNavigator {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn navigate(&self, request: &NavigationRequest) -> Result<(), ActionError> {
        let line = format!("{DIM}-> opening {} ({}){RESET}\n", request.name, request.uri);
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ActionError::NavigationFailed(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| ActionError::NavigationFailed(e.to_string()))
    }
}

/// The interactive session loop.
pub struct Repl {
    orchestrator: ChatOrchestrator,
    dispatcher: DeepLinkDispatcher,
    assistant_name: String,
}

impl Repl {
    pub fn new(
        orchestrator: ChatOrchestrator,
        dispatcher: DeepLinkDispatcher,
        assistant_name: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            dispatcher,
            assistant_name: assistant_name.into(),
        }
    }

    /// Print the header with the selected model.
    pub async fn print_header(&self, session: &mut Session) {
        let status = match self.orchestrator.ensure_model(session).await {
            Ok(Some(model)) => model.label,
            Ok(None) => "offline (no API key)".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "No model available at startup");
                format!("{RED}{}{RESET}", e.degraded_reply())
            }
        };
        println!("{CYAN}{}{RESET} | {}", self.assistant_name, status);
        println!("{DIM}Type a message, or /help for commands.{RESET}");
    }

    /// Run one text turn and render it. Returns the navigation task, if any.
    pub async fn submit_text(&self, session: &mut Session, text: &str) -> Option<JoinHandle<()>> {
        println!("{DIM}Thinking...{RESET}");
        match self.orchestrator.submit_text(session, text).await {
            Ok(outcome) => self.render(outcome),
            Err(e) => {
                println!("{RED}{}{RESET}", e);
                None
            }
        }
    }

    /// Run one voice turn from a WAV file and render it.
    pub async fn submit_voice(&self, session: &mut Session, path: &Path) -> Option<JoinHandle<()>> {
        let capture = match AudioCapture::from_wav_file(path) {
            Ok(capture) => capture,
            Err(e) => {
                println!("{RED}{}{RESET}", e);
                return None;
            }
        };
        println!("{DIM}Processing...{RESET}");
        match self.orchestrator.submit_voice(session, capture).await {
            Ok(outcome) => self.render(outcome),
            Err(e) => {
                println!("{RED}{}{RESET}", e);
                None
            }
        }
    }

    fn render(&self, outcome: TurnOutcome) -> Option<JoinHandle<()>> {
        match outcome {
            TurnOutcome::Reply {
                display_text,
                action,
                ignored,
                ..
            } => {
                println!("{CYAN}{}:{RESET} {}", self.assistant_name, display_text.trim());
                if !ignored.is_empty() {
                    tracing::debug!(ignored = ?ignored, "Extra directives ignored");
                }
                let action = action?;
                match self.dispatcher.dispatch(&action) {
                    Ok(handle) => handle,
                    Err(e) => {
                        tracing::warn!(action = %action, error = %e, "Navigation rejected");
                        None
                    }
                }
            }
            TurnOutcome::Failed(err) => {
                println!("{RED}{}{RESET}", err.degraded_reply());
                None
            }
            TurnOutcome::Skipped => {
                println!(
                    "{RED}No API key configured. Set GOOGLE_API_KEY or add it to the secrets file.{RESET}"
                );
                None
            }
        }
    }

    fn print_history(&self, session: &Session) {
        if session.history().is_empty() {
            println!("{DIM}(no messages yet){RESET}");
            return;
        }
        for turn in session.history() {
            let speaker = match turn.role() {
                Role::User => "you",
                Role::Assistant => self.assistant_name.as_str(),
            };
            let time = turn.created_at().to_datetime().format("%H:%M:%S");
            println!("{DIM}[{}]{RESET} {}: {}", time, speaker, turn.content());
        }
    }

    /// Read lines until `/quit` or end of input, then wait for any
    /// navigation still pending.
    pub async fn run<R>(&self, session: &mut Session, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut stdout = tokio::io::stdout();
        let mut pending: Vec<JoinHandle<()>> = Vec::new();
        loop {
            stdout.write_all(b"you> ").await?;
            stdout.flush().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let handle = match ReplCommand::parse(&line) {
                ReplCommand::Empty => None,
                ReplCommand::Message(text) => self.submit_text(session, &text).await,
                ReplCommand::Voice(path) => self.submit_voice(session, &path).await,
                ReplCommand::History => {
                    self.print_history(session);
                    None
                }
                ReplCommand::Clear => {
                    session.clear();
                    tracing::info!(session = %session.id(), "New session started");
                    println!("{DIM}Conversation cleared.{RESET}");
                    None
                }
                ReplCommand::Model => {
                    session.invalidate_model();
                    self.print_header(session).await;
                    None
                }
                ReplCommand::Help => {
                    println!("{HELP}");
                    None
                }
                ReplCommand::Quit => break,
                ReplCommand::Unknown(unknown) => {
                    println!("{RED}Unknown command: {}{RESET}", unknown);
                    println!("{HELP}");
                    None
                }
            };
            pending.extend(handle);
            pending.retain(|h| !h.is_finished());
        }
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Navigation task failed");
            }
        }
        Ok(())
    }
}
