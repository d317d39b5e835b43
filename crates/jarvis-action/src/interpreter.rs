//! Directive-tag decoder for assistant replies.
//!
//! The model is steered to embed `[[OPEN:<name>]]` in otherwise natural text
//! when the user asks to launch an app. This module finds the tag, resolves
//! the name against the [`ActionRegistry`], and strips the tag from the text
//! shown to the user.
//!
//! Only the first tag is honored. Any further tags are removed from the
//! display text and reported in [`Interpretation::ignored`], so a second
//! pass over the output never finds a directive.

use std::sync::LazyLock;

use regex::Regex;

use crate::registry::ActionRegistry;
use crate::types::{ActionDirective, DirectiveAction, Interpretation};

/// `[[OPEN:<name>]]`, case-insensitive. The name may not be blank or contain brackets.
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[OPEN:\s*([^\[\]\s][^\[\]]*?)\s*\]\]").expect("Invalid directive regex")
});

/// Reply shown when the model asks for an app that is not registered.
pub fn unresolved_reply(name: &str) -> String {
    format!("I don't know the link for {}, sir.", name)
}

/// Whether `text` contains any directive tag.
pub fn contains_directive(text: &str) -> bool {
    DIRECTIVE_RE.is_match(text)
}

fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Stateless decoder that turns raw model text into display text plus an action.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    registry: ActionRegistry,
}

impl CommandInterpreter {
    pub fn new(registry: ActionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Interpret one assistant reply. Never fails.
    pub fn interpret(&self, raw_reply: &str) -> Interpretation {
        let Some(caps) = DIRECTIVE_RE.captures(raw_reply) else {
            return Interpretation::passthrough(raw_reply);
        };
        let tag = caps.get(0).map_or(0..0, |m| m.range());
        let directive = ActionDirective {
            action_name: normalize_name(&caps[1]),
        };

        // Remove exactly the matched tag, once, from the original-case text.
        let mut display_text = String::with_capacity(raw_reply.len());
        display_text.push_str(&raw_reply[..tag.start]);
        display_text.push_str(&raw_reply[tag.end..]);

        let ignored = strip_remaining(&mut display_text);
        if !ignored.is_empty() {
            tracing::warn!(
                honored = %directive.action_name,
                ignored = ?ignored,
                "Reply contained multiple directives; only the first is honored"
            );
        }

        let name = directive.action_name;
        match self.registry.lookup(&name) {
            Some(target_uri) => {
                tracing::debug!(name = %name, target = %target_uri, "Directive resolved");
                Interpretation {
                    display_text,
                    action: Some(DirectiveAction::Navigate {
                        target_uri: target_uri.to_string(),
                        name,
                    }),
                    ignored,
                }
            }
            None => {
                tracing::info!(name = %name, "Directive names an unknown action");
                Interpretation {
                    display_text: unresolved_reply(&name),
                    action: Some(DirectiveAction::Unresolved { name }),
                    ignored,
                }
            }
        }
    }
}

/// Remove every remaining tag, repeating until none is left, since removing
/// one tag can join its neighbours into a new one.
fn strip_remaining(text: &mut String) -> Vec<String> {
    let mut ignored = Vec::new();
    while contains_directive(text) {
        ignored.extend(
            DIRECTIVE_RE
                .captures_iter(text)
                .map(|caps| normalize_name(&caps[1])),
        );
        let stripped = DIRECTIVE_RE.replace_all(text, "").into_owned();
        *text = stripped;
    }
    ignored
}
