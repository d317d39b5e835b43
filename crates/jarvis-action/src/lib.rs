//! Command-dispatch protocol for Jarvis.
//!
//! Decodes `[[OPEN:<name>]]` directives embedded in model replies, resolves
//! them against a static deep-link registry, and schedules the navigation.

pub mod dispatch;
pub mod error;
pub mod interpreter;
pub mod registry;
pub mod types;

pub use dispatch::{DeepLinkDispatcher, Navigator};
pub use error::ActionError;
pub use interpreter::{contains_directive, unresolved_reply, CommandInterpreter};
pub use registry::{ActionRegistry, DEFAULT_ACTIONS};
pub use types::{ActionDirective, DirectiveAction, Interpretation, NavigationRequest};
