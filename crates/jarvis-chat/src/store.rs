//! Conversation transcript and per-session state.
//!
//! The transcript is append-only and lives only in memory; it is lost when
//! the process exits.

use jarvis_core::types::{Timestamp, Turn};
use uuid::Uuid;

use crate::gateway::ModelHandle;

// =============================================================================
// ConversationStore
// =============================================================================

/// Ordered, append-only list of turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

// =============================================================================
// Session
// =============================================================================

/// One interactive session: its transcript plus the cached model choice.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    started_at: Timestamp,
    store: ConversationStore,
    model: Option<ModelHandle>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Timestamp::now(),
            store: ConversationStore::new(),
            model: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn history(&self) -> &[Turn] {
        self.store.history()
    }

    pub fn append(&mut self, turn: Turn) {
        self.store.append(turn);
    }

    /// The model resolved for this session, if any.
    pub fn model(&self) -> Option<&ModelHandle> {
        self.model.as_ref()
    }

    pub fn set_model(&mut self, model: ModelHandle) {
        self.model = Some(model);
    }

    /// Forget the cached model so the next turn probes again.
    pub fn invalidate_model(&mut self) {
        if let Some(model) = self.model.take() {
            tracing::debug!(session = %self.id, model = %model.id, "Model selection invalidated");
        }
    }

    /// Start over: new id, empty transcript. The model cache is kept.
    pub fn clear(&mut self) {
        self.id = Uuid::new_v4();
        self.started_at = Timestamp::now();
        self.store.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
