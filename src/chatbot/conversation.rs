//! Bounded conversation history for one chatbot session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Render turns as `role: content` lines, the transcript format used in prompts.
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}\n", turn.role, turn.content))
        .collect()
}

/// Ordered turn log keeping at most `max_history` of the most recent turns.
///
/// Eviction runs after every append, so the bound holds at all times.
#[derive(Debug, Clone)]
pub struct ConversationState {
    id: Uuid,
    started_at: DateTime<Utc>,
    turns: Vec<Turn>,
    max_history: usize,
}

impl ConversationState {
    pub fn new(max_history: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            turns: Vec::new(),
            max_history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.truncate_to_max();
    }

    /// Drop the oldest turns beyond the bound.
    pub fn truncate_to_max(&mut self) {
        let excess = self.turns.len().saturating_sub(self.max_history);
        if excess > 0 {
            self.turns.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Read-only view, oldest first.
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn transcript(&self) -> String {
        render_transcript(&self.turns)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_most_recent_turns() {
        let max = 4;
        let mut state = ConversationState::new(max);
        for i in 0..max + 5 {
            state.append(Turn::user(format!("message {i}")));
        }

        let contents: Vec<_> = state.snapshot().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["message 5", "message 6", "message 7", "message 8"]);
    }

    #[test]
    fn assistant_turns_are_bounded_too() {
        let max = 3;
        let mut state = ConversationState::new(max);
        for i in 0..max + 5 {
            state.append(Turn::assistant(format!("reply {i}")));
        }

        let contents: Vec<_> = state.snapshot().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["reply 5", "reply 6", "reply 7"]);
    }

    #[test]
    fn mixed_turns_never_exceed_the_bound() {
        let mut state = ConversationState::new(3);
        for i in 0..10 {
            if i % 2 == 0 {
                state.append(Turn::user(format!("{i}")));
            } else {
                state.append(Turn::assistant(format!("{i}")));
            }
            assert!(state.len() <= 3);
        }
        let contents: Vec<_> = state.snapshot().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["7", "8", "9"]);
        assert_eq!(state.snapshot()[1].role, TurnRole::User);
    }

    #[test]
    fn explicit_truncate_is_idempotent() {
        let mut state = ConversationState::new(1);
        state.append(Turn::assistant("a"));
        state.append(Turn::assistant("b"));
        state.truncate_to_max();
        assert_eq!(state.snapshot(), &[Turn::assistant("b")]);
    }

    #[test]
    fn zero_bound_keeps_nothing() {
        let mut state = ConversationState::new(0);
        state.append(Turn::user("hello"));
        assert!(state.is_empty());
    }

    #[test]
    fn clear_empties_but_keeps_session() {
        let mut state = ConversationState::new(10);
        let id = state.id();
        state.append(Turn::user("hello"));
        state.append(Turn::assistant("hi there"));
        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.id(), id);
        assert_eq!(state.max_history(), 10);
    }

    #[test]
    fn transcript_format() {
        let mut state = ConversationState::new(10);
        state.append(Turn::user("Where is my order?"));
        state.append(Turn::assistant("It ships tomorrow."));
        assert_eq!(
            state.transcript(),
            "user: Where is my order?\nassistant: It ships tomorrow.\n"
        );
    }

    #[test]
    fn turn_serializes_with_lowercase_role() {
        let json = serde_json::to_value(Turn::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }
}
