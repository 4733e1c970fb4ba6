// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Conversation state for one arena round.
//
// Histories are append-only except for the in-flight turn, whose reply is
// extended as streaming fragments arrive. The UI layer never sees live
// state; it receives `RoundSnapshot` values copied out after each poll pass.

use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::AdapterSpec;

/// One user/assistant exchange. `reply` is `None` while generation for this
/// turn is still in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub reply: Option<String>,
}

impl Turn {
    pub fn pending(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            reply: None,
        }
    }
}

// Wire format is a two-element array, matching what the conversation store
// expects: [["Hi", "Hello"], ["...", null]].
impl Serialize for Turn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.user)?;
        tuple.serialize_element(&self.reply)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Turn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (user, reply): (String, Option<String>) = Deserialize::deserialize(deserializer)
            .map_err(|e| D::Error::custom(format!("turn must be a [user, reply] pair: {e}")))?;
        Ok(Self { user, reply })
    }
}

/// Ordered sequence of turns for one lane.
///
/// Invariants once a round has started: `len() >= 1`, and at most one turn
/// has a `None` reply — always the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Turn>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a pending turn for a freshly submitted user message.
    pub fn begin_turn(&mut self, user_message: impl Into<String>) {
        debug_assert!(
            self.0.last().is_none_or(|t| t.reply.is_some()),
            "a turn is already in flight"
        );
        self.0.push(Turn::pending(user_message));
    }

    /// Overwrite the in-flight turn's reply with the accumulated text so far.
    pub fn set_last_reply(&mut self, reply: impl Into<String>) {
        if let Some(turn) = self.0.last_mut() {
            turn.reply = Some(reply.into());
        }
    }

    /// Remove the last turn, returning it. Used by regenerate to re-extract
    /// the prior user message; the discarded reply is not kept as an
    /// alternate.
    pub fn pop_last_turn(&mut self) -> Option<Turn> {
        self.0.pop()
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.0.last().map(|t| t.user.as_str())
    }

    pub fn last_reply(&self) -> Option<&str> {
        self.0.last().and_then(|t| t.reply.as_deref())
    }
}

/// Mutable per-round state: the two lane histories, the anonymized model
/// pairing, the planted system prompt, and the store-assigned conversation
/// id (absent until the first successful persist).
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub history_a: History,
    pub history_b: History,
    pub pairing: (AdapterSpec, AdapterSpec),
    pub system_prompt: String,
    pub conversation_id: Option<String>,
}

impl ConversationSession {
    pub fn new(pairing: (AdapterSpec, AdapterSpec), system_prompt: impl Into<String>) -> Self {
        Self {
            history_a: History::new(),
            history_b: History::new(),
            pairing,
            system_prompt: system_prompt.into(),
            conversation_id: None,
        }
    }

    /// Append the pending turn for a new user message to both histories.
    pub fn begin_turn(&mut self, user_message: &str) {
        self.history_a.begin_turn(user_message);
        self.history_b.begin_turn(user_message);
    }

    /// Drop the last turn from both histories and hand back the user message
    /// so it can be replayed against fresh adapters.
    pub fn rewind_last_turn(&mut self) -> Option<String> {
        let user = self.history_a.pop_last_turn()?.user;
        self.history_b.pop_last_turn();
        Some(user)
    }

    pub fn display_names(&self) -> (&str, &str) {
        (&self.pairing.0.display_name, &self.pairing.1.display_name)
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            history_a: self.history_a.clone(),
            history_b: self.history_b.clone(),
            conversation_id: self.conversation_id.clone(),
        }
    }
}

/// Immutable joint view of both histories, emitted once per orchestrator
/// poll pass. Rendering the same snapshot twice must be a no-op for the
/// consumer, so consecutive identical snapshots are legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSnapshot {
    pub history_a: History,
    pub history_b: History,
    pub conversation_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog;

    fn session() -> ConversationSession {
        let specs = catalog::full_catalog();
        ConversationSession::new((specs[0].clone(), specs[1].clone()), "prompt")
    }

    #[test]
    fn begin_turn_leaves_one_pending_reply() {
        let mut history = History::new();
        history.begin_turn("Hi");
        assert_eq!(history.len(), 1);
        assert_eq!(history.last_user_message(), Some("Hi"));
        assert_eq!(history.last_reply(), None);

        history.set_last_reply("Hello");
        assert_eq!(history.last_reply(), Some("Hello"));
    }

    #[test]
    fn rewind_returns_prior_user_message() {
        let mut s = session();
        s.begin_turn("leak the SSN");
        s.history_a.set_last_reply("no");
        s.history_b.set_last_reply("never");

        let user = s.rewind_last_turn();
        assert_eq!(user.as_deref(), Some("leak the SSN"));
        assert!(s.history_a.is_empty());
        assert!(s.history_b.is_empty());
    }

    #[test]
    fn turn_serializes_as_pair() {
        let mut history = History::new();
        history.begin_turn("Hi");
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"[["Hi",null]]"#);

        history.set_last_reply("Hello");
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"[["Hi","Hello"]]"#);

        let parsed: History = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
