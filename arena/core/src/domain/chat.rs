// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Chat Backend Domain Interface (Anti-Corruption Layer)
//
// Abstracts the provider-specific chat-completion APIs behind one trait so
// the arena never depends on a vendor SDK. Implementations live in
// infrastructure/.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::History;

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Sampling parameters forwarded to every backend call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl GenerationParams {
    /// Clamp to the bounds the arena UI exposes.
    pub fn clamped(self) -> Self {
        Self {
            temperature: self.temperature.clamp(0.0, 2.0),
            top_p: self.top_p.clamp(0.0, 1.0),
            max_tokens: self.max_tokens.clamp(16, 4096),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Flatten a lane history into the system + alternating user/assistant
/// message list every backend consumes. Turns with an in-flight reply
/// contribute only their user message.
pub fn conversation_messages(system_prompt: &str, history: &History) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 1);
    messages.push(ChatMessage::system(system_prompt));
    for turn in history.turns() {
        messages.push(ChatMessage::user(&turn.user));
        if let Some(reply) = &turn.reply {
            messages.push(ChatMessage::assistant(reply));
        }
    }
    messages
}

/// Errors that can occur during backend chat operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The provider's own safety filter refused the prompt.
    #[error("prompt blocked by the provider safety filter")]
    PromptBlocked,

    /// The provider's own safety filter cut the response off.
    #[error("response blocked by the provider safety filter")]
    ResponseBlocked,

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("provider error: {0}")]
    Provider(String),
}

/// Incremental deltas from a streaming completion, pulled by the caller.
pub type FragmentStream = BoxStream<'static, Result<String, ChatError>>;

/// Domain interface for chat-completion providers.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Streaming completion: a lazy sequence of incremental text deltas.
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError>;

    /// Non-streaming completion: the full reply in one message.
    async fn complete_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<String, ChatError>;

    /// Check the provider is reachable and credentials are accepted.
    async fn health_check(&self) -> Result<(), ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_clamp_to_ui_bounds() {
        let params = GenerationParams {
            temperature: 5.0,
            top_p: -1.0,
            max_tokens: 1,
        }
        .clamped();
        assert_eq!(params.temperature, 2.0);
        assert_eq!(params.top_p, 0.0);
        assert_eq!(params.max_tokens, 16);
    }

    #[test]
    fn messages_skip_in_flight_reply() {
        let mut history = History::new();
        history.begin_turn("first");
        history.set_last_reply("answer");
        history.begin_turn("second");

        let messages = conversation_messages("sys", &history);
        let roles: Vec<ChatRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User
            ]
        );
        assert_eq!(messages[0].content, "sys");
        assert_eq!(messages[3].content, "second");
    }
}
