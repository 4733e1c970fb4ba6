// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Moderation Domain Interface
//
// One classifier call per gated message. The guard model answers with a
// free-text completion whose first line carries the verdict; everything
// that is not exactly "safe" is treated as unsafe, including malformed
// output.

use async_trait::async_trait;

/// Which side of the conversation is being assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeratedRole {
    User,
    Agent,
}

impl ModeratedRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeratedRole::User => "User",
            ModeratedRole::Agent => "Agent",
        }
    }
}

/// Safe/unsafe outcome for one message or message pair. Ephemeral, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub safe: bool,
}

impl ModerationVerdict {
    /// Parse a guard-model completion. Safe iff the first line, trimmed,
    /// is the literal "safe".
    pub fn from_completion(completion: &str) -> Self {
        let first_line = completion.lines().next().map(str::trim);
        Self {
            safe: first_line == Some("safe"),
        }
    }
}

/// Errors from the moderation endpoint. Callers decide policy; nothing is
/// swallowed at this layer.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("moderation endpoint error: {0}")]
    Endpoint(String),
}

/// Domain interface for the safety classifier.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Classify `message` for the given role. For `Agent` assessments the
    /// `prior_query` carries the user message the reply answers, so the
    /// classifier sees the full exchange.
    async fn classify(
        &self,
        role: ModeratedRole,
        message: &str,
        prior_query: Option<&str>,
    ) -> Result<ModerationVerdict, ModerationError>;
}
