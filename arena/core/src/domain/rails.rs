// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;

use crate::domain::chat::ChatMessage;

/// Errors from the rails generation service.
#[derive(Debug, thiserror::Error)]
pub enum RailsError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rails engine error: {0}")]
    Engine(String),
}

/// Domain interface for a rails-configured generation engine.
///
/// The engine receives the whole exchange (system prompt included) and
/// internally decides whether to answer, refuse, or rewrite; the arena only
/// ever sees the single pre-composed final string.
#[async_trait]
pub trait PolicyRails: Send + Sync {
    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String, RailsError>;
}
