// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Model adapters: one lazy reply stream per (backend, guardrail) pairing.
//
// Every strategy yields plain text fragments; blocked or failed generations
// surface as a single fixed warning fragment so a lane can never take the
// round down with it. Nothing touches the network until the first poll.

use std::sync::Arc;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::warn;

use crate::domain::catalog::{AdapterSpec, BackendKind, GuardrailKind};
use crate::domain::chat::{conversation_messages, ChatBackend, ChatError, ChatMessage, GenerationParams};
use crate::domain::conversation::History;
use crate::domain::moderation::{ModeratedRole, Moderator};
use crate::domain::rails::PolicyRails;

/// A lane's reply: a finite, non-restartable, pull-driven fragment sequence.
pub type ReplyStream = BoxStream<'static, String>;

pub const INPUT_BLOCKED_BY_LLM: &str =
    "⚠️ I'm sorry, I cannot respond to that. (The input was blocked by the LLM)";
pub const OUTPUT_BLOCKED_BY_LLM: &str =
    "⚠️ I'm sorry, I cannot respond to that. (The output was blocked by the LLM)";
pub const INPUT_BLOCKED_BY_GUARDRAIL: &str =
    "⚠️ I'm sorry, I cannot respond to that. (The input was blocked by the guardrail)";
pub const OUTPUT_BLOCKED_BY_GUARDRAIL: &str =
    "⚠️ I'm sorry, I cannot respond to that. (The output was blocked by the guardrail)";
pub const MODEL_UNAVAILABLE: &str =
    "⚠️ I'm sorry, I cannot respond to that. (The model is currently unavailable)";
pub const GUARDRAIL_UNAVAILABLE: &str =
    "⚠️ I'm sorry, I cannot respond to that. (The guardrail is currently unavailable)";

/// A catalog entry bound to live clients, ready to open reply streams.
pub struct ModelAdapter {
    spec: AdapterSpec,
    backend: Arc<dyn ChatBackend>,
    moderator: Arc<dyn Moderator>,
    rails: Arc<dyn PolicyRails>,
}

impl ModelAdapter {
    pub fn new(
        spec: AdapterSpec,
        backend: Arc<dyn ChatBackend>,
        moderator: Arc<dyn Moderator>,
        rails: Arc<dyn PolicyRails>,
    ) -> Self {
        Self {
            spec,
            backend,
            moderator,
            rails,
        }
    }

    pub fn spec(&self) -> &AdapterSpec {
        &self.spec
    }

    /// Open the lane's reply stream for the current in-flight turn.
    ///
    /// Precondition: `history` ends in a turn with no reply yet.
    pub fn generate(
        &self,
        history: &History,
        system_prompt: &str,
        params: GenerationParams,
    ) -> ReplyStream {
        debug_assert!(
            history.last_reply().is_none() && !history.is_empty(),
            "generate called without an in-flight turn"
        );
        let messages = conversation_messages(system_prompt, history);
        let query = history.last_user_message().unwrap_or_default().to_string();

        match self.spec.guardrail {
            GuardrailKind::None => plain_stream(Arc::clone(&self.backend), messages, params),
            GuardrailKind::LlamaGuard => guarded_stream(
                Arc::clone(&self.backend),
                Arc::clone(&self.moderator),
                messages,
                query,
                params,
            ),
            GuardrailKind::PolicyEngine => rails_stream(Arc::clone(&self.rails), messages),
        }
    }
}

/// Raw strategy: stream backend deltas straight through. Provider safety
/// blocks become a single fixed fragment; any other failure degrades the
/// lane to the unavailable notice instead of tearing the round down.
fn plain_stream(
    backend: Arc<dyn ChatBackend>,
    messages: Vec<ChatMessage>,
    params: GenerationParams,
) -> ReplyStream {
    Box::pin(stream! {
        let mut deltas = match backend.stream_chat(messages, &params).await {
            Ok(deltas) => deltas,
            Err(e) => {
                yield blocked_fragment(&e).to_string();
                return;
            }
        };
        while let Some(delta) = deltas.next().await {
            match delta {
                Ok(fragment) => yield fragment,
                Err(e) => {
                    yield blocked_fragment(&e).to_string();
                    return;
                }
            }
        }
    })
}

/// Guard-gated strategy: classify the query, generate without streaming,
/// classify the exchange, then release character by character. Incremental
/// streaming is given up here because the full reply must pass moderation
/// before any of it reaches the user.
fn guarded_stream(
    backend: Arc<dyn ChatBackend>,
    moderator: Arc<dyn Moderator>,
    messages: Vec<ChatMessage>,
    query: String,
    params: GenerationParams,
) -> ReplyStream {
    Box::pin(stream! {
        match moderator.classify(ModeratedRole::User, &query, None).await {
            Ok(verdict) if !verdict.safe => {
                yield INPUT_BLOCKED_BY_GUARDRAIL.to_string();
                return;
            }
            Ok(_) => {}
            Err(e) => {
                // Fail closed: an unreachable classifier must not let
                // content through unmoderated.
                warn!(error = %e, "query moderation unavailable");
                yield GUARDRAIL_UNAVAILABLE.to_string();
                return;
            }
        }

        let reply = match backend.complete_chat(messages, &params).await {
            Ok(reply) => reply,
            Err(e) => {
                yield blocked_fragment(&e).to_string();
                return;
            }
        };

        match moderator.classify(ModeratedRole::Agent, &reply, Some(&query)).await {
            Ok(verdict) if !verdict.safe => {
                yield OUTPUT_BLOCKED_BY_GUARDRAIL.to_string();
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "response moderation unavailable");
                yield GUARDRAIL_UNAVAILABLE.to_string();
                return;
            }
        }

        for ch in reply.chars() {
            yield ch.to_string();
        }
    })
}

/// Rails strategy: the engine returns one pre-composed final string, which
/// is replayed character by character.
fn rails_stream(rails: Arc<dyn PolicyRails>, messages: Vec<ChatMessage>) -> ReplyStream {
    Box::pin(stream! {
        let text = match rails.generate(messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "rails generation failed");
                yield MODEL_UNAVAILABLE.to_string();
                return;
            }
        };
        for ch in text.chars() {
            yield ch.to_string();
        }
    })
}

fn blocked_fragment(error: &ChatError) -> &'static str {
    match error {
        ChatError::PromptBlocked => INPUT_BLOCKED_BY_LLM,
        ChatError::ResponseBlocked => OUTPUT_BLOCKED_BY_LLM,
        other => {
            warn!(error = %other, "backend call failed, degrading lane");
            MODEL_UNAVAILABLE
        }
    }
}

/// One live client per backend kind; resolution is total by construction.
pub struct BackendSet {
    pub gpt35_turbo: Arc<dyn ChatBackend>,
    pub llama70b: Arc<dyn ChatBackend>,
    pub mixtral8x7b: Arc<dyn ChatBackend>,
    pub gemini_pro: Arc<dyn ChatBackend>,
}

impl BackendSet {
    pub fn resolve(&self, kind: BackendKind) -> &Arc<dyn ChatBackend> {
        match kind {
            BackendKind::Gpt35Turbo => &self.gpt35_turbo,
            BackendKind::Llama70b => &self.llama70b,
            BackendKind::Mixtral8x7b => &self.mixtral8x7b,
            BackendKind::GeminiPro => &self.gemini_pro,
        }
    }
}

/// Resolves catalog entries to adapters over the shared live clients.
pub struct AdapterFactory {
    backends: BackendSet,
    moderator: Arc<dyn Moderator>,
    rails: Arc<dyn PolicyRails>,
}

impl AdapterFactory {
    pub fn new(backends: BackendSet, moderator: Arc<dyn Moderator>, rails: Arc<dyn PolicyRails>) -> Self {
        Self {
            backends,
            moderator,
            rails,
        }
    }

    pub fn adapter(&self, spec: &AdapterSpec) -> ModelAdapter {
        ModelAdapter::new(
            spec.clone(),
            Arc::clone(self.backends.resolve(spec.backend)),
            Arc::clone(&self.moderator),
            Arc::clone(&self.rails),
        )
    }
}
