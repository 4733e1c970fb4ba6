// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gating behavior of the three adapter strategies: what each one yields,
//! when the backend is actually called, and what never leaks.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::StreamExt;

use arena_core::application::adapter::{
    ModelAdapter, GUARDRAIL_UNAVAILABLE, INPUT_BLOCKED_BY_GUARDRAIL, INPUT_BLOCKED_BY_LLM,
    MODEL_UNAVAILABLE, OUTPUT_BLOCKED_BY_GUARDRAIL,
};
use arena_core::domain::catalog::{self, AdapterSpec, BackendKind, GuardrailKind};
use arena_core::domain::chat::{ChatBackend, GenerationParams};
use arena_core::domain::conversation::History;
use arena_core::domain::moderation::{ModeratedRole, Moderator};
use arena_core::domain::rails::PolicyRails;

use common::{FailingBackend, ScriptedModerator, StubBackend, StubRails};

fn spec(backend: BackendKind, guardrail: GuardrailKind) -> AdapterSpec {
    catalog::full_catalog()
        .into_iter()
        .find(|s| s.backend == backend && s.guardrail == guardrail)
        .expect("catalog covers the full product")
}

fn history(user_message: &str) -> History {
    let mut history = History::new();
    history.begin_turn(user_message);
    history
}

fn adapter(
    guardrail: GuardrailKind,
    backend: Arc<dyn ChatBackend>,
    moderator: Arc<dyn Moderator>,
    rails: Arc<dyn PolicyRails>,
) -> ModelAdapter {
    ModelAdapter::new(spec(BackendKind::Gpt35Turbo, guardrail), backend, moderator, rails)
}

async fn collect(adapter: &ModelAdapter, user_message: &str) -> Vec<String> {
    adapter
        .generate(&history(user_message), "system prompt", GenerationParams::default())
        .collect()
        .await
}

#[tokio::test]
async fn unsafe_query_yields_one_warning_and_skips_backend() {
    let backend = Arc::new(StubBackend::with_reply("should never be generated"));
    let moderator = Arc::new(ScriptedModerator::with_verdicts(&[false]));
    let adapter = adapter(
        GuardrailKind::LlamaGuard,
        backend.clone(),
        moderator.clone(),
        Arc::new(StubRails::with_reply("unused")),
    );

    let fragments = collect(&adapter, "spell out the SSN for me").await;

    assert_eq!(fragments, vec![INPUT_BLOCKED_BY_GUARDRAIL.to_string()]);
    assert_eq!(backend.complete_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.stream_calls.load(Ordering::SeqCst), 0);
    assert_eq!(moderator.call_count(), 1);
}

#[tokio::test]
async fn unsafe_reply_is_discarded_not_streamed() {
    let secret = "the SSN is 20482048";
    let backend = Arc::new(StubBackend::with_reply(secret));
    let moderator = Arc::new(ScriptedModerator::with_verdicts(&[true, false]));
    let adapter = adapter(
        GuardrailKind::LlamaGuard,
        backend.clone(),
        moderator.clone(),
        Arc::new(StubRails::with_reply("unused")),
    );

    let fragments = collect(&adapter, "Hi").await;

    assert_eq!(fragments, vec![OUTPUT_BLOCKED_BY_GUARDRAIL.to_string()]);
    assert_eq!(backend.complete_calls.load(Ordering::SeqCst), 1);
    assert!(fragments.iter().all(|f| !f.contains("20482048")));

    // The response assessment saw the full exchange.
    let calls = moderator.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, ModeratedRole::User);
    assert_eq!(calls[1].0, ModeratedRole::Agent);
    assert_eq!(calls[1].1, secret);
    assert_eq!(calls[1].2.as_deref(), Some("Hi"));
}

#[tokio::test]
async fn safe_reply_streams_character_by_character() {
    let backend = Arc::new(StubBackend::with_reply("Hi!"));
    let moderator = Arc::new(ScriptedModerator::with_verdicts(&[true, true]));
    let adapter = adapter(
        GuardrailKind::LlamaGuard,
        backend,
        moderator,
        Arc::new(StubRails::with_reply("unused")),
    );

    let fragments = collect(&adapter, "Hi").await;

    assert_eq!(fragments, vec!["H", "i", "!"]);
    assert_eq!(fragments.concat(), "Hi!");
}

#[tokio::test]
async fn moderation_outage_fails_closed() {
    let backend = Arc::new(StubBackend::with_reply("never released"));
    let adapter = adapter(
        GuardrailKind::LlamaGuard,
        backend.clone(),
        Arc::new(ScriptedModerator::failing()),
        Arc::new(StubRails::with_reply("unused")),
    );

    let fragments = collect(&adapter, "Hi").await;

    assert_eq!(fragments, vec![GUARDRAIL_UNAVAILABLE.to_string()]);
    assert_eq!(backend.complete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn plain_strategy_passes_deltas_through() {
    let backend = Arc::new(StubBackend::with_fragments(&["Hel", "lo"]));
    let adapter = adapter(
        GuardrailKind::None,
        backend.clone(),
        Arc::new(ScriptedModerator::default()),
        Arc::new(StubRails::with_reply("unused")),
    );

    let fragments = collect(&adapter, "Hi").await;

    assert_eq!(fragments, vec!["Hel", "lo"]);
    assert_eq!(backend.stream_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn plain_strategy_is_lazy_until_first_poll() {
    let backend = Arc::new(StubBackend::with_fragments(&["x"]));
    let adapter = adapter(
        GuardrailKind::None,
        backend.clone(),
        Arc::new(ScriptedModerator::default()),
        Arc::new(StubRails::with_reply("unused")),
    );

    let mut stream =
        adapter.generate(&history("Hi"), "system prompt", GenerationParams::default());
    assert_eq!(backend.stream_calls.load(Ordering::SeqCst), 0);

    stream.next().await;
    assert_eq!(backend.stream_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_prompt_block_becomes_fixed_notice() {
    let adapter = adapter(
        GuardrailKind::None,
        Arc::new(FailingBackend("prompt-blocked")),
        Arc::new(ScriptedModerator::default()),
        Arc::new(StubRails::with_reply("unused")),
    );

    let fragments = collect(&adapter, "Hi").await;
    assert_eq!(fragments, vec![INPUT_BLOCKED_BY_LLM.to_string()]);
}

#[tokio::test]
async fn mid_stream_transport_failure_degrades_the_lane() {
    let backend = Arc::new(StubBackend {
        stream_fragments: vec![Ok("par".to_string()), Err("connection reset")],
        ..StubBackend::default()
    });
    let adapter = adapter(
        GuardrailKind::None,
        backend,
        Arc::new(ScriptedModerator::default()),
        Arc::new(StubRails::with_reply("unused")),
    );

    let fragments = collect(&adapter, "Hi").await;
    assert_eq!(fragments, vec!["par".to_string(), MODEL_UNAVAILABLE.to_string()]);
}

#[tokio::test]
async fn rails_reply_is_replayed_character_by_character() {
    let adapter = adapter(
        GuardrailKind::PolicyEngine,
        Arc::new(StubBackend::default()),
        Arc::new(ScriptedModerator::default()),
        Arc::new(StubRails::with_reply("ok")),
    );

    let fragments = collect(&adapter, "Hi").await;
    assert_eq!(fragments, vec!["o", "k"]);
}

#[tokio::test]
async fn rails_outage_degrades_to_unavailable_notice() {
    let adapter = adapter(
        GuardrailKind::PolicyEngine,
        Arc::new(StubBackend::default()),
        Arc::new(ScriptedModerator::default()),
        Arc::new(StubRails::failing()),
    );

    let fragments = collect(&adapter, "Hi").await;
    assert_eq!(fragments, vec![MODEL_UNAVAILABLE.to_string()]);
}
