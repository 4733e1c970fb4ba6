// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared stub collaborators for the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use arena_core::domain::chat::{
    ChatBackend, ChatError, ChatMessage, FragmentStream, GenerationParams,
};
use arena_core::domain::conversation::History;
use arena_core::domain::moderation::{
    ModeratedRole, ModerationError, ModerationVerdict, Moderator,
};
use arena_core::domain::rails::{PolicyRails, RailsError};
use arena_core::domain::store::{ConversationStore, Rankings, StoreError, Vote};

/// Backend that replays canned fragments / a canned reply and counts calls.
#[derive(Default)]
pub struct StubBackend {
    pub reply: String,
    pub stream_fragments: Vec<Result<String, &'static str>>,
    pub stream_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
}

impl StubBackend {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn with_fragments(fragments: &[&str]) -> Self {
        Self {
            stream_fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
            ..Self::default()
        }
    }
}

fn stub_error(kind: &'static str) -> ChatError {
    match kind {
        "prompt-blocked" => ChatError::PromptBlocked,
        "response-blocked" => ChatError::ResponseBlocked,
        _ => ChatError::Network(kind.to_string()),
    }
}

#[async_trait]
impl ChatBackend for StubBackend {
    async fn stream_chat(
        &self,
        _messages: Vec<ChatMessage>,
        _params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let fragments: Vec<Result<String, ChatError>> = self
            .stream_fragments
            .iter()
            .map(|f| f.clone().map_err(stub_error))
            .collect();
        Ok(futures::stream::iter(fragments).boxed())
    }

    async fn complete_chat(
        &self,
        _messages: Vec<ChatMessage>,
        _params: &GenerationParams,
    ) -> Result<String, ChatError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<(), ChatError> {
        Ok(())
    }
}

/// Backend whose every call fails with the given error kind.
pub struct FailingBackend(pub &'static str);

#[async_trait]
impl ChatBackend for FailingBackend {
    async fn stream_chat(
        &self,
        _messages: Vec<ChatMessage>,
        _params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError> {
        Err(stub_error(self.0))
    }

    async fn complete_chat(
        &self,
        _messages: Vec<ChatMessage>,
        _params: &GenerationParams,
    ) -> Result<String, ChatError> {
        Err(stub_error(self.0))
    }

    async fn health_check(&self) -> Result<(), ChatError> {
        Err(stub_error(self.0))
    }
}

/// Moderator that pops one scripted verdict per call and records the calls.
#[derive(Default)]
pub struct ScriptedModerator {
    pub verdicts: Mutex<VecDeque<bool>>,
    pub calls: Mutex<Vec<(ModeratedRole, String, Option<String>)>>,
    pub fail: bool,
}

impl ScriptedModerator {
    pub fn with_verdicts(verdicts: &[bool]) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Moderator for ScriptedModerator {
    async fn classify(
        &self,
        role: ModeratedRole,
        message: &str,
        prior_query: Option<&str>,
    ) -> Result<ModerationVerdict, ModerationError> {
        self.calls.lock().unwrap().push((
            role,
            message.to_string(),
            prior_query.map(str::to_string),
        ));
        if self.fail {
            return Err(ModerationError::Network("guard endpoint down".into()));
        }
        let safe = self.verdicts.lock().unwrap().pop_front().unwrap_or(true);
        Ok(ModerationVerdict { safe })
    }
}

/// Rails engine returning one canned reply, or failing outright.
pub struct StubRails {
    pub reply: Option<String>,
}

impl StubRails {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl PolicyRails for StubRails {
    async fn generate(&self, _messages: Vec<ChatMessage>) -> Result<String, RailsError> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(RailsError::Network("rails down".into())),
        }
    }
}

/// Store that records every call; `assign_id: None` makes create fail.
pub struct RecordingStore {
    pub assign_id: Option<String>,
    pub creates: Mutex<Vec<(String, [String; 2], String)>>,
    pub updates: Mutex<Vec<String>>,
    pub votes: Mutex<Vec<(String, Option<i32>)>>,
}

impl RecordingStore {
    pub fn assigning(id: &str) -> Self {
        Self {
            assign_id: Some(id.to_string()),
            creates: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            votes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            assign_id: None,
            creates: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            votes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ConversationStore for RecordingStore {
    async fn create(
        &self,
        histories: [&History; 2],
        models: [&str; 2],
        ip: &str,
    ) -> Result<String, StoreError> {
        self.creates.lock().unwrap().push((
            serde_json::to_string(&histories).unwrap(),
            [models[0].to_string(), models[1].to_string()],
            ip.to_string(),
        ));
        self.assign_id
            .clone()
            .ok_or_else(|| StoreError::Network("store down".into()))
    }

    async fn update(&self, id: &str, _histories: [&History; 2]) -> Result<(), StoreError> {
        self.updates.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn record_vote(
        &self,
        id: &str,
        vote: Vote,
        _histories: [&History; 2],
    ) -> Result<(), StoreError> {
        self.votes.lock().unwrap().push((id.to_string(), vote.code()));
        Ok(())
    }

    async fn rankings(&self) -> Result<Rankings, StoreError> {
        Ok(Rankings::default())
    }
}
