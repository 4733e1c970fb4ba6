// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Arena round lifecycle service.
//
// Owns the live rounds. A round's session is removed from the registry for
// the duration of a generation cycle — the orchestrator holds it
// exclusively — and is reinserted when the snapshot stream completes. The
// HTTP layer only ever sees snapshot values.

use std::sync::Arc;

use async_stream::stream;
use dashmap::DashMap;
use futures::Stream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::adapter::AdapterFactory;
use crate::application::orchestrator::{ClientOrigin, DualStreamOrchestrator};
use crate::domain::catalog::{self, AdapterSpec};
use crate::domain::chat::GenerationParams;
use crate::domain::conversation::{ConversationSession, RoundSnapshot};
use crate::domain::store::{leaderboard_rows, ConversationStore, LeaderboardRow, Vote};

pub type RoundId = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown round {0}")]
    UnknownRound(RoundId),

    #[error("round {0} has no turn to regenerate")]
    NothingToRegenerate(RoundId),
}

pub struct ArenaService {
    catalog: Vec<AdapterSpec>,
    adapters: AdapterFactory,
    store: Arc<dyn ConversationStore>,
    rounds: Arc<DashMap<RoundId, ConversationSession>>,
}

impl ArenaService {
    pub fn new(adapters: AdapterFactory, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            catalog: catalog::full_catalog(),
            adapters,
            store,
            rounds: Arc::new(DashMap::new()),
        }
    }

    /// Start a fresh round: a random anonymized pairing and a random
    /// planted system prompt. Any previous round of the caller is simply
    /// abandoned; the registry holds each round independently.
    pub fn new_round(&self) -> RoundId {
        let mut rng = rand::rng();
        let pairing = catalog::choose_model_pair(&self.catalog, &mut rng);
        let system_prompt = catalog::random_system_prompt(&mut rng);
        let id = Uuid::new_v4();
        info!(round = %id, left = %pairing.0.display_name, right = %pairing.1.display_name, "round started");
        self.rounds
            .insert(id, ConversationSession::new(pairing, system_prompt));
        id
    }

    /// Submit a user message and stream joint snapshots until both lanes
    /// finish and the round is persisted.
    pub fn send_message(
        &self,
        round: RoundId,
        user_message: String,
        params: GenerationParams,
        origin: ClientOrigin,
    ) -> Result<impl Stream<Item = RoundSnapshot> + Send + 'static, ServiceError> {
        let (_, mut session) = self
            .rounds
            .remove(&round)
            .ok_or(ServiceError::UnknownRound(round))?;
        session.begin_turn(&user_message);
        Ok(self.drive(round, session, params, origin))
    }

    /// Discard the last exchange and replay its user message against fresh
    /// adapters. Prior replies are dropped, not kept as alternates.
    pub fn regenerate(
        &self,
        round: RoundId,
        params: GenerationParams,
        origin: ClientOrigin,
    ) -> Result<impl Stream<Item = RoundSnapshot> + Send + 'static, ServiceError> {
        let (_, mut session) = self
            .rounds
            .remove(&round)
            .ok_or(ServiceError::UnknownRound(round))?;
        let Some(user_message) = session.rewind_last_turn() else {
            self.rounds.insert(round, session);
            return Err(ServiceError::NothingToRegenerate(round));
        };
        session.begin_turn(&user_message);
        Ok(self.drive(round, session, params, origin))
    }

    fn drive(
        &self,
        round: RoundId,
        session: ConversationSession,
        params: GenerationParams,
        origin: ClientOrigin,
    ) -> impl Stream<Item = RoundSnapshot> + Send + 'static {
        let params = params.clamped();
        let lane_a = self
            .adapters
            .adapter(&session.pairing.0)
            .generate(&session.history_a, &session.system_prompt, params);
        let lane_b = self
            .adapters
            .adapter(&session.pairing.1)
            .generate(&session.history_b, &session.system_prompt, params);

        let mut orchestrator =
            DualStreamOrchestrator::new(session, [lane_a, lane_b], Arc::clone(&self.store), origin);
        let rounds = Arc::clone(&self.rounds);

        stream! {
            while let Some(snapshot) = orchestrator.next_snapshot().await {
                yield snapshot;
            }
            rounds.insert(round, orchestrator.into_session());
        }
    }

    /// Record a vote and reveal the pairing. Vote loss is non-fatal: a
    /// missing conversation id or a store failure degrades to a no-op.
    pub async fn vote(&self, round: RoundId, vote: Vote) -> Result<(String, String), ServiceError> {
        // Copy what the store call needs before awaiting; the registry
        // guard must not be held across suspension points.
        let (conversation_id, history_a, history_b, names) = {
            let session = self
                .rounds
                .get(&round)
                .ok_or(ServiceError::UnknownRound(round))?;
            let (left, right) = session.display_names();
            (
                session.conversation_id.clone(),
                session.history_a.clone(),
                session.history_b.clone(),
                (left.to_string(), right.to_string()),
            )
        };

        match conversation_id {
            Some(id) => {
                let histories = [&history_a, &history_b];
                if let Err(e) = self.store.record_vote(&id, vote, histories).await {
                    warn!(round = %round, error = %e, "vote persist failed");
                }
            }
            None => {
                warn!(round = %round, "vote before any persisted turn, dropping");
            }
        }

        Ok(names)
    }

    /// Display names of the full catalog, for the model list accordion.
    pub fn model_names(&self) -> Vec<String> {
        self.catalog
            .iter()
            .map(|spec| spec.display_name.clone())
            .collect()
    }

    /// Canned adversarial example inputs.
    pub fn example_prompts(&self) -> Vec<String> {
        catalog::EXAMPLE_PROMPTS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Current leaderboard; an unreachable ranking service renders empty.
    pub async fn leaderboard(&self) -> Vec<LeaderboardRow> {
        match self.store.rankings().await {
            Ok(rankings) => leaderboard_rows(&rankings),
            Err(e) => {
                warn!(error = %e, "rankings fetch failed");
                Vec::new()
            }
        }
    }
}
