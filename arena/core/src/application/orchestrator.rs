// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Dual-stream orchestrator.
//
// Two reply streams are driven to exhaustion by a single round-robin loop:
// one advance attempt per lane per pass, one joint snapshot per pass. The
// loop is the only scheduler — lanes suspend inside their own advance and
// nothing else runs, so the session needs no locking and the UI can never
// observe a half-applied pass.
//
// There is deliberately no timeout here: a hung backend stalls its lane's
// poll. Callers that need deadlines wrap the snapshot pull externally and
// treat expiry as exhaustion.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::application::adapter::ReplyStream;
use crate::domain::conversation::{ConversationSession, RoundSnapshot};
use crate::domain::store::ConversationStore;

/// Where the round's requester connected from. The store records an IP per
/// conversation; a forwarding proxy's header wins over the socket peer.
#[derive(Debug, Clone)]
pub struct ClientOrigin {
    pub forwarded_ip: Option<String>,
    pub peer_ip: String,
}

impl ClientOrigin {
    pub fn ip(&self) -> &str {
        self.forwarded_ip.as_deref().unwrap_or(&self.peer_ip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneState {
    Active,
    Exhausted,
}

struct Lane {
    stream: ReplyStream,
    buffer: String,
    state: LaneState,
}

impl Lane {
    fn new(stream: ReplyStream) -> Self {
        Self {
            stream,
            buffer: String::new(),
            state: LaneState::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Streaming,
    Done,
}

/// Drives one generation cycle of a round: both lanes to exhaustion, then a
/// single persistence call, emitting snapshots along the way.
///
/// The orchestrator owns the session for the duration of the cycle; callers
/// get it back with `into_session` once the snapshot stream runs dry.
pub struct DualStreamOrchestrator {
    session: ConversationSession,
    lanes: [Lane; 2],
    store: Arc<dyn ConversationStore>,
    origin: ClientOrigin,
    phase: Phase,
}

impl DualStreamOrchestrator {
    pub fn new(
        session: ConversationSession,
        lane_streams: [ReplyStream; 2],
        store: Arc<dyn ConversationStore>,
        origin: ClientOrigin,
    ) -> Self {
        let [stream_a, stream_b] = lane_streams;
        Self {
            session,
            lanes: [Lane::new(stream_a), Lane::new(stream_b)],
            store,
            origin,
            phase: Phase::Streaming,
        }
    }

    /// One round-robin pass over both lanes. Returns a joint snapshot while
    /// the round is live; `None` once the round is complete and persisted.
    ///
    /// A pass that only discovers exhaustion (no fragment arrived and no
    /// lane is left active) emits nothing and falls through to finalize, so
    /// finite lanes of `a` and `b` fragments produce exactly `max(a, b)`
    /// snapshots — plus at most one more carrying a freshly assigned
    /// conversation id.
    pub async fn next_snapshot(&mut self) -> Option<RoundSnapshot> {
        if self.phase == Phase::Done {
            return None;
        }
        if self.all_exhausted() {
            return self.finalize().await;
        }

        let mut progressed = false;
        for index in 0..self.lanes.len() {
            if self.lanes[index].state == LaneState::Exhausted {
                continue;
            }
            match self.lanes[index].stream.next().await {
                Some(fragment) => {
                    progressed = true;
                    if !fragment.is_empty() {
                        self.lanes[index].buffer.push_str(&fragment);
                        let buffer = self.lanes[index].buffer.clone();
                        self.history_mut(index).set_last_reply(buffer);
                    }
                }
                None => {
                    debug!(lane = index, "lane exhausted");
                    self.lanes[index].state = LaneState::Exhausted;
                }
            }
        }

        if progressed || !self.all_exhausted() {
            return Some(self.session.snapshot());
        }
        self.finalize().await
    }

    fn history_mut(&mut self, lane: usize) -> &mut crate::domain::conversation::History {
        if lane == 0 {
            &mut self.session.history_a
        } else {
            &mut self.session.history_b
        }
    }

    fn all_exhausted(&self) -> bool {
        self.lanes.iter().all(|l| l.state == LaneState::Exhausted)
    }

    /// Persist the finished round exactly once. Store failures are logged
    /// and swallowed — a lost record must never break the round. When the
    /// store assigns a fresh conversation id, one extra snapshot carrying
    /// it is emitted so votes can be attached later.
    async fn finalize(&mut self) -> Option<RoundSnapshot> {
        self.phase = Phase::Done;
        let histories = [&self.session.history_a, &self.session.history_b];

        match &self.session.conversation_id {
            Some(id) => {
                if let Err(e) = self.store.update(id, histories).await {
                    warn!(conversation = %id, error = %e, "turn persist failed");
                }
                None
            }
            None => {
                let (name_a, name_b) = self.session.display_names();
                match self
                    .store
                    .create(histories, [name_a, name_b], self.origin.ip())
                    .await
                {
                    Ok(id) => {
                        self.session.conversation_id = Some(id);
                        Some(self.session.snapshot())
                    }
                    Err(e) => {
                        warn!(error = %e, "conversation create failed");
                        None
                    }
                }
            }
        }
    }

    /// Hand the (possibly id-bearing) session back after the cycle.
    pub fn into_session(self) -> ConversationSession {
        self.session
    }
}
