// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Conversation store port.
//
// The store is a remote REST service that owns all persistence: it assigns
// conversation ids, accumulates turn updates, records votes, and computes
// the ELO-style ratings consumed by the leaderboard. Failures here must
// never interrupt a round; callers log and move on.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::History;

/// The four vote kinds, with the numeric codes the store expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vote {
    Left,
    Right,
    Tie,
    BothBad,
}

impl Vote {
    /// Store wire code: 0, 1, -1, or null.
    pub fn code(&self) -> Option<i32> {
        match self {
            Vote::Left => Some(0),
            Vote::Right => Some(1),
            Vote::Tie => Some(-1),
            Vote::BothBad => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("store endpoint error: {0}")]
    Endpoint(String),
}

/// Ratings payload from `GET /rankings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rankings {
    pub ratings: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub name: String,
    pub rating: i64,
}

/// Sort ratings descending and assign competition-style ranks: entries with
/// the same rounded rating share a rank, and the next distinct rating skips
/// past the tie block.
pub fn leaderboard_rows(rankings: &Rankings) -> Vec<LeaderboardRow> {
    let mut rows: Vec<(String, i64)> = rankings
        .ratings
        .iter()
        .map(|(name, rating)| (name.clone(), rating.round() as i64))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    rows.iter()
        .enumerate()
        .map(|(i, (name, rating))| LeaderboardRow {
            rank: 1 + rows[..i].iter().filter(|(_, r)| r > rating).count(),
            name: name.clone(),
            rating: *rating,
        })
        .collect()
}

/// Domain interface for the external conversation store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Register a new conversation; returns the store-assigned id.
    async fn create(
        &self,
        histories: [&History; 2],
        models: [&str; 2],
        ip: &str,
    ) -> Result<String, StoreError>;

    /// Replace the stored histories for an existing conversation.
    async fn update(&self, id: &str, histories: [&History; 2]) -> Result<(), StoreError>;

    /// Attach a vote to an existing conversation.
    async fn record_vote(
        &self,
        id: &str,
        vote: Vote,
        histories: [&History; 2],
    ) -> Result<(), StoreError>;

    /// Fetch current ratings for the leaderboard.
    async fn rankings(&self) -> Result<Rankings, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_codes_match_store_contract() {
        assert_eq!(Vote::Left.code(), Some(0));
        assert_eq!(Vote::Right.code(), Some(1));
        assert_eq!(Vote::Tie.code(), Some(-1));
        assert_eq!(Vote::BothBad.code(), None);
    }

    #[test]
    fn leaderboard_ties_share_rank_and_skip() {
        let mut ratings = HashMap::new();
        ratings.insert("a".to_string(), 1200.4);
        ratings.insert("b".to_string(), 1200.1);
        ratings.insert("c".to_string(), 1100.0);
        ratings.insert("d".to_string(), 1300.0);

        let rows = leaderboard_rows(&Rankings { ratings });
        let got: Vec<(usize, &str, i64)> = rows
            .iter()
            .map(|r| (r.rank, r.name.as_str(), r.rating))
            .collect();
        assert_eq!(
            got,
            vec![(1, "d", 1300), (2, "a", 1200), (2, "b", 1200), (4, "c", 1100)]
        );
    }

    #[test]
    fn empty_rankings_render_empty() {
        assert!(leaderboard_rows(&Rankings::default()).is_empty());
    }
}
