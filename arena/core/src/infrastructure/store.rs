// Conversation Store Client
//
// REST client for the external conversation store. The store assigns ids
// (201 + `_id` on create), accepts full-history updates and votes, and
// serves the ratings behind the leaderboard.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::History;
use crate::domain::store::{ConversationStore, Rankings, StoreError, Vote};

pub struct HttpConversationStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    conversations: [&'a History; 2],
    models: [&'a str; 2],
    ip: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    conversations: [&'a History; 2],
}

#[derive(Serialize)]
struct VoteRequest<'a> {
    // `None` must reach the wire as an explicit null (the both-bad code),
    // so no skip_serializing_if here.
    vote: Option<i32>,
    conversations: [&'a History; 2],
}

impl HttpConversationStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ConversationStore for HttpConversationStore {
    async fn create(
        &self,
        histories: [&History; 2],
        models: [&str; 2],
        ip: &str,
    ) -> Result<String, StoreError> {
        let request = CreateRequest {
            conversations: histories,
            models,
            ip,
        };

        let response = self
            .client
            .post(self.url(""))
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        // Only a 201 carries a usable id.
        if response.status() != reqwest::StatusCode::CREATED {
            return Err(StoreError::Endpoint(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Endpoint(format!("failed to parse response: {e}")))?;
        Ok(created.id)
    }

    async fn update(&self, id: &str, histories: [&History; 2]) -> Result<(), StoreError> {
        let request = UpdateRequest {
            conversations: histories,
        };

        let response = self
            .client
            .put(self.url(id))
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Endpoint(format!("HTTP {}", response.status())))
        }
    }

    async fn record_vote(
        &self,
        id: &str,
        vote: Vote,
        histories: [&History; 2],
    ) -> Result<(), StoreError> {
        let request = VoteRequest {
            vote: vote.code(),
            conversations: histories,
        };

        let response = self
            .client
            .put(self.url(id))
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Endpoint(format!("HTTP {}", response.status())))
        }
    }

    async fn rankings(&self) -> Result<Rankings, StoreError> {
        let response = self
            .client
            .get(self.url("rankings"))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Endpoint(format!("HTTP {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Endpoint(format!("failed to parse response: {e}")))
    }
}
