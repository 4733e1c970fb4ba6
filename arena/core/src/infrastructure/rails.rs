// Rails Generation Service Client
//
// Talks to an externally hosted rails server (NeMo-Guardrails-style chat
// endpoint). The server owns the dialogue policy: it may answer, refuse,
// or rewrite; this client only carries messages across and hands back the
// single composed reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMessage;
use crate::domain::rails::{PolicyRails, RailsError};

pub struct RailsClient {
    client: reqwest::Client,
    endpoint: String,
    config_id: String,
}

#[derive(Serialize)]
struct RailsRequest<'a> {
    config_id: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct RailsResponse {
    messages: Vec<ChatMessage>,
}

impl RailsClient {
    pub fn new(endpoint: String, config_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            config_id,
        }
    }

    pub async fn health_check(&self) -> Result<(), RailsError> {
        let url = format!("{}/v1/rails/configs", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RailsError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RailsError::Engine(format!("HTTP {}", response.status())))
        }
    }
}

#[async_trait]
impl PolicyRails for RailsClient {
    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String, RailsError> {
        let request = RailsRequest {
            config_id: &self.config_id,
            messages,
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.endpoint.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RailsError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RailsError::Engine(format!("HTTP {status}: {error_text}")));
        }

        let body: RailsResponse = response
            .json()
            .await
            .map_err(|e| RailsError::Engine(format!("failed to parse response: {e}")))?;

        body.messages
            .into_iter()
            .next_back()
            .map(|m| m.content)
            .ok_or_else(|| RailsError::Engine("no messages in rails response".into()))
    }
}
