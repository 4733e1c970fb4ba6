// OpenAI-Compatible Chat Backend Adapter
//
// Anti-Corruption Layer for OpenAI-style chat completion APIs. One client
// covers the OpenAI endpoint itself and hosted open models behind
// OpenAI-compatible gateways; only the endpoint, key, and model id differ.

use async_stream::stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::domain::chat::{ChatBackend, ChatError, ChatMessage, FragmentStream, GenerationParams};

pub struct OpenAiCompatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }

    fn request(&self, messages: Vec<ChatMessage>, params: &GenerationParams, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stream,
        }
    }

    async fn post_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 401 || status == 403 {
                ChatError::Authentication(error_text)
            } else if status == 429 {
                ChatError::RateLimit
            } else {
                ChatError::Provider(format!("HTTP {}: {}", status, error_text))
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatClient {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError> {
        let request = self.request(messages, params, true);
        let response = self.post_completion(&request).await?;

        let mut events = response.bytes_stream().eventsource();
        let deltas = stream! {
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(ChatError::Network(e.to_string()));
                        return;
                    }
                };
                if event.data == "[DONE]" {
                    return;
                }
                let chunk: ChatCompletionChunk = match serde_json::from_str(&event.data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ChatError::Provider(format!("malformed chunk: {e}")));
                        return;
                    }
                };
                let Some(choice) = chunk.choices.into_iter().next() else {
                    // Keepalive / usage-only chunks carry no choices.
                    continue;
                };
                if choice.finish_reason.as_deref() == Some("content_filter") {
                    yield Err(ChatError::ResponseBlocked);
                    return;
                }
                if let Some(content) = choice.delta.content {
                    yield Ok(content);
                }
            }
        };
        Ok(Box::pin(deltas))
    }

    async fn complete_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<String, ChatError> {
        let request = self.request(messages, params, false);
        let response = self.post_completion(&request).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Provider(format!("failed to parse response: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Provider("no choices in response".into()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(ChatError::ResponseBlocked);
        }

        choice
            .message
            .content
            .ok_or_else(|| ChatError::Provider("empty completion message".into()))
    }

    async fn health_check(&self) -> Result<(), ChatError> {
        let url = format!("{}/models", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else if response.status() == 401 || response.status() == 403 {
            Err(ChatError::Authentication("invalid API key".into()))
        } else {
            Err(ChatError::Network(format!("HTTP {}", response.status())))
        }
    }
}
