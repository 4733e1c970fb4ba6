// Gemini Chat Backend Adapter
//
// Anti-Corruption Layer for the Google generateContent API. Unlike the
// OpenAI-shaped providers, Gemini signals its own safety decisions in-band:
// a blocked prompt arrives as prompt feedback with a block reason, a blocked
// reply as a SAFETY finish. Both are mapped onto the domain's blocked
// errors so the adapter layer can substitute its fixed notices.

use async_stream::stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::domain::chat::{
    ChatBackend, ChatError, ChatMessage, ChatRole, FragmentStream, GenerationParams,
};

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }

    fn request(messages: Vec<ChatMessage>, params: &GenerationParams) -> GenerateContentRequest {
        let mut system_instruction = None;
        let mut contents = Vec::with_capacity(messages.len());
        for message in messages {
            match message.role {
                ChatRole::System => {
                    system_instruction = Some(GeminiContent {
                        role: None,
                        parts: vec![GeminiPart { text: message.content }],
                    });
                }
                ChatRole::User => contents.push(GeminiContent {
                    role: Some("user".into()),
                    parts: vec![GeminiPart { text: message.content }],
                }),
                ChatRole::Assistant => contents.push(GeminiContent {
                    role: Some("model".into()),
                    parts: vec![GeminiPart { text: message.content }],
                }),
            }
        }
        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                max_output_tokens: params.max_tokens,
            },
        }
    }

    fn url(&self, verb: &str, query: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?{}key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            verb,
            query,
            self.api_key
        )
    }

    async fn post(&self, url: &str, request: &GenerateContentRequest) -> Result<reqwest::Response, ChatError> {
        let response = self
            .client
            .post(url)
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

/// Extract the text delta from one response chunk, mapping Gemini's in-band
/// safety outcomes onto the domain errors.
fn chunk_text(response: GenerateContentResponse) -> Result<Option<String>, ChatError> {
    if response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
        .is_some()
    {
        return Err(ChatError::PromptBlocked);
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(None);
    };
    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ChatError::ResponseBlocked);
    }

    let text = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
        .filter(|t| !t.is_empty());
    Ok(text)
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<FragmentStream, ChatError> {
        let request = Self::request(messages, params);
        let url = self.url("streamGenerateContent", "alt=sse&");
        let response = self.post(&url, &request).await?;

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
                let chunk: GenerateContentResponse = match serde_json::from_str(&event.data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ChatError::Provider(format!("malformed chunk: {e}")));
                        return;
                    }
                };
                match chunk_text(chunk) {
                    Ok(Some(text)) => yield Ok(text),
                    Ok(None) => continue,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
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
        let request = Self::request(messages, params);
        let url = self.url("generateContent", "");
        let response = self.post(&url, &request).await?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Provider(format!("failed to parse response: {e}")))?;

        match chunk_text(body)? {
            Some(text) => Ok(text),
            None => Err(ChatError::Provider("no candidates in response".into())),
        }
    }

    async fn health_check(&self) -> Result<(), ChatError> {
        let url = format!(
            "{}/v1beta/models/{}?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        );

        let response = self
            .client
            .get(&url)
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
