use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use super::ProviderClient;
use crate::conversation::{Conversation, Role};
use crate::error::{OpenAiError, ProviderError};

/// Configuration for an OpenAI-compatible chat-completions endpoint. Both
/// the base URL and the API key are required; with either missing the
/// provider is unconfigured.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Turns map 1:1 onto chat messages, correctives included.
    fn build_request(&self, conversation: &Conversation) -> ChatRequest {
        let messages = conversation
            .turns()
            .iter()
            .map(|turn| ChatMessage {
                role: match turn.role {
                    Role::System => "system",
                    Role::User => "user",
                },
                content: turn.content.clone(),
            })
            .collect();

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip(self, conversation), fields(model = %self.config.model, turns = conversation.len()))]
    async fn complete(&self, conversation: &Conversation) -> Result<String, ProviderError> {
        let (Some(base_url), Some(api_key)) =
            (self.config.base_url.as_deref(), self.config.api_key.as_deref())
        else {
            return Err(ProviderError::NotConfigured);
        };

        let request = self.build_request(conversation);
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        debug!("Preparing chat-completions request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ProviderError::OpenAi(OpenAiError::Http(e.to_string()))
            })?;

        debug!(status = %response.status(), "Received chat-completions response");

        if response.status() == 429 {
            warn!("Chat-completions rate limit exceeded");
            return Err(ProviderError::OpenAi(OpenAiError::RateLimit));
        }

        if response.status() == 401 {
            error!("Chat-completions authentication failed");
            return Err(ProviderError::OpenAi(OpenAiError::Authentication));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Chat-completions API error");
            return Err(ProviderError::OpenAi(OpenAiError::Api(error_text)));
        }

        let envelope: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse chat-completions response JSON");
            ProviderError::OpenAi(OpenAiError::Http(e.to_string()))
        })?;

        let content = envelope
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                error!("No choices in chat-completions response");
                ProviderError::OpenAi(OpenAiError::Api("no choices in response".to_string()))
            })?;

        info!(response_len = content.len(), "Received chat completion");
        Ok(content)
    }

    fn clone_box(&self) -> Box<dyn ProviderClient> {
        Box::new(self.clone())
    }
}
