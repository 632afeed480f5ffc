use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use super::ProviderClient;
use crate::conversation::Conversation;
use crate::error::{GeminiError, ProviderError};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Configuration for the Gemini client. A missing API key leaves the
/// provider unconfigured; `complete` then reports `NotConfigured` without a
/// network call.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// System turns become the `systemInstruction`; user turns are joined in
    /// order into a single user part. JSON output is requested via the
    /// response MIME type.
    fn build_request(&self, conversation: &Conversation) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: conversation.user_text(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: "application/json".to_string(),
            },
            system_instruction: conversation.system_text().map(|text| RequestContent {
                role: None,
                parts: vec![Part { text }],
            }),
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip(self, conversation), fields(model = %self.config.model, turns = conversation.len()))]
    async fn complete(&self, conversation: &Conversation) -> Result<String, ProviderError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ProviderError::NotConfigured);
        };

        let request = self.build_request(conversation);
        let url = format!("{GEMINI_ENDPOINT}/{}:generateContent", self.config.model);
        debug!("Preparing Gemini API request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ProviderError::Gemini(GeminiError::Http(e.to_string()))
            })?;

        debug!(status = %response.status(), "Received response from Gemini API");

        if response.status() == 429 {
            warn!("Gemini API rate limit exceeded");
            return Err(ProviderError::Gemini(GeminiError::RateLimit));
        }

        if response.status() == 401 || response.status() == 403 {
            error!("Gemini API authentication failed");
            return Err(ProviderError::Gemini(GeminiError::Authentication));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Gemini API error");
            return Err(ProviderError::Gemini(GeminiError::Api(error_text)));
        }

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response JSON");
            ProviderError::Gemini(GeminiError::Http(e.to_string()))
        })?;

        let text = envelope
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.clone())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                error!("No text in Gemini response");
                ProviderError::Gemini(GeminiError::Api("no text in response".to_string()))
            })?;

        info!(response_len = text.len(), "Received Gemini completion");
        Ok(text)
    }

    fn clone_box(&self) -> Box<dyn ProviderClient> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Turn;

    #[tokio::test]
    async fn missing_key_short_circuits_without_network() {
        let client = GeminiClient::new(GeminiConfig::default());
        let conversation = Conversation::new(vec![Turn::user("hi")]);

        let result = client.complete(&conversation).await;
        assert!(matches!(result, Err(ProviderError::NotConfigured)));
    }

    #[test]
    fn request_folds_turns_into_system_and_user_parts() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: Some("key".to_string()),
            ..GeminiConfig::default()
        });
        let conversation = Conversation::new(vec![
            Turn::system("persona"),
            Turn::user("task"),
            Turn::user("correction"),
        ]);

        let request = client.build_request(&conversation);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            serde_json::json!("persona")
        );
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            serde_json::json!("task\ncorrection")
        );
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            serde_json::json!("application/json")
        );
    }
}
