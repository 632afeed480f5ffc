pub mod gemini;
pub mod mock;
pub mod openai;

pub use gemini::*;
pub use mock::*;
pub use openai::*;

use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::config::QuizConfig;
use crate::conversation::Conversation;
use crate::error::ProviderError;

/// Low-level generative provider abstraction.
///
/// Implementors translate a conversation into one completion request and
/// return the raw text, or an error the chain treats as "unavailable".
/// Request shaping (envelope layout, sampling, output mode) stays inside the
/// adapter.
#[async_trait]
pub trait ProviderClient: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Execute one completion request. No internal retries.
    async fn complete(&self, conversation: &Conversation) -> Result<String, ProviderError>;

    /// Clone this client into a boxed trait object.
    fn clone_box(&self) -> Box<dyn ProviderClient>;
}

impl Clone for Box<dyn ProviderClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Fixed-priority routing over a closed set of providers.
///
/// The chain asks each provider in construction order and returns the first
/// text produced. Unconfigured providers and failing providers are treated
/// identically: log, move on. `None` means nobody answered, which the layer
/// above resolves via repair or fallback, never as an error.
#[derive(Debug, Clone)]
pub struct ProviderChain {
    providers: Vec<Box<dyn ProviderClient>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn ProviderClient>>) -> Self {
        Self { providers }
    }

    /// The production chain: Gemini first, then the OpenAI-compatible
    /// endpoint.
    pub fn from_config(config: &QuizConfig) -> Self {
        Self::new(vec![
            Box::new(GeminiClient::new(config.gemini.clone())) as Box<dyn ProviderClient>,
            Box::new(OpenAiClient::new(config.openai.clone())),
        ])
    }

    pub async fn complete(&self, conversation: &Conversation) -> Option<String> {
        for provider in &self.providers {
            match provider.complete(conversation).await {
                Ok(text) => {
                    debug!(
                        provider = provider.name(),
                        response_len = text.len(),
                        "provider produced a completion"
                    );
                    return Some(text);
                }
                Err(ProviderError::NotConfigured) => {
                    debug!(provider = provider.name(), "provider not configured, trying next");
                }
                Err(error) => {
                    warn!(provider = provider.name(), error = %error, "provider call failed, trying next");
                }
            }
        }
        debug!("no provider produced a completion");
        None
    }
}
