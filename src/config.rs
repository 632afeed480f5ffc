use std::env;

use crate::clients::{GeminiConfig, OpenAiConfig};

/// Process-wide configuration, read once at startup and handed to adapter
/// constructors. Adapters never consult the environment at call time.
///
/// An absent credential leaves the corresponding provider unconfigured; that
/// is a routing state, not an error.
#[derive(Debug, Clone, Default)]
pub struct QuizConfig {
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
    pub port: Option<u16>,
}

impl QuizConfig {
    /// Load configuration from the environment, honoring a `.env` file when
    /// present (silently skipped otherwise).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut gemini = GeminiConfig::default();
        gemini.api_key = non_empty_var("GEMINI_API_KEY");
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            gemini.model = model;
        }

        let mut openai = OpenAiConfig::default();
        openai.base_url = non_empty_var("AI_BASE_URL");
        openai.api_key = non_empty_var("AI_API_KEY");
        if let Some(model) = non_empty_var("AI_MODEL") {
            openai.model = model;
        }

        let port = env::var("PORT").ok().and_then(|p| p.parse().ok());

        Self {
            gemini,
            openai,
            port,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
