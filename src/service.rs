//! The two public quiz operations. Both are total: provider trouble of any
//! kind degrades to deterministic fallback content, never to an error.

use tracing::{info, instrument};

use crate::clients::ProviderChain;
use crate::config::QuizConfig;
use crate::generator::{GenerationPolicy, RobustGenerator};
use crate::quiz::{self, FeedbackMessage, QuestionSet};

#[derive(Debug, Clone)]
pub struct QuizService {
    generator: RobustGenerator,
}

impl QuizService {
    pub fn new(generator: RobustGenerator) -> Self {
        Self { generator }
    }

    /// Production wiring: Gemini-first provider chain, default policy.
    pub fn from_config(config: &QuizConfig) -> Self {
        let chain = ProviderChain::from_config(config);
        Self::new(RobustGenerator::new(chain, GenerationPolicy::default()))
    }

    /// Generate a five-question quiz on the topic. Always returns a set
    /// satisfying the question-set contract.
    ///
    /// The topic is expected to be pre-validated by the transport
    /// ([`quiz::TOPIC_MIN_CHARS`]..=[`quiz::TOPIC_MAX_CHARS`] characters).
    #[instrument(skip(self, topic), fields(topic_len = topic.len()))]
    pub async fn question_set(&self, topic: &str) -> QuestionSet {
        info!("generating question set");
        self.generator
            .generate(quiz::question_prompt(topic), || {
                quiz::fallback_question_set(topic)
            })
            .await
    }

    /// Generate a short feedback message for a topic and score. Always
    /// returns a non-empty message of at most
    /// [`quiz::FEEDBACK_MAX_CHARS`] characters.
    ///
    /// The score is expected to be pre-validated to `0..=`[`quiz::MAX_SCORE`].
    #[instrument(skip(self, topic), fields(topic_len = topic.len()))]
    pub async fn feedback(&self, topic: &str, score: u8) -> FeedbackMessage {
        info!("generating feedback");
        self.generator
            .generate(quiz::feedback_prompt(topic, score), || {
                quiz::fallback_feedback(topic, score)
            })
            .await
    }
}
