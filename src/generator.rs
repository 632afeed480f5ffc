//! Best-effort structured generation: call the provider chain, enforce a
//! structure contract on the output, repair with a corrective turn on
//! failure, and fall back to deterministic content once attempts run out.
//!
//! `generate` is total: whether the providers stay silent, return prose,
//! or return JSON of the wrong shape, the caller still gets a value that
//! satisfies the contract.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::clients::ProviderChain;
use crate::conversation::{Conversation, Turn};
use crate::error::{ContractViolation, GenerationFailure};
use crate::json_scan;

/// Shape requirements a parsed payload must satisfy beyond deserializing.
pub trait StructuredContract: DeserializeOwned + JsonSchema {
    fn check(&self) -> Result<(), ContractViolation>;
}

/// Policy knobs for the attempt loop. The defaults mirror the behavior the
/// rest of the crate is tested against; callers may tighten them.
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    pub max_attempts: usize,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Corrective turn appended after a failed attempt.
pub const REPAIR_INSTRUCTION: &str =
    "Your previous output was invalid. Respond again with ONLY valid JSON matching the required schema exactly.";

/// Schema-guidance block for `T`, embedded into task prompts so providers
/// see the exact required shape up front.
pub fn schema_guidance<T: JsonSchema>() -> String {
    let schema = schema_for!(T);
    let schema_json =
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
    format!("Respond ONLY with JSON matching this schema:\n```json\n{schema_json}\n```")
}

#[derive(Debug, Clone)]
pub struct RobustGenerator {
    chain: ProviderChain,
    policy: GenerationPolicy,
}

impl RobustGenerator {
    pub fn new(chain: ProviderChain, policy: GenerationPolicy) -> Self {
        Self { chain, policy }
    }

    /// Obtain a contract-satisfying `T`, or the fallback after exhaustion.
    ///
    /// Attempts are strictly sequential; each failed attempt extends the
    /// conversation by one corrective turn, so retry N carries N-1 more
    /// turns than the first attempt did.
    #[instrument(skip(self, conversation, fallback), fields(max_attempts = self.policy.max_attempts))]
    pub async fn generate<T, F>(&self, conversation: Conversation, fallback: F) -> T
    where
        T: StructuredContract + Send,
        F: FnOnce() -> T,
    {
        let mut conversation = conversation;
        for attempt in 1..=self.policy.max_attempts {
            debug!(attempt, turns = conversation.len(), "starting generation attempt");
            match self.attempt::<T>(&conversation).await {
                Ok(value) => {
                    info!(attempt, "structured generation succeeded");
                    return value;
                }
                Err(failure) => {
                    warn!(attempt, failure = %failure, "generation attempt failed");
                    conversation = conversation.with_turn(Turn::user(REPAIR_INSTRUCTION));
                }
            }
        }

        info!("generation attempts exhausted, using fallback content");
        fallback()
    }

    async fn attempt<T: StructuredContract>(
        &self,
        conversation: &Conversation,
    ) -> Result<T, GenerationFailure> {
        let Some(text) = self.chain.complete(conversation).await else {
            return Err(GenerationFailure::NoProviderOutput);
        };
        let Some(value) = json_scan::extract_first::<T>(&text) else {
            return Err(GenerationFailure::Unparseable);
        };
        value.check()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockClient, MockResponse, MockVoid};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Probe {
        label: String,
    }

    impl StructuredContract for Probe {
        fn check(&self) -> Result<(), ContractViolation> {
            if self.label.is_empty() {
                return Err(ContractViolation::EmptyField("label"));
            }
            Ok(())
        }
    }

    fn task() -> Conversation {
        Conversation::new(vec![Turn::system("persona"), Turn::user("task")])
    }

    #[tokio::test]
    async fn returns_validated_value_on_first_success() {
        let (client, handle) = MockClient::with_responses(vec![MockResponse::Success(
            r#"{"label": "ok"}"#.to_string(),
        )]);
        let generator = RobustGenerator::new(
            ProviderChain::new(vec![Box::new(client)]),
            GenerationPolicy::default(),
        );

        let value = generator
            .generate::<Probe, _>(task(), || Probe {
                label: "fallback".to_string(),
            })
            .await;

        assert_eq!(value.label, "ok");
        assert_eq!(handle.call_count(), 1);
    }

    #[tokio::test]
    async fn repairs_after_invalid_output_then_succeeds() {
        let (client, handle) = MockClient::with_responses(vec![
            MockResponse::Success("this is not json".to_string()),
            MockResponse::Success(r#"{"label": "repaired"}"#.to_string()),
        ]);
        let generator = RobustGenerator::new(
            ProviderChain::new(vec![Box::new(client)]),
            GenerationPolicy::default(),
        );

        let value = generator
            .generate::<Probe, _>(task(), || Probe {
                label: "fallback".to_string(),
            })
            .await;

        assert_eq!(value.label, "repaired");

        let calls = handle.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].len(), calls[0].len() + 1);
        assert_eq!(
            calls[1].turns().last().map(|turn| turn.content.as_str()),
            Some(REPAIR_INSTRUCTION)
        );
    }

    #[tokio::test]
    async fn contract_violation_triggers_repair_not_acceptance() {
        let (client, _handle) = MockClient::with_responses(vec![
            MockResponse::Success(r#"{"label": ""}"#.to_string()),
            MockResponse::Success(r#"{"label": "fixed"}"#.to_string()),
        ]);
        let generator = RobustGenerator::new(
            ProviderChain::new(vec![Box::new(client)]),
            GenerationPolicy::default(),
        );

        let value = generator
            .generate::<Probe, _>(task(), || Probe {
                label: "fallback".to_string(),
            })
            .await;

        assert_eq!(value.label, "fixed");
    }

    #[tokio::test]
    async fn falls_back_after_exhausting_attempts() {
        let generator = RobustGenerator::new(
            ProviderChain::new(vec![Box::new(MockVoid)]),
            GenerationPolicy::default(),
        );

        let value = generator
            .generate::<Probe, _>(task(), || Probe {
                label: "fallback".to_string(),
            })
            .await;

        assert_eq!(value.label, "fallback");
    }

    #[tokio::test]
    async fn corrective_turns_accumulate_across_attempts() {
        let (client, handle) = MockClient::with_responses(vec![
            MockResponse::Success("garbage one".to_string()),
            MockResponse::Success("garbage two".to_string()),
            MockResponse::Success("garbage three".to_string()),
        ]);
        let generator = RobustGenerator::new(
            ProviderChain::new(vec![Box::new(client)]),
            GenerationPolicy::default(),
        );

        let value = generator
            .generate::<Probe, _>(task(), || Probe {
                label: "fallback".to_string(),
            })
            .await;

        assert_eq!(value.label, "fallback");

        let calls = handle.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[1].len(), 3);
        assert_eq!(calls[2].len(), 4);
    }

    #[test]
    fn schema_guidance_names_the_fields() {
        let guidance = schema_guidance::<Probe>();
        assert!(guidance.contains("label"));
        assert!(guidance.contains("json"));
    }
}
