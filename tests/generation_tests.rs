//! End-to-end behavior of the public operations against scripted provider
//! chains: totality, fallback determinism, repair escalation, feedback
//! tiering, and answer scoring.

use quizsmith::clients::{MockClient, MockResponse, MockVoid, ProviderChain};
use quizsmith::generator::REPAIR_INSTRUCTION;
use quizsmith::quiz::{self, AnswerMap, QuestionSet};
use quizsmith::{GenerationPolicy, QuizService, RobustGenerator, StructuredContract};

fn service_with(chain: ProviderChain) -> QuizService {
    QuizService::new(RobustGenerator::new(chain, GenerationPolicy::default()))
}

fn unavailable_service() -> QuizService {
    service_with(ProviderChain::new(vec![
        Box::new(MockVoid),
        Box::new(MockVoid),
    ]))
}

/// A valid set that is distinguishable from the deterministic fallback.
fn model_set(topic: &str) -> QuestionSet {
    let mut set = quiz::fallback_question_set(topic);
    set.questions[0].question = format!("Model-authored question about {topic}?");
    set
}

#[tokio::test]
async fn question_set_is_total_when_both_providers_are_unavailable() {
    let service = unavailable_service();
    let set = service.question_set("Rust lifetimes").await;
    assert!(set.check().is_ok());
}

#[tokio::test]
async fn question_set_is_total_when_one_provider_is_unavailable() {
    let (garbage, _handle) = MockClient::with_responses(vec![
        MockResponse::Success("not even close to json".to_string()),
        MockResponse::Success("still not json".to_string()),
        MockResponse::Success("nope".to_string()),
    ]);
    let service = service_with(ProviderChain::new(vec![
        Box::new(MockVoid),
        Box::new(garbage),
    ]));

    let set = service.question_set("Rust lifetimes").await;
    assert!(set.check().is_ok());
}

#[tokio::test]
async fn question_set_is_total_when_providers_return_garbage() {
    let (garbage, handle) = MockClient::with_responses(vec![
        MockResponse::Success(r#"{"questions": "surprise"}"#.to_string()),
        MockResponse::Success("```json not closed".to_string()),
        MockResponse::Success(r#"{"unrelated": true}"#.to_string()),
    ]);
    let service = service_with(ProviderChain::new(vec![Box::new(garbage)]));

    let set = service.question_set("Rust lifetimes").await;
    assert!(set.check().is_ok());
    assert_eq!(handle.call_count(), 3);
}

#[tokio::test]
async fn exhausted_generation_is_deterministic() {
    let service = unavailable_service();
    let first = service.question_set("Ocean currents").await;
    let second = service.question_set("Ocean currents").await;
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );

    let f1 = service.feedback("Ocean currents", 2).await;
    let f2 = service.feedback("Ocean currents", 2).await;
    assert_eq!(f1, f2);
}

#[tokio::test]
async fn every_returned_set_holds_the_structure_invariant() {
    let json = serde_json::to_string(&model_set("Gravity")).unwrap();
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::Success(json)]);
    let from_model = service_with(ProviderChain::new(vec![Box::new(client)]))
        .question_set("Gravity")
        .await;
    let from_fallback = unavailable_service().question_set("Gravity").await;

    for set in [from_model, from_fallback] {
        assert_eq!(set.questions.len(), 5);
        for question in &set.questions {
            assert_eq!(question.choices.len(), 4);
            assert_eq!(question.choices.iter().filter(|c| c.is_correct).count(), 1);
        }
    }
}

#[tokio::test]
async fn invalid_then_valid_output_is_repaired_with_one_corrective_turn() {
    let expected = model_set("Gravity");
    let (client, handle) = MockClient::with_responses(vec![
        MockResponse::Success("{\"questions\": [".to_string()),
        MockResponse::Success(serde_json::to_string(&expected).unwrap()),
    ]);
    let service = service_with(ProviderChain::new(vec![Box::new(client)]));

    let set = service.question_set("Gravity").await;
    assert_eq!(set, expected);

    let calls = handle.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].len(), calls[0].len() + 1);
    let correctives = calls[1]
        .turns()
        .iter()
        .filter(|turn| turn.content == REPAIR_INSTRUCTION)
        .count();
    assert_eq!(correctives, 1);
}

#[tokio::test]
async fn secondary_provider_answers_when_primary_is_unconfigured() {
    let expected = model_set("Tides");
    let (secondary, handle) = MockClient::with_responses(vec![MockResponse::Success(
        serde_json::to_string(&expected).unwrap(),
    )]);
    let service = service_with(ProviderChain::new(vec![
        Box::new(MockVoid),
        Box::new(secondary),
    ]));

    let set = service.question_set("Tides").await;
    assert_eq!(set, expected);
    assert_eq!(handle.call_count(), 1);
}

#[tokio::test]
async fn feedback_tiers_match_the_score_boundaries() {
    let service = unavailable_service();

    let top = service.feedback("X", 5).await;
    assert_eq!(top, service.feedback("X", 4).await);
    assert!(top.message.contains("Excellent"));

    let mid_high = service.feedback("X", 3).await;
    assert!(mid_high.message.contains("Nice job"));

    let mid = service.feedback("X", 2).await;
    assert!(mid.message.contains("getting there"));

    let low = service.feedback("X", 0).await;
    assert_eq!(low, service.feedback("X", 1).await);
    assert!(low.message.contains("Good start"));
}

#[tokio::test]
async fn scoring_honors_the_answer_map_contract() {
    let set = unavailable_service().question_set("Algebra").await;
    let q1_correct = set.questions[0].correct_choice().unwrap().id.clone();
    assert_eq!(q1_correct, "b");

    let mut answers = AnswerMap::new();
    answers.insert("q1".to_string(), q1_correct);
    assert_eq!(quiz::score_answers(&set, &answers), 1);

    answers.insert("q1".to_string(), "a".to_string());
    assert_eq!(quiz::score_answers(&set, &answers), 0);
}

#[tokio::test]
async fn photosynthesis_end_to_end_on_fallback_content() {
    let service = unavailable_service();

    let set = service.question_set("Photosynthesis").await;
    assert!(set.questions[0].question.contains("Photosynthesis"));
    assert_eq!(set.questions[0].correct_choice().unwrap().id, "b");

    let answers: AnswerMap = set
        .questions
        .iter()
        .map(|q| (q.id.clone(), q.correct_choice().unwrap().id.clone()))
        .collect();
    let score = quiz::score_answers(&set, &answers);
    assert_eq!(score, 5);

    let feedback = service.feedback("Photosynthesis", score).await;
    assert!(feedback.message.contains("Photosynthesis"));
    assert!(feedback.message.contains("Excellent"));
    assert!(feedback.check().is_ok());
}
