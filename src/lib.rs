pub mod clients;
pub mod config;
pub mod conversation;
pub mod error;
pub mod generator;
pub mod json_scan;
pub mod quiz;
pub mod service;

// Convenient re-exports
pub use config::QuizConfig;
pub use generator::{GenerationPolicy, RobustGenerator, StructuredContract};
pub use quiz::{score_answers, AnswerMap, Choice, FeedbackMessage, Question, QuestionSet};
pub use service::QuizService;
