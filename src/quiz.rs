//! Quiz domain: question sets and feedback messages, their structure
//! contracts, prompt construction, deterministic fallback content, and
//! answer scoring.

use std::collections::{HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conversation::{Conversation, Turn};
use crate::error::ContractViolation;
use crate::generator::{schema_guidance, StructuredContract};

pub const QUESTIONS_PER_SET: usize = 5;
pub const CHOICES_PER_QUESTION: usize = 4;
pub const FEEDBACK_MAX_CHARS: usize = 300;

/// Parameter constraints enforced by the transport before the core is
/// invoked.
pub const TOPIC_MIN_CHARS: usize = 2;
pub const TOPIC_MAX_CHARS: usize = 60;
pub const MAX_SCORE: u8 = 5;

const CHOICE_IDS: [&str; CHOICES_PER_QUESTION] = ["a", "b", "c", "d"];

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Choice {
    /// Short token unique within the question, e.g. "a".
    pub id: String,
    /// Display text shown to the user.
    pub text: String,
    /// Whether selecting this choice scores the question.
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

/// One multiple-choice question with exactly one correct choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    /// Short token unique within the set, e.g. "q1".
    pub id: String,
    /// The prompt text.
    pub question: String,
    /// Exactly four choices, exactly one of them correct.
    pub choices: Vec<Choice>,
}

impl Question {
    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.is_correct)
    }
}

/// A full quiz: exactly five questions. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionSet {
    /// Exactly five questions, in presentation order.
    pub questions: Vec<Question>,
}

impl StructuredContract for QuestionSet {
    fn check(&self) -> Result<(), ContractViolation> {
        if self.questions.len() != QUESTIONS_PER_SET {
            return Err(ContractViolation::WrongCount {
                unit: "questions",
                expected: QUESTIONS_PER_SET,
                found: self.questions.len(),
            });
        }

        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if question.id.is_empty() {
                return Err(ContractViolation::EmptyField("question id"));
            }
            if question.question.is_empty() {
                return Err(ContractViolation::EmptyField("question text"));
            }
            if !question_ids.insert(question.id.as_str()) {
                return Err(ContractViolation::DuplicateId {
                    unit: "question",
                    id: question.id.clone(),
                });
            }
            if question.choices.len() != CHOICES_PER_QUESTION {
                return Err(ContractViolation::WrongCount {
                    unit: "choices",
                    expected: CHOICES_PER_QUESTION,
                    found: question.choices.len(),
                });
            }

            let mut choice_ids = HashSet::new();
            for choice in &question.choices {
                if choice.id.is_empty() {
                    return Err(ContractViolation::EmptyField("choice id"));
                }
                if choice.text.is_empty() {
                    return Err(ContractViolation::EmptyField("choice text"));
                }
                if !choice_ids.insert(choice.id.as_str()) {
                    return Err(ContractViolation::DuplicateId {
                        unit: "choice",
                        id: choice.id.clone(),
                    });
                }
            }

            let correct = question.choices.iter().filter(|c| c.is_correct).count();
            if correct != 1 {
                return Err(ContractViolation::CorrectChoiceCount {
                    id: question.id.clone(),
                    found: correct,
                });
            }
        }

        Ok(())
    }
}

/// Short narrative feedback shown after a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackMessage {
    /// Non-empty message of at most 300 characters.
    pub message: String,
}

impl StructuredContract for FeedbackMessage {
    fn check(&self) -> Result<(), ContractViolation> {
        if self.message.trim().is_empty() {
            return Err(ContractViolation::EmptyField("message"));
        }
        let length = self.message.chars().count();
        if length > FEEDBACK_MAX_CHARS {
            return Err(ContractViolation::TooLong {
                limit: FEEDBACK_MAX_CHARS,
                found: length,
            });
        }
        Ok(())
    }
}

/// Selected choice id per question id, built up by the consumer as the user
/// answers.
pub type AnswerMap = HashMap<String, String>;

/// Count of questions whose selected choice id matches the correct one.
/// Unanswered questions score zero.
pub fn score_answers(set: &QuestionSet, answers: &AnswerMap) -> u8 {
    set.questions
        .iter()
        .filter(|question| match (answers.get(&question.id), question.correct_choice()) {
            (Some(selected), Some(correct)) => selected == &correct.id,
            _ => false,
        })
        .count() as u8
}

pub fn question_prompt(topic: &str) -> Conversation {
    Conversation::new(vec![
        Turn::system("You are an assistant that generates JSON strictly matching a schema."),
        Turn::user(format!(
            "Generate {QUESTIONS_PER_SET} multiple-choice questions about {topic}. \
             Each question must have {CHOICES_PER_QUESTION} choices with exactly one correct. {}",
            schema_guidance::<QuestionSet>()
        )),
    ])
}

pub fn feedback_prompt(topic: &str, score: u8) -> Conversation {
    Conversation::new(vec![
        Turn::system("You write concise motivational feedback."),
        Turn::user(format!(
            "Topic: {topic}. Score: {score}/{MAX_SCORE}. Keep the message under \
             {FEEDBACK_MAX_CHARS} characters and tailor it to the performance. {}",
            schema_guidance::<FeedbackMessage>()
        )),
    ])
}

/// Deterministic question set used when generation is exhausted. Every
/// question and choice string names the topic; the correct choice sits at a
/// fixed position per question (b, a, c, b, c).
pub fn fallback_question_set(topic: &str) -> QuestionSet {
    let blueprint: [(&str, String, [&str; CHOICES_PER_QUESTION], usize); QUESTIONS_PER_SET] = [
        (
            "q1",
            format!("Which statement is true about {topic}?"),
            ["Statement A", "Statement B", "Statement C", "Statement D"],
            1,
        ),
        (
            "q2",
            format!("A common misconception about {topic} is?"),
            [
                "Misconception A",
                "Misconception B",
                "Misconception C",
                "Misconception D",
            ],
            0,
        ),
        (
            "q3",
            format!("Best practice related to {topic} includes:"),
            ["Practice A", "Practice B", "Practice C", "Practice D"],
            2,
        ),
        (
            "q4",
            format!("A key metric for {topic} is:"),
            ["Metric A", "Metric B", "Metric C", "Metric D"],
            1,
        ),
        (
            "q5",
            format!("An application of {topic}:"),
            [
                "Application A",
                "Application B",
                "Application C",
                "Application D",
            ],
            2,
        ),
    ];

    let questions = blueprint
        .into_iter()
        .map(|(id, question, stems, correct_index)| Question {
            id: id.to_string(),
            question,
            choices: stems
                .into_iter()
                .enumerate()
                .map(|(index, stem)| Choice {
                    id: CHOICE_IDS[index].to_string(),
                    text: format!("{stem} about {topic}"),
                    is_correct: index == correct_index,
                })
                .collect(),
        })
        .collect();

    QuestionSet { questions }
}

/// Deterministic tiered feedback used when generation is exhausted.
/// Tiers: score >= 4 top, == 3 mid-high, == 2 mid, <= 1 low.
pub fn fallback_feedback(topic: &str, score: u8) -> FeedbackMessage {
    let message = match score {
        s if s >= 4 => format!("Excellent work on {topic}! You clearly mastered the material."),
        3 => format!("Nice job on {topic}. Review a few tricky areas and try again."),
        2 => format!("You're getting there with {topic}. Revisit the basics and build up."),
        _ => format!("Good start on {topic}. Focus on fundamentals and take another run!"),
    };
    FeedbackMessage { message }
}
