//! HTTP transport for the quiz service.
//!
//! Validates request shape at the edge (topic length, score range) and
//! delegates everything else to `QuizService`; the service never fails, so
//! the only error responses here are 400s for malformed input.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use quizsmith::quiz::{self, Question};
use quizsmith::{QuizConfig, QuizService};

const DEFAULT_PORT: u16 = 4000;

#[derive(Debug, Parser)]
#[command(name = "quizd", about = "Quiz generation HTTP server")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to listen on; falls back to the PORT env var, then 4000
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    topic: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    topic: String,
    score: i64,
}

#[derive(Debug, Serialize)]
struct FeedbackResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    details: String,
}

fn bad_request(details: String) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: "Invalid request",
            details,
        }),
    )
}

fn validate_topic(topic: &str) -> Result<(), String> {
    let length = topic.chars().count();
    if length < quiz::TOPIC_MIN_CHARS || length > quiz::TOPIC_MAX_CHARS {
        return Err(format!(
            "topic must be between {} and {} characters",
            quiz::TOPIC_MIN_CHARS,
            quiz::TOPIC_MAX_CHARS
        ));
    }
    Ok(())
}

fn validate_score(score: i64) -> Result<u8, String> {
    if !(0..=i64::from(quiz::MAX_SCORE)).contains(&score) {
        return Err(format!(
            "score must be an integer between 0 and {}",
            quiz::MAX_SCORE
        ));
    }
    Ok(score as u8)
}

async fn generate(
    State(service): State<Arc<QuizService>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorBody>)> {
    validate_topic(&request.topic).map_err(bad_request)?;
    let set = service.question_set(&request.topic).await;
    Ok(Json(GenerateResponse {
        questions: set.questions,
    }))
}

async fn feedback(
    State(service): State<Arc<QuizService>>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, (StatusCode, Json<ErrorBody>)> {
    validate_topic(&request.topic).map_err(bad_request)?;
    let score = validate_score(request.score).map_err(bad_request)?;
    let feedback = service.feedback(&request.topic, score).await;
    Ok(Json(FeedbackResponse {
        message: feedback.message,
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn app(service: Arc<QuizService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/quiz/generate", post(generate))
        .route("/api/quiz/feedback", post(feedback))
        .with_state(service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = QuizConfig::from_env();
    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);

    let service = Arc::new(QuizService::from_config(&config));
    let router = app(service);

    let addr = format!("{}:{}", args.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
