//! Answer handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use whoqa_answer::RankedAnswer;
use whoqa_common::errors::{AppError, Result};

/// Rank request
#[derive(Debug, Deserialize, Validate)]
pub struct RankRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,

    /// Maximum answers to return
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
}

fn default_limit() -> usize { 10 }

/// Rank response
#[derive(Serialize)]
pub struct RankResponse {
    pub question: String,
    pub answers: Vec<RankedAnswer>,
    pub processing_time_ms: u64,
}

/// Resolve request
#[derive(Debug, Deserialize, Validate)]
pub struct ResolveRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
}

/// Resolve response
#[derive(Serialize)]
pub struct ResolveResponse {
    pub question: String,
    pub answer: Option<String>,
    pub processing_time_ms: u64,
}

fn validate(request: &impl Validate) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

/// Bound a pipeline call by the configured request timeout
async fn within_deadline<T>(state: &AppState, call: impl Future<Output = Result<T>>) -> Result<T> {
    let deadline = state.config.request_timeout();
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| AppError::Timeout {
            service: "answer pipeline".to_string(),
            timeout_ms: deadline.as_millis() as u64,
        })?
}

/// Ranked free-text answers
pub async fn rank(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> Result<Json<RankResponse>> {
    let start = Instant::now();
    validate(&request)?;

    let mut answers = within_deadline(&state, state.answerer.rank_answers(&request.question)).await?;
    let candidates = answers.len();
    answers.truncate(request.limit);

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        question = %request.question,
        candidates,
        returned = answers.len(),
        latency_ms = processing_time_ms,
        "Answers ranked"
    );

    Ok(Json(RankResponse {
        question: request.question,
        answers,
        processing_time_ms,
    }))
}

/// Single best answer, structured engine first
pub async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    let start = Instant::now();
    validate(&request)?;

    let answer = within_deadline(&state, state.answerer.resolve(&request.question)).await?;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        question = %request.question,
        answered = answer.is_some(),
        latency_ms = processing_time_ms,
        "Question resolved"
    );

    Ok(Json(ResolveResponse {
        question: request.question,
        answer,
        processing_time_ms,
    }))
}
