//! Hybrid resolution: structured engine first, free-text ranking second

use crate::free_text::FreeTextAnswerer;
use crate::providers::{call_with_retry, CallPolicy, StructuredAnswerEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use whoqa_common::cache::{self, keys, ResultCache};
use whoqa_common::errors::Result;
use whoqa_common::metrics::QuestionMetrics;

/// What is known about a question's structured answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum StructuredOutcome {
    /// The engine has not been asked yet
    Unqueried,
    /// The engine was asked and had nothing
    NoAnswer,
    Answer(String),
}

impl StructuredOutcome {
    pub fn from_reply(reply: Option<String>) -> Self {
        match reply {
            Some(text) if !text.trim().is_empty() => StructuredOutcome::Answer(text),
            _ => StructuredOutcome::NoAnswer,
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            StructuredOutcome::Answer(text) => Some(text),
            _ => None,
        }
    }
}

/// Prefers the structured engine's answer and falls back to the best
/// free-text candidate
pub struct HybridResolver {
    engine: Arc<dyn StructuredAnswerEngine>,
    cache: Arc<dyn ResultCache>,
    free_text: Arc<FreeTextAnswerer>,
    policy: CallPolicy,
}

impl HybridResolver {
    pub fn new(
        engine: Arc<dyn StructuredAnswerEngine>,
        cache: Arc<dyn ResultCache>,
        free_text: Arc<FreeTextAnswerer>,
    ) -> Self {
        Self {
            engine,
            cache,
            free_text,
            policy: CallPolicy::default(),
        }
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cached structured outcome for a question, `Unqueried` when absent
    pub async fn cached_outcome(&self, question: &str) -> StructuredOutcome {
        cache::get_json(self.cache.as_ref(), &keys::structured(question))
            .await
            .unwrap_or(StructuredOutcome::Unqueried)
    }

    /// The structured engine's outcome, asking it only when nothing is cached.
    /// A failed call reads as `NoAnswer` for this run and is not cached.
    /// A disabled engine is never asked and leaves the cache untouched.
    pub async fn structured_outcome(&self, question: &str) -> StructuredOutcome {
        let engine = self.engine.as_ref();
        if !engine.is_enabled() {
            debug!(question, "Structured engine disabled");
            return StructuredOutcome::NoAnswer;
        }

        let cached = self.cached_outcome(question).await;
        if cached != StructuredOutcome::Unqueried {
            debug!(question, outcome = ?cached, "Structured outcome from cache");
            return cached;
        }

        match call_with_retry(engine.name(), self.policy, || engine.ask(question)).await {
            Ok(reply) => {
                let outcome = StructuredOutcome::from_reply(reply);
                cache::put_json(self.cache.as_ref(), &keys::structured(question), &outcome).await;
                outcome
            }
            Err(e) => {
                warn!(question, error = %e, "Structured engine failed, treating as no answer");
                StructuredOutcome::NoAnswer
            }
        }
    }

    /// Structured answer only
    pub async fn structured_answer(&self, question: &str) -> Option<String> {
        let metrics = QuestionMetrics::start("structured");
        let answer = self.structured_outcome(question).await.answer().map(str::to_string);
        metrics.finish(usize::from(answer.is_some()));
        answer
    }

    /// Structured answer verbatim when there is one, otherwise the top
    /// free-text candidate. `None` when neither source has anything.
    pub async fn resolve(&self, question: &str) -> Result<Option<String>> {
        let metrics = QuestionMetrics::start("hybrid");

        if let StructuredOutcome::Answer(answer) = self.structured_outcome(question).await {
            info!(question, "Resolved from structured engine");
            metrics.finish(1);
            return Ok(Some(answer));
        }

        let ranked = self.free_text.rank_answers(question).await?;
        let top = ranked.into_iter().next().map(|answer| answer.text);
        info!(question, found = top.is_some(), "Resolved from free-text ranking");
        metrics.finish(usize::from(top.is_some()));
        Ok(top)
    }
}
