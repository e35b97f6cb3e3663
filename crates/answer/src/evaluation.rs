//! Offline evaluation against known question/answer pairs

use crate::free_text::FreeTextAnswerer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};
use whoqa_common::errors::Result;

/// Ranked answers inspected per question
pub const TOP_K: usize = 20;

/// A question with every answer text accepted as correct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub questions: usize,
    /// A correct answer appears somewhere in the top [`TOP_K`]
    pub okay: usize,
    /// The first-ranked answer is correct
    pub perfect: usize,
    /// Questions the pipeline rejected
    pub failed: usize,
}

pub fn parse_qa_pairs(json: &str) -> Result<Vec<QaPair>> {
    Ok(serde_json::from_str(json)?)
}

pub async fn load_qa_pairs(path: impl AsRef<Path>) -> Result<Vec<QaPair>> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_qa_pairs(&contents)
}

/// Ranks (0-based) of the candidates that are among the correct answers
pub fn correct_results(candidates: &[String], correct: &[String]) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| correct.contains(candidate))
        .map(|(rank, _)| rank)
        .collect()
}

/// Score the free-text ranking over `pairs`
pub async fn evaluate(answerer: &FreeTextAnswerer, pairs: &[QaPair]) -> EvaluationReport {
    let mut report = EvaluationReport {
        questions: pairs.len(),
        ..EvaluationReport::default()
    };
    info!(questions = pairs.len(), "Generating candidate answers");

    for pair in pairs {
        let ranked = match answerer.rank_answers(&pair.question).await {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!(question = %pair.question, error = %e, "Question skipped");
                report.failed += 1;
                continue;
            }
        };

        let top: Vec<String> = ranked.into_iter().take(TOP_K).map(|a| a.text).collect();
        let hits = correct_results(&top, &pair.answers);
        if hits.first() == Some(&0) {
            report.perfect += 1;
        }
        if !hits.is_empty() {
            report.okay += 1;
        }
    }

    info!(
        okay = report.okay,
        perfect = report.perfect,
        failed = report.failed,
        "Evaluation finished"
    );
    report
}
